use bbcov::{
    record_coverage, Accumulator, BlockCounts, BlockInfo, BlockSet, ExecutionTrace,
    RecorderConfig, ReplayHost, Variant,
};
use std::sync::Barrier;
use std::thread;
use tempfile::NamedTempFile;

#[test]
fn test_concurrent_distinct_inserts_are_not_lost() {
    let threads = 128;
    let set = BlockSet::default();
    let barrier = Barrier::new(threads);

    thread::scope(|scope| {
        for t in 0..threads {
            let set = &set;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                set.record(0x10000 + t as u64 * 0x10, 1);
            });
        }
    });

    let entries = set.into_entries();
    assert_eq!(entries.len(), threads);
    assert!(entries.windows(2).all(|w| w[0].address < w[1].address));
}

#[test]
fn test_concurrent_overlapping_inserts() {
    let threads = 100;
    let per_thread = 500u64;
    let set = BlockSet::default();

    thread::scope(|scope| {
        for t in 0..threads {
            let set = &set;
            scope.spawn(move || {
                for i in 0..per_thread {
                    // Every thread covers the shared range plus one private block.
                    set.record(i * 4, 1);
                    set.record(0x100000 + t, 1);
                }
            });
        }
    });

    assert_eq!(set.into_entries().len(), per_thread as usize + threads as usize);
}

#[test]
fn test_concurrent_count_updates() {
    let threads = 100;
    let counts = BlockCounts::default();

    thread::scope(|scope| {
        for t in 0..threads {
            let counts = &counts;
            scope.spawn(move || {
                counts.record(0xbeef, 6);
                counts.record(0x1000 + t, t as u32);
            });
        }
    });

    let entries = counts.into_entries();
    assert_eq!(entries.len(), threads as usize + 1);
    let shared = entries.iter().find(|e| e.address == 0xbeef).unwrap();
    assert_eq!(shared.instruction_count, Some(6));
}

#[test]
fn test_threaded_replay_matches_single_threaded() {
    let blocks: Vec<BlockInfo> = (0..10_000u64)
        .map(|i| BlockInfo::new(0x400000 + (i * 7919 % 1000) * 0x10, 3))
        .collect();

    let single = NamedTempFile::new().unwrap();
    let threaded = NamedTempFile::new().unwrap();

    for (path, threads) in [(single.path(), 1), (threaded.path(), 16)] {
        let config = RecorderConfig::builder()
            .output(path)
            .variant(Variant::Count)
            .emit_counts(true)
            .build()
            .unwrap();
        let trace = ExecutionTrace::new(blocks.clone(), 0);
        record_coverage(&mut ReplayHost::new(trace).with_threads(threads), &config).unwrap();
    }

    let single = bbcov::from_file(single.path()).unwrap();
    let threaded = bbcov::from_file(threaded.path()).unwrap();
    assert_eq!(single.len(), 1000);
    assert_eq!(single, threaded);
}

#[test]
fn test_conflicting_counts_resolve_to_first_occurrence() {
    // Chunk 0 ends with the first sighting of 0x1000; chunk 1 starts with a
    // second sighting carrying a different count.
    let mut blocks: Vec<BlockInfo> = (0..5_000u64)
        .map(|i| BlockInfo::new(0x400000 + i * 0x10, 2))
        .collect();
    blocks.push(BlockInfo::new(0x1000, 4));
    blocks.push(BlockInfo::new(0x1000, 9));
    blocks.extend((0..4_999u64).map(|i| BlockInfo::new(0x800000 + i * 0x10, 2)));

    for threads in [1, 2, 4] {
        for _ in 0..10 {
            let output = NamedTempFile::new().unwrap();
            let config = RecorderConfig::builder()
                .output(output.path())
                .variant(Variant::Count)
                .emit_counts(true)
                .build()
                .unwrap();
            let trace = ExecutionTrace::new(blocks.clone(), 0);
            record_coverage(&mut ReplayHost::new(trace).with_threads(threads), &config).unwrap();

            let dump = bbcov::from_file(output.path()).unwrap();
            let entry = dump.entries.iter().find(|e| e.address == 0x1000).unwrap();
            assert_eq!(entry.instruction_count, Some(4), "threads = {threads}");
        }
    }
}

#[test]
fn test_more_threads_than_blocks() {
    let output = NamedTempFile::new().unwrap();
    let config = RecorderConfig::builder()
        .output(output.path())
        .build()
        .unwrap();
    let trace = ExecutionTrace::from_addresses([0x1, 0x2]);

    record_coverage(&mut ReplayHost::new(trace).with_threads(200), &config).unwrap();
    assert_eq!(bbcov::from_file(output.path()).unwrap().len(), 2);
}
