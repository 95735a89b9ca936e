//! Per-run block accumulators.
//!
//! An accumulator is written from the analysis routine on every block
//! execution, possibly from several target threads at once, and is read
//! exactly once when the process exits. Both implementations keep their
//! contents in address-ordered containers so the final enumeration is
//! ascending without an extra sort.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;

use crate::block::CoverageEntry;
use crate::config::Variant;

/// Storage for the blocks observed during a run.
pub trait Accumulator: Default + Send + Sync {
    /// The payload this accumulator records.
    const VARIANT: Variant;

    /// Records one execution of the block starting at `address`.
    ///
    /// `instruction_count` is the block's static size; variants that only
    /// track membership ignore it. Must be callable concurrently.
    fn record(&self, address: u64, instruction_count: u32);

    /// Consumes the accumulator, returning its entries in ascending address order.
    fn into_entries(self) -> Vec<CoverageEntry>;
}

/// The distinct set of block addresses reached at least once.
#[derive(Debug, Default)]
pub struct BlockSet {
    blocks: Mutex<BTreeSet<u64>>,
}

impl Accumulator for BlockSet {
    const VARIANT: Variant = Variant::Set;

    #[inline]
    fn record(&self, address: u64, _instruction_count: u32) {
        self.blocks.lock().insert(address);
    }

    fn into_entries(self) -> Vec<CoverageEntry> {
        self.blocks
            .into_inner()
            .into_iter()
            .map(CoverageEntry::address)
            .collect()
    }
}

/// Block address to instruction count. Revisits overwrite, they never sum.
#[derive(Debug, Default)]
pub struct BlockCounts {
    blocks: Mutex<BTreeMap<u64, u32>>,
}

impl Accumulator for BlockCounts {
    const VARIANT: Variant = Variant::Count;

    #[inline]
    fn record(&self, address: u64, instruction_count: u32) {
        self.blocks.lock().insert(address, instruction_count);
    }

    fn into_entries(self) -> Vec<CoverageEntry> {
        self.blocks
            .into_inner()
            .into_iter()
            .map(|(address, count)| CoverageEntry::with_count(address, count))
            .collect()
    }
}
