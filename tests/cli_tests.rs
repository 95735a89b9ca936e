#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn replay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bbcov-replay"))
        .args(args)
        .env("RUST_LOG", "bbcov=warn")
        .output()
        .unwrap()
}

fn write_trace(dir: &Path, contents: &str) -> String {
    let path = dir.join("trace.txt");
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

/// `process::exit(-1)` reads back as 255 on Unix.
fn assert_usage_exit(output: &Output) {
    assert!(
        matches!(output.status.code(), Some(255) | Some(-1)),
        "status: {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_passes_through_trace_exit_code() {
    let dir = tempdir().unwrap();
    let trace = write_trace(dir.path(), "0x1000\n0x1010\n0x1000\n0x1020\nexit 3\n");
    let out = dir.path().join("coverage.out");

    let output = replay(&["-o", out.to_str().unwrap(), &trace]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(fs::read_to_string(&out).unwrap(), "0x1000\n0x1010\n0x1020\n");
}

#[test]
fn test_count_variant_with_counts() {
    let dir = tempdir().unwrap();
    let trace = write_trace(dir.path(), "0x20 5\n0x10 2\n0x20 5\n");
    let out = dir.path().join("counts.out");

    let output = replay(&[
        "--variant",
        "count",
        "--emit-counts",
        "--threads",
        "2",
        "-o",
        out.to_str().unwrap(),
        &trace,
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(&out).unwrap(), "0x10 2\n0x20 5\n");
}

#[test]
fn test_unknown_variant() {
    let dir = tempdir().unwrap();
    let trace = write_trace(dir.path(), "0x10\n");
    let out = dir.path().join("coverage.out");

    let output = replay(&["--variant", "both", "-o", out.to_str().unwrap(), &trace]);
    assert_usage_exit(&output);
    assert!(!out.exists());
}

#[test]
fn test_output_in_missing_directory() {
    let dir = tempdir().unwrap();
    let trace = write_trace(dir.path(), "0x10\n");
    let out = dir.path().join("missing").join("coverage.out");

    let output = replay(&["-o", out.to_str().unwrap(), &trace]);
    assert_usage_exit(&output);
}

#[test]
fn test_empty_output_path() {
    let dir = tempdir().unwrap();
    let trace = write_trace(dir.path(), "0x10\n");

    let output = replay(&["-o", "", &trace]);
    assert_usage_exit(&output);
}

#[test]
fn test_missing_trace_argument() {
    assert_usage_exit(&replay(&[]));
}

#[test]
fn test_unreadable_trace() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("coverage.out");
    let absent = dir.path().join("absent.txt");

    let output = replay(&["-o", out.to_str().unwrap(), absent.to_str().unwrap()]);
    assert_usage_exit(&output);
}

#[test]
fn test_help_exits_cleanly() {
    let output = replay(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--output"));
}
