use bbcov::{record_coverage, Error, ExecutionTrace, RecorderConfig, ReplayHost, Variant};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Exit code for invalid arguments or configuration.
const USAGE_EXIT_CODE: i32 = -1;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Records all basic blocks executed by a traced program.",
    long_about = None
)]
struct Args {
    /// Execution trace to replay, one executed block per line
    #[arg(required = true)]
    trace: PathBuf,

    /// Output file name
    #[arg(short, long, default_value = "coverage.out")]
    output: PathBuf,

    /// What to record per block: `set` or `count`
    #[arg(long, default_value = "set")]
    variant: Variant,

    /// Write each block's instruction count next to its address (count variant)
    #[arg(long)]
    emit_counts: bool,

    /// Number of threads executing the trace
    #[arg(short, long, default_value_t = 1)]
    threads: usize,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            process::exit(USAGE_EXIT_CODE);
        }
        Err(e) => e.exit(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bbcov=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match RecorderConfig::builder()
        .output(&args.output)
        .variant(args.variant)
        .emit_counts(args.emit_counts)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(USAGE_EXIT_CODE);
        }
    };

    let trace = match ExecutionTrace::from_file(&args.trace) {
        Ok(trace) => trace,
        Err(e) => {
            error!("Failed to load trace '{}': {e}", args.trace.display());
            process::exit(USAGE_EXIT_CODE);
        }
    };

    let mut host = ReplayHost::new(trace).with_threads(args.threads);
    match record_coverage(&mut host, &config) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e @ (Error::Config(_) | Error::OutputUnavailable { .. })) => {
            error!("{e}");
            process::exit(USAGE_EXIT_CODE);
        }
        Err(e) => {
            error!("Failed to write coverage to '{}': {e}", config.output.display());
            process::exit(1);
        }
    }
}
