//! # bbcov
//!
//! Basic block coverage recording for dynamic binary instrumentation.
//!
//! A [`Recorder`] is attached to an instrumentation engine through the
//! [`BlockTool`] callbacks. Every time the target executes a basic block the
//! recorder notes the block's start address (and, for the count variant, its
//! static instruction count). When the target exits the recorder writes the
//! collected blocks to a text file, one address per line in ascending order.
//!
//! Two payloads are available:
//!
//! - [`BlockSetRecorder`]: the distinct set of executed block addresses.
//! - [`BlockCountRecorder`]: block address to instruction count. Revisits
//!   overwrite the count rather than adding to it.
//!
//! Recording is safe from any number of target threads.
//!
//! ## Example Usage
//!
//! ```no_run
//! use bbcov::{record_coverage, ExecutionTrace, RecorderConfig, ReplayHost};
//!
//! let config = RecorderConfig::builder()
//!     .output("coverage.out")
//!     .build()
//!     .unwrap();
//!
//! // Drive the recorder from a trace of executed block addresses
//! let trace = ExecutionTrace::from_addresses([0x1000, 0x1010, 0x1000, 0x1020]);
//! let exit_code = record_coverage(&mut ReplayHost::new(trace), &config).unwrap();
//!
//! // Read the dump back
//! let dump = bbcov::from_file("coverage.out").unwrap();
//! assert_eq!(dump.len(), 3);
//! assert_eq!(exit_code, 0);
//! ```

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod accumulator;
pub mod block;
pub mod config;
pub mod host;
pub mod reader;
pub mod recorder;
pub mod replay;
pub mod writer;

pub use accumulator::{Accumulator, BlockCounts, BlockSet};
pub use block::{BlockInfo, CoverageEntry};
pub use config::{RecorderConfig, RecorderConfigBuilder, Variant};
pub use host::{BlockTool, InstrumentationHost};
pub use reader::{from_file, from_reader};
pub use recorder::{record_coverage, BlockCountRecorder, BlockSetRecorder, Recorder};
pub use replay::{ExecutionTrace, ReplayHost};
pub use writer::{to_file, to_writer, CoverageWriter, OutputFormat};

/// A specialized `Result` type for bbcov operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while recording or reading coverage.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred while reading or writing.
    Io(io::Error),
    /// The recorder configuration is unusable.
    Config(String),
    /// The output file could not be opened at startup.
    OutputUnavailable { path: PathBuf, source: io::Error },
    /// A coverage dump is invalid or malformed.
    InvalidFormat(String),
    /// An execution trace is invalid or malformed.
    InvalidTrace { line: usize, message: String },
    /// The data failed a validation check (e.g., unsorted addresses).
    ValidationError(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            Error::OutputUnavailable { path, source } => {
                write!(f, "Cannot open output file '{}': {source}", path.display())
            }
            Error::InvalidFormat(msg) => write!(f, "Invalid format: {msg}"),
            Error::InvalidTrace { line, message } => {
                write!(f, "Invalid trace at line {line}: {message}")
            }
            Error::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::OutputUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Constants used throughout the library.
mod consts {
    pub(crate) const DEFAULT_OUTPUT: &str = "coverage.out";
    pub(crate) const HEX_PREFIX: &str = "0x";
    pub(crate) const EXIT_KEYWORD: &str = "exit";
    pub(crate) const DEFAULT_INSTRUCTION_COUNT: u32 = 1;
}

/// The contents of a coverage dump.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageDump {
    pub entries: Vec<CoverageEntry>,
}

impl CoverageDump {
    /// Checks that addresses are strictly ascending.
    pub fn validate(&self) -> Result<()> {
        validate_entries(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the covered block addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|e| e.address)
    }

    /// Checks whether the block starting at `address` was covered.
    pub fn contains(&self, address: u64) -> bool {
        self.entries
            .binary_search_by_key(&address, |e| e.address)
            .is_ok()
    }

    /// Whether any entry carries an instruction count.
    pub fn has_counts(&self) -> bool {
        self.entries.iter().any(|e| e.instruction_count.is_some())
    }

    /// Sum of the static instruction counts of all covered blocks.
    pub fn total_instructions(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| e.instruction_count)
            .map(u64::from)
            .sum()
    }

    /// Lowest and highest covered addresses.
    pub fn address_range(&self) -> Option<(u64, u64)> {
        Some((self.entries.first()?.address, self.entries.last()?.address))
    }
}

pub(crate) fn validate_entries(entries: &[CoverageEntry]) -> Result<()> {
    for pair in entries.windows(2) {
        if pair[0].address >= pair[1].address {
            return Err(Error::ValidationError(format!(
                "Address {:#x} does not follow {:#x} in ascending order",
                pair[1].address, pair[0].address
            )));
        }
    }
    Ok(())
}
