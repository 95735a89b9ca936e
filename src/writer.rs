//! Coverage dump writer.
//!
//! The dump is plain text, one block per line in ascending address order:
//!
//! ```text
//! 0x1000
//! 0x1010
//! 0x1020
//! ```
//!
//! With [`OutputFormat::AddressesWithCounts`], entries that carry an
//! instruction count get a second, decimal column: `0x1000 4`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::block::CoverageEntry;
use crate::{validate_entries, Error, Result};

/// Selects which columns are written to the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Addresses only, for both variants.
    #[default]
    Addresses,
    /// Addresses followed by the instruction count where one was recorded.
    AddressesWithCounts,
}

/// Owns the output file for a run.
///
/// The file is created (and truncated) when the writer is constructed, so an
/// unusable output path is reported before any instrumentation happens and
/// a run that records nothing still leaves an empty dump behind.
#[derive(Debug)]
pub struct CoverageWriter {
    path: PathBuf,
    out: BufWriter<File>,
    format: OutputFormat,
}

impl CoverageWriter {
    /// Opens `path` for writing, truncating any existing file.
    ///
    /// # Errors
    /// Returns [`Error::OutputUnavailable`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| Error::OutputUnavailable {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "opened coverage output");
        Ok(Self {
            path,
            out: BufWriter::new(file),
            format,
        })
    }

    /// Path of the dump this writer produces.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes all entries, flushes and closes the file.
    ///
    /// Returns the number of lines written. Nothing is retried: a failed
    /// write is returned to the caller as is.
    pub fn finalize(mut self, entries: &[CoverageEntry]) -> Result<usize> {
        to_writer(entries, &mut self.out, self.format)?;
        self.out.flush()?;
        info!(
            path = %self.path.display(),
            blocks = entries.len(),
            "wrote coverage dump"
        );
        Ok(entries.len())
    }
}

/// Writes a coverage dump to a file path.
pub fn to_file<P: AsRef<Path>>(
    entries: &[CoverageEntry],
    path: P,
    format: OutputFormat,
) -> Result<()> {
    CoverageWriter::create(path, format)?.finalize(entries)?;
    Ok(())
}

/// Writes a coverage dump to any writer.
///
/// # Errors
/// Returns a `ValidationError` if `entries` are not strictly ascending.
pub fn to_writer<W: Write>(
    entries: &[CoverageEntry],
    writer: &mut W,
    format: OutputFormat,
) -> Result<()> {
    validate_entries(entries)?;

    for entry in entries {
        let line = match format {
            OutputFormat::Addresses => CoverageEntry::address(entry.address),
            OutputFormat::AddressesWithCounts => *entry,
        };
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
