//! Recorder configuration.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::writer::OutputFormat;
use crate::{consts, Error, Result};

/// Which payload the recorder accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Distinct block addresses.
    #[default]
    Set,
    /// Block address to static instruction count.
    Count,
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Set => f.write_str("set"),
            Variant::Count => f.write_str("count"),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "set" => Ok(Variant::Set),
            "count" => Ok(Variant::Count),
            other => Err(Error::Config(format!(
                "unknown variant '{other}', expected 'set' or 'count'"
            ))),
        }
    }
}

/// Settings fixed at startup, before any block is instrumented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    pub output: PathBuf,
    pub variant: Variant,
    pub format: OutputFormat,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(consts::DEFAULT_OUTPUT),
            variant: Variant::default(),
            format: OutputFormat::default(),
        }
    }
}

impl RecorderConfig {
    /// Creates a new `RecorderConfigBuilder` starting from the defaults.
    pub fn builder() -> RecorderConfigBuilder {
        RecorderConfigBuilder::default()
    }

    /// Checks the settings before any output is opened.
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(Error::Config("output path is empty".to_string()));
        }
        if self.output.is_dir() {
            return Err(Error::Config(format!(
                "output path '{}' is a directory",
                self.output.display()
            )));
        }
        Ok(())
    }
}

/// A builder for creating `RecorderConfig` instances.
#[derive(Debug, Default)]
pub struct RecorderConfigBuilder {
    config: RecorderConfig,
}

impl RecorderConfigBuilder {
    /// Sets the dump destination.
    pub fn output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.output = path.as_ref().to_path_buf();
        self
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.config.variant = variant;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Shorthand for choosing between the two output formats.
    pub fn emit_counts(self, emit: bool) -> Self {
        self.format(if emit {
            OutputFormat::AddressesWithCounts
        } else {
            OutputFormat::Addresses
        })
    }

    /// Consumes the builder and returns the final `RecorderConfig`.
    ///
    /// # Errors
    /// Returns a `Config` error if the settings are unusable.
    pub fn build(self) -> Result<RecorderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
