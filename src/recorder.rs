//! The coverage recorder: an accumulator and its output, wired to the
//! engine callbacks.

use tracing::{info, trace};

use crate::accumulator::{Accumulator, BlockCounts, BlockSet};
use crate::block::BlockInfo;
use crate::config::{RecorderConfig, Variant};
use crate::host::{BlockTool, InstrumentationHost};
use crate::writer::CoverageWriter;
use crate::{Error, Result};

/// Per-run recording context.
///
/// Created at startup with its output already open, mutated through
/// [`record`](Recorder::record) for every block execution, and consumed by
/// [`finalize`](Recorder::finalize) when the target exits.
#[derive(Debug)]
pub struct Recorder<A: Accumulator> {
    accumulator: A,
    writer: CoverageWriter,
}

/// Records the distinct set of executed block addresses.
pub type BlockSetRecorder = Recorder<BlockSet>;

/// Records the static instruction count of every executed block.
pub type BlockCountRecorder = Recorder<BlockCounts>;

impl<A: Accumulator> Recorder<A> {
    /// Creates a recorder with an empty accumulator that will dump to `writer`.
    pub fn new(writer: CoverageWriter) -> Self {
        Self {
            accumulator: A::default(),
            writer,
        }
    }

    /// Validates `config` and opens its output file.
    ///
    /// # Errors
    /// Returns a `Config` error if `config.variant` names a different payload
    /// than `A` records. See [`record_coverage`] for variant dispatch.
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        config.validate()?;
        if config.variant != A::VARIANT {
            return Err(Error::Config(format!(
                "variant '{}' does not match a '{}' recorder",
                config.variant,
                A::VARIANT
            )));
        }
        Ok(Self::new(CoverageWriter::create(
            &config.output,
            config.format,
        )?))
    }

    /// Analysis routine body: notes one execution of a block.
    #[inline]
    pub fn record(&self, address: u64, instruction_count: u32) {
        self.accumulator.record(address, instruction_count);
    }

    /// Writes the accumulated blocks to the output and closes it.
    ///
    /// Returns the number of blocks written.
    pub fn finalize(self) -> Result<usize> {
        let entries = self.accumulator.into_entries();
        self.writer.finalize(&entries)
    }
}

impl<A: Accumulator> BlockTool for Recorder<A> {
    type Probe = BlockInfo;

    fn on_block_discovered(&self, block: &BlockInfo) -> BlockInfo {
        trace!(
            address = block.address,
            instructions = block.instruction_count,
            "instrumenting block"
        );
        *block
    }

    #[inline]
    fn on_block_executed(&self, probe: BlockInfo) {
        self.record(probe.address, probe.instruction_count);
    }

    fn on_process_exit(self, exit_code: i32) -> Result<()> {
        info!(exit_code, "target exited, flushing coverage");
        self.finalize()?;
        Ok(())
    }
}

/// Runs `host` with a recorder built from `config` and returns the target's
/// exit code.
///
/// The output file is opened before the host starts, so an unusable path
/// fails here without running anything.
pub fn record_coverage<H: InstrumentationHost>(
    host: &mut H,
    config: &RecorderConfig,
) -> Result<i32> {
    info!(
        variant = %config.variant,
        output = %config.output.display(),
        "starting coverage recorder"
    );
    match config.variant {
        Variant::Set => host.run(BlockSetRecorder::from_config(config)?),
        Variant::Count => host.run(BlockCountRecorder::from_config(config)?),
    }
}
