//! The boundary between a coverage tool and the engine that runs the target.
//!
//! An instrumentation engine discovers basic blocks as the target runs,
//! lets the tool attach an analysis callback to each one, fires that
//! callback on every execution of the block, and notifies the tool once
//! when the target exits. [`BlockTool`] is the tool side of that contract
//! and [`InstrumentationHost`] the engine side.

use crate::block::BlockInfo;
use crate::Result;

/// Callbacks a coverage tool supplies to an instrumentation engine.
///
/// Implementations must be shareable between target threads: the engine may
/// call [`on_block_executed`](BlockTool::on_block_executed) concurrently
/// from every thread of a multi-threaded target.
pub trait BlockTool: Send + Sync {
    /// Data captured once at discovery and handed back on every execution.
    type Probe: Copy + Send + Sync;

    /// Called once per newly discovered block. The returned probe is what
    /// the engine passes to every later execution callback for the block.
    fn on_block_discovered(&self, block: &BlockInfo) -> Self::Probe;

    /// Called on every execution of a discovered block. Runs on the target's
    /// hot path and must not block beyond brief internal synchronization.
    fn on_block_executed(&self, probe: Self::Probe);

    /// Called exactly once after every target thread has stopped executing
    /// blocks. `exit_code` is informational; the tool behaves the same for
    /// any value.
    fn on_process_exit(self, exit_code: i32) -> Result<()>
    where
        Self: Sized;
}

/// An engine that runs a target under a [`BlockTool`].
pub trait InstrumentationHost {
    /// Runs the target to completion with `tool` attached and returns the
    /// target's exit code. The tool's exit callback has run by the time this
    /// returns; its error, if any, is returned instead of the exit code.
    fn run<T: BlockTool>(&mut self, tool: T) -> Result<i32>;
}
