//! A software instrumentation host that replays a recorded execution trace.
//!
//! A trace lists executed blocks in order, one per line:
//!
//! ```text
//! # address  [instructions]
//! 0x1000 4
//! 0x1010 2
//! 0x1000
//! exit 0
//! ```
//!
//! The instruction count defaults to 1 when omitted. A block's count is
//! taken from its first occurrence in the trace, since the engine measures
//! it once when the block is discovered. This holds for any thread count.
//! The optional `exit <code>` line must come last and sets the exit code
//! reported to the tool (0 when absent).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::thread;

use parking_lot::RwLock;
use tracing::debug;

use crate::block::BlockInfo;
use crate::host::{BlockTool, InstrumentationHost};
use crate::reader::{parse_address, parse_count};
use crate::{consts, Error, Result};

/// A sequence of block executions and the exit code that ends it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionTrace {
    pub blocks: Vec<BlockInfo>,
    pub exit_code: i32,
}

impl ExecutionTrace {
    pub fn new(blocks: Vec<BlockInfo>, exit_code: i32) -> Self {
        Self { blocks, exit_code }
    }

    /// Builds a trace from bare addresses, each block one instruction long.
    pub fn from_addresses<I: IntoIterator<Item = u64>>(addresses: I) -> Self {
        Self::new(
            addresses
                .into_iter()
                .map(|address| BlockInfo::new(address, consts::DEFAULT_INSTRUCTION_COUNT))
                .collect(),
            0,
        )
    }

    /// Parses a trace from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Parses a trace from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut trace = ExecutionTrace::default();
        let mut exited = false;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            if exited {
                return Err(invalid(line_no, "content after exit line"));
            }

            let mut fields = content.split_whitespace();
            let Some(first) = fields.next() else {
                continue;
            };

            if first == consts::EXIT_KEYWORD {
                let code = fields
                    .next()
                    .ok_or_else(|| invalid(line_no, "missing exit code"))?;
                trace.exit_code = code
                    .parse()
                    .map_err(|_| invalid(line_no, &format!("invalid exit code '{code}'")))?;
                exited = true;
            } else {
                let address = parse_address(first)
                    .ok_or_else(|| invalid(line_no, &format!("invalid address '{first}'")))?;
                let instruction_count = match fields.next() {
                    Some(field) => parse_count(field).ok_or_else(|| {
                        invalid(line_no, &format!("invalid instruction count '{field}'"))
                    })?,
                    None => consts::DEFAULT_INSTRUCTION_COUNT,
                };
                trace.blocks.push(BlockInfo::new(address, instruction_count));
            }

            if fields.next().is_some() {
                return Err(invalid(line_no, "unexpected trailing fields"));
            }
        }

        Ok(trace)
    }
}

fn invalid(line: usize, message: &str) -> Error {
    Error::InvalidTrace {
        line,
        message: message.to_string(),
    }
}

/// Replays an [`ExecutionTrace`] against a tool.
///
/// With more than one thread the trace is split into contiguous slices,
/// each executed by its own worker, so execution callbacks arrive
/// concurrently the way they would from a multi-threaded target. Discovery
/// still happens exactly once per distinct address.
#[derive(Debug, Clone)]
pub struct ReplayHost {
    trace: ExecutionTrace,
    threads: usize,
}

impl ReplayHost {
    pub fn new(trace: ExecutionTrace) -> Self {
        Self { trace, threads: 1 }
    }

    /// Sets the number of worker threads. Zero is treated as one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }
}

impl InstrumentationHost for ReplayHost {
    fn run<T: BlockTool>(&mut self, tool: T) -> Result<i32> {
        let blocks = &self.trace.blocks;
        let probes = ProbeCache::for_blocks(blocks);
        let workers = self.threads.min(blocks.len()).max(1);
        debug!(
            blocks = blocks.len(),
            threads = workers,
            "replaying execution trace"
        );

        if workers == 1 {
            execute(&tool, &probes, blocks);
        } else {
            let chunk_size = blocks.len().div_ceil(workers);
            thread::scope(|scope| {
                for chunk in blocks.chunks(chunk_size) {
                    let tool = &tool;
                    let probes = &probes;
                    scope.spawn(move || execute(tool, probes, chunk));
                }
            });
        }

        debug!(discovered = probes.len(), "trace finished");
        tool.on_process_exit(self.trace.exit_code)?;
        Ok(self.trace.exit_code)
    }
}

fn execute<T: BlockTool>(tool: &T, probes: &ProbeCache<T::Probe>, blocks: &[BlockInfo]) {
    for block in blocks {
        let probe = probes.get_or_discover(tool, block);
        tool.on_block_executed(probe);
    }
}

/// Probes handed out at discovery, keyed by block address.
struct ProbeCache<P> {
    /// First occurrence of every address in trace order. Discovery always
    /// sees this block, whichever worker reaches the address first.
    first_seen: HashMap<u64, BlockInfo>,
    probes: RwLock<HashMap<u64, P>>,
}

impl<P: Copy> ProbeCache<P> {
    fn for_blocks(blocks: &[BlockInfo]) -> Self {
        let mut first_seen = HashMap::new();
        for block in blocks {
            first_seen.entry(block.address).or_insert(*block);
        }
        Self {
            first_seen,
            probes: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_discover<T: BlockTool<Probe = P>>(&self, tool: &T, block: &BlockInfo) -> P {
        if let Some(probe) = self.probes.read().get(&block.address) {
            return *probe;
        }
        let discovered = self.first_seen.get(&block.address).unwrap_or(block);
        // Re-check under the write lock: another worker may have discovered it.
        *self
            .probes
            .write()
            .entry(block.address)
            .or_insert_with(|| tool.on_block_discovered(discovered))
    }

    fn len(&self) -> usize {
        self.probes.read().len()
    }
}
