//! Basic block descriptors and dump entries.

use std::fmt::{self, Display, Formatter};

/// A basic block as reported by the instrumentation engine at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInfo {
    /// Start address of the block in the target's address space.
    pub address: u64,
    /// Number of instructions in the block. Static for the block's lifetime.
    pub instruction_count: u32,
}

impl BlockInfo {
    pub fn new(address: u64, instruction_count: u32) -> Self {
        Self {
            address,
            instruction_count,
        }
    }
}

/// One line of a coverage dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CoverageEntry {
    pub address: u64,
    /// Present only for entries produced by the count variant.
    pub instruction_count: Option<u32>,
}

impl CoverageEntry {
    /// An address-only entry.
    pub fn address(address: u64) -> Self {
        Self {
            address,
            instruction_count: None,
        }
    }

    /// An entry carrying the block's static instruction count.
    pub fn with_count(address: u64, instruction_count: u32) -> Self {
        Self {
            address,
            instruction_count: Some(instruction_count),
        }
    }
}

impl Display for CoverageEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.instruction_count {
            Some(count) => write!(f, "{:#x} {count}", self.address),
            None => write!(f, "{:#x}", self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_display() {
        assert_eq!(CoverageEntry::address(0x40000).to_string(), "0x40000");
        assert_eq!(CoverageEntry::with_count(0x1010, 7).to_string(), "0x1010 7");
        assert_eq!(CoverageEntry::address(0).to_string(), "0x0");
    }

    #[test]
    fn test_entries_order_by_address() {
        let mut entries = vec![
            CoverageEntry::address(0x40010),
            CoverageEntry::address(0x40000),
            CoverageEntry::address(0x40020),
        ];
        entries.sort();
        let addresses: Vec<_> = entries.iter().map(|e| e.address).collect();
        assert_eq!(addresses, vec![0x40000, 0x40010, 0x40020]);
    }
}
