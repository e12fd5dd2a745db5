//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered iteration for SSTable creation and cursors
//! - Cheap pinning for snapshot read views (copy-on-write)

mod table;

pub use table::{FrozenMemTable, MemTable, MemTableIterator};

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    /// Bytes of payload carried by this entry
    pub fn payload_len(&self) -> usize {
        match self {
            MemTableEntry::Value(v) => v.len(),
            MemTableEntry::Tombstone => 0,
        }
    }
}
