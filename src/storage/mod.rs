//! Storage Module
//!
//! Persistent storage layer using SSTable-like format.
//!
//! ## Responsibilities
//! - Persist data to disk in sorted format
//! - Point lookups and ordered range access for cursors
//! - Immutable tables that read views can share
//!
//! No compaction: tables accumulate until the store is destroyed.

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use manager::StorageManager;
