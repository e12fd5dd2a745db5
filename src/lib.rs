//! # RangeKV
//!
//! An ordered, embedded key-value store served over HTTP, with:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with partial write handling
//! - Single-writer/multi-reader concurrency model
//! - Directional range scans with capped, resumable pages
//! - Atomic write batches
//! - Point-in-time snapshots and chunked export to a new store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   HTTP Server (axum)                         │
//! │            /key  /iterate  /batch  /snapshot                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Operations                              │
//! │     RangeScanner · paginate · batch apply · export           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │      cursors · write batches · snapshots · properties        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod cache;
pub mod snapshot;
pub mod cursor;
pub mod write_batch;
pub mod engine;

pub mod ops;
pub mod server;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, WalSyncStrategy};
pub use cursor::Cursor;
pub use engine::Engine;
pub use snapshot::{ReadOptions, Snapshot};
pub use write_batch::WriteBatch;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RangeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
