//! Engine Module
//!
//! The storage engine that coordinates all components. An `Engine` is the
//! store handle: the service owns one and passes it by reference into
//! every core operation.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup
//! - Atomic write batches, snapshots, cursors, properties

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::ValueCache;
use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::{KvError, Result};
use crate::memtable::{MemTable, MemTableEntry};
use crate::snapshot::{ReadOptions, ReadView, Snapshot};
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};
use crate::write_batch::WriteBatch;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/write/flush): serialized by the WAL mutex
///   - Only ONE write operation at a time
///   - Order: WAL append → memtable apply → flush if over the limit
///
/// - **Reads** (get/iter/snapshot): never take the WAL mutex
///   - MemTable uses an internal RwLock (many concurrent readers)
///   - SSTable readers are shared behind `Arc` and lock only their file
///     handle for the duration of one entry read
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory for all data files (SSTables)
    storage_dir: PathBuf,

    /// Write-ahead log; holding its lock serializes writers
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Property names understood by [`Engine::property`]
    pub const PROPERTIES: &'static [&'static str] = &[
        "rangekv.sstable-count",
        "rangekv.sstables",
        "rangekv.memtable-bytes",
        "rangekv.memtable-entries",
        "rangekv.cache-entries",
        "rangekv.wal-lsn",
        "rangekv.stats",
    ];

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Refuse if `error_if_exists` and a store is already there
    /// 2. Open/create data directory
    /// 3. Load existing SSTables
    /// 4. Recover from WAL if exists, flushing what it held
    /// 5. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if config.error_if_exists && Self::exists(&config.data_dir) {
            return Err(KvError::DestinationExists(config.data_dir.clone()));
        }

        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let cache = Arc::new(ValueCache::new(config.cache_capacity));
        let storage = StorageManager::open(&storage_dir, cache)?;
        let memtable = MemTable::new();

        let mut recovered = false;
        if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}, truncated={}",
                    result.entries_recovered,
                    result.entries_corrupted,
                    result.last_lsn,
                    result.was_truncated
                );
            }

            for entry in entries {
                let mut changes = Vec::new();
                Self::collect_changes(entry.operation, &mut changes);
                memtable.apply(changes);
            }

            // Make recovered data durable in an SSTable before the log is reset
            if !memtable.is_empty() {
                tracing::info!(
                    "Flushing {} recovered entries to SSTable",
                    memtable.entry_count()
                );
                storage.flush(&memtable.freeze())?;
                memtable.clear();
                recovered = true;
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        if recovered {
            wal.truncate()?;
        }

        tracing::info!(
            "Opened store at {} ({} SSTables)",
            config.data_dir.display(),
            storage.sstable_count()
        );

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Whether a store has already been created at `path`
    pub fn exists(path: &Path) -> bool {
        path.join(Self::WAL_FILENAME).exists() || path.join(Self::SSTABLE_DIR).exists()
    }

    /// Delete the store at `path` entirely
    ///
    /// The directory itself is removed only if nothing else is left in it.
    /// The store must not be open.
    pub fn destroy(path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let wal_path = path.join(Self::WAL_FILENAME);
        if wal_path.exists() {
            fs::remove_file(&wal_path)?;
        }

        let sstable_dir = path.join(Self::SSTABLE_DIR);
        if sstable_dir.exists() {
            fs::remove_dir_all(&sstable_dir)?;
        }

        if fs::read_dir(path)?.next().is_none() {
            fs::remove_dir(path)?;
        }

        tracing::debug!("Destroyed store at {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.get_with(&ReadOptions::default(), key)
    }

    /// Get a value by key with explicit read options
    pub fn get_with(&self, options: &ReadOptions, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(snapshot) = &options.snapshot {
            return snapshot.view.get(key, options.fill_cache);
        }

        if let Some(entry) = self.memtable.get(key) {
            return match entry {
                MemTableEntry::Value(value) => Ok(Some(value)),
                MemTableEntry::Tombstone => Ok(None),
            };
        }

        self.storage.get(key, options.fill_cache)
    }

    /// Take a stable read view of the store as of now
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.read_view())
    }

    /// Open a cursor
    ///
    /// Without a snapshot in `options` the cursor reads an implicit view
    /// taken now, so it never observes writes made while it is open.
    pub fn iter(&self, options: ReadOptions) -> Cursor {
        let view = match options.snapshot {
            Some(snapshot) => snapshot.view,
            None => Arc::new(self.read_view()),
        };
        Cursor::new(view, options.fill_cache)
    }

    fn read_view(&self) -> ReadView {
        // Writers are excluded so the memtable and table list match
        let _writer = self.wal.lock();
        ReadView::new(
            self.memtable.freeze(),
            self.storage.tables(),
            Arc::clone(self.storage.cache()),
        )
    }

    /// Look up an engine property by name
    ///
    /// Returns `None` for unknown names.
    pub fn property(&self, name: &str) -> Option<String> {
        let value = match name {
            "rangekv.sstable-count" => self.storage.sstable_count().to_string(),
            "rangekv.sstables" => {
                let mut out = String::new();
                for table in self.storage.tables() {
                    out.push_str(&format!(
                        "{}: {} entries, {} bytes, [{} .. {}]\n",
                        table.id(),
                        table.entry_count(),
                        table.file_size(),
                        String::from_utf8_lossy(table.min_key().unwrap_or_default()),
                        String::from_utf8_lossy(table.max_key().unwrap_or_default()),
                    ));
                }
                out
            }
            "rangekv.memtable-bytes" => self.memtable.size().to_string(),
            "rangekv.memtable-entries" => self.memtable.entry_count().to_string(),
            "rangekv.cache-entries" => self.storage.cache().len().to_string(),
            "rangekv.wal-lsn" => self.wal.lock().current_lsn().saturating_sub(1).to_string(),
            "rangekv.stats" => {
                let (hits, misses) = self.storage.cache().stats();
                format!(
                    "sstables: {}\nmemtable entries: {}\nmemtable bytes: {}\n\
                     cache entries: {}/{}\ncache hits: {}\ncache misses: {}\n",
                    self.storage.sstable_count(),
                    self.memtable.entry_count(),
                    self.memtable.size(),
                    self.storage.cache().len(),
                    self.storage.cache().capacity(),
                    hits,
                    misses,
                )
            }
            _ => return None,
        };
        Some(value)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.commit(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Delete a key (deleting an absent key is not an error)
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.commit(Operation::Delete { key: key.to_vec() })
    }

    /// Apply a batch atomically
    ///
    /// The whole batch is one WAL entry and one memtable update, so readers
    /// and crash recovery see all of it or none of it.
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.commit(Operation::Batch {
            ops: batch.into_operations(),
        })
    }

    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Check if flush needed
    fn commit(&self, operation: Operation) -> Result<()> {
        let mut wal = self.wal.lock();

        let mut changes = Vec::new();
        Self::collect_changes(operation.clone(), &mut changes);

        wal.append(operation)?;
        let new_size = self.memtable.apply(changes);

        if new_size >= self.config.memtable_size_limit {
            self.flush_locked(&mut wal)?;
        }

        Ok(())
    }

    fn collect_changes(operation: Operation, out: &mut Vec<(Vec<u8>, MemTableEntry)>) {
        match operation {
            Operation::Put { key, value } => out.push((key, MemTableEntry::Value(value))),
            Operation::Delete { key } => out.push((key, MemTableEntry::Tombstone)),
            Operation::Batch { ops } => {
                for op in ops {
                    Self::collect_changes(op, out);
                }
            }
        }
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.flush_locked(&mut wal)
    }

    /// Flush with the write lock held
    fn flush_locked(&self, wal: &mut WalWriter) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable.freeze())?;
        self.memtable.clear();

        // Entries are now durable in the SSTable
        wal.truncate()?;
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.flush_locked(&mut wal)?;
        wal.sync()?;
        tracing::debug!("Closed store at {}", self.config.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the storage directory path (where SSTables are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
