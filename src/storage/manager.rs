//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Hand out the current table set to read views

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::ValueCache;
use crate::error::{KvError, Result};
use crate::memtable::{FrozenMemTable, MemTableEntry};

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: RwLock over a list of shared readers; a flush swaps in a new
///   reader under the write lock, everything else takes the read lock
/// - Readers are immutable once opened, so a read view can keep using a
///   cloned list after later flushes
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<Arc<SSTableReader>>>,

    /// Next ID for creating new SSTables
    next_sstable_id: AtomicU64,

    /// Cache of values read from the tables
    cache: Arc<ValueCache>,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing SSTable files
    /// 3. Open readers for each (loads indexes into RAM)
    /// 4. Order by ID descending (newest first)
    pub fn open(path: &Path, cache: Arc<ValueCache>) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    sstable_ids.push(id);
                }
            }
        }

        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for &id in &sstable_ids {
            let reader = SSTableReader::open(&Self::sstable_path_with_dir(path, id), id)?;
            sstables.push(Arc::new(reader));
        }

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
            cache,
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8], fill_cache: bool) -> Result<Option<Vec<u8>>> {
        let tables = self.tables();
        Self::get_from(&tables, &self.cache, key, fill_cache)
    }

    /// Point lookup over a fixed table list, newest first
    pub(crate) fn get_from(
        tables: &[Arc<SSTableReader>],
        cache: &ValueCache,
        key: &[u8],
        fill_cache: bool,
    ) -> Result<Option<Vec<u8>>> {
        for reader in tables {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(offset) = reader.offset_of(key) {
                return Self::read_cached(reader, cache, offset, fill_cache);
            }
        }
        Ok(None)
    }

    /// Read an entry through the value cache
    pub(crate) fn read_cached(
        reader: &SSTableReader,
        cache: &ValueCache,
        offset: u64,
        fill_cache: bool,
    ) -> Result<Option<Vec<u8>>> {
        if let Some(hit) = cache.get(reader.id(), offset) {
            return Ok(hit);
        }

        let value = reader.read_value_at(offset)?;
        if fill_cache {
            cache.insert(reader.id(), offset, value.clone());
        }
        Ok(value)
    }

    /// Flush a pinned MemTable to a new SSTable
    ///
    /// Creates a new SSTable file from the sorted entries, opens a reader
    /// for it, and adds it to the front of the list.
    pub fn flush(&self, entries: &FrozenMemTable) -> Result<SSTable> {
        if entries.is_empty() {
            return Err(KvError::Storage("Cannot flush empty MemTable".to_string()));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, entry) in entries.iter() {
            match entry {
                MemTableEntry::Value(v) => builder.add(key, v)?,
                MemTableEntry::Tombstone => builder.add_tombstone(key)?,
            }
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path, id)?;
        self.sstables.write().insert(0, Arc::new(reader));

        tracing::debug!(
            "Flushed {} entries to {} ({} bytes)",
            metadata.entry_count,
            path.display(),
            metadata.file_size
        );

        Ok(metadata)
    }

    /// The current table list, newest first
    pub fn tables(&self) -> Vec<Arc<SSTableReader>> {
        self.sstables.read().clone()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    /// The value cache shared with read views
    pub fn cache(&self) -> &Arc<ValueCache> {
        &self.cache
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    pub(crate) fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        name.strip_prefix("sstable_")?.parse().ok()
    }
}
