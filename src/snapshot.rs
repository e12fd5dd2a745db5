//! Read Views and Snapshots
//!
//! A read view pins the memtable contents and the SSTable list at one
//! instant and answers merged, newest-wins lookups against them. Later
//! writes go to a fresh copy of the memtable map and later flushes add new
//! tables to the engine's list, so neither is visible through an existing
//! view.

use std::ops::Bound;
use std::sync::Arc;

use crate::cache::ValueCache;
use crate::error::Result;
use crate::memtable::{FrozenMemTable, MemTableEntry};
use crate::storage::{SSTableReader, StorageManager};

/// Pinned, merged view over memtable + SSTables
pub(crate) struct ReadView {
    memtable: FrozenMemTable,
    /// Newest first
    tables: Vec<Arc<SSTableReader>>,
    cache: Arc<ValueCache>,
}

fn borrowed(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl ReadView {
    pub(crate) fn new(
        memtable: FrozenMemTable,
        tables: Vec<Arc<SSTableReader>>,
        cache: Arc<ValueCache>,
    ) -> Self {
        Self {
            memtable,
            tables,
            cache,
        }
    }

    /// Point lookup; `None` if absent or deleted
    pub(crate) fn get(&self, key: &[u8], fill_cache: bool) -> Result<Option<Vec<u8>>> {
        match self.memtable.get(key) {
            Some(MemTableEntry::Value(v)) => Ok(Some(v.clone())),
            Some(MemTableEntry::Tombstone) => Ok(None),
            None => StorageManager::get_from(&self.tables, &self.cache, key, fill_cache),
        }
    }

    /// Smallest live record whose key satisfies `lower`
    pub(crate) fn first_from(
        &self,
        lower: Bound<&[u8]>,
        fill_cache: bool,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut lower: Bound<Vec<u8>> = lower.map(<[u8]>::to_vec);

        loop {
            let from = borrowed(&lower);
            let mut candidate: Option<&[u8]> = self
                .memtable
                .range::<[u8], _>((from, Bound::Unbounded))
                .next()
                .map(|(k, _)| k.as_slice());

            for table in &self.tables {
                if let Some((key, _)) = table.first_from(from) {
                    if candidate.map_or(true, |c| key < c) {
                        candidate = Some(key);
                    }
                }
            }

            let Some(key) = candidate.map(<[u8]>::to_vec) else {
                return Ok(None);
            };

            match self.get(&key, fill_cache)? {
                Some(value) => return Ok(Some((key, value))),
                None => lower = Bound::Excluded(key),
            }
        }
    }

    /// Largest live record whose key satisfies `upper`
    pub(crate) fn last_until(
        &self,
        upper: Bound<&[u8]>,
        fill_cache: bool,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut upper: Bound<Vec<u8>> = upper.map(<[u8]>::to_vec);

        loop {
            let until = borrowed(&upper);
            let mut candidate: Option<&[u8]> = self
                .memtable
                .range::<[u8], _>((Bound::Unbounded, until))
                .next_back()
                .map(|(k, _)| k.as_slice());

            for table in &self.tables {
                if let Some((key, _)) = table.last_until(until) {
                    if candidate.map_or(true, |c| key > c) {
                        candidate = Some(key);
                    }
                }
            }

            let Some(key) = candidate.map(<[u8]>::to_vec) else {
                return Ok(None);
            };

            match self.get(&key, fill_cache)? {
                Some(value) => return Ok(Some((key, value))),
                None => upper = Bound::Excluded(key),
            }
        }
    }
}

/// A stable, isolated read view of the store as of the moment it was taken
///
/// Cheap to clone. Released when the last clone (and every cursor opened
/// on it) is dropped.
#[derive(Clone)]
pub struct Snapshot {
    pub(crate) view: Arc<ReadView>,
}

impl Snapshot {
    pub(crate) fn new(view: ReadView) -> Self {
        Self {
            view: Arc::new(view),
        }
    }

    /// Point lookup as of the snapshot
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.view.get(key, true)
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("memtable_entries", &self.view.memtable.len())
            .field("sstables", &self.view.tables.len())
            .finish()
    }
}

/// Options for reads and cursors
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Whether SSTable values read should be remembered in the cache
    pub fill_cache: bool,
    /// Read as of this snapshot instead of the live store
    pub snapshot: Option<Snapshot>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            fill_cache: true,
            snapshot: None,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_cache(mut self, yes: bool) -> Self {
        self.fill_cache = yes;
        self
    }

    pub fn snapshot(mut self, snapshot: &Snapshot) -> Self {
        self.snapshot = Some(snapshot.clone());
        self
    }
}
