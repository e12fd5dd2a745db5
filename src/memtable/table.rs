//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::MemTableEntry;

/// Shared, immutable view of the memtable contents at one instant
pub type FrozenMemTable = Arc<BTreeMap<Vec<u8>, MemTableEntry>>;

/// Fixed per-entry overhead used in size accounting
const ENTRY_OVERHEAD: usize = 16;

/// In-memory table for recent writes
///
/// The map lives behind an `Arc` so a read view can pin the current
/// contents without copying. The first write after a pin clones the map
/// (`Arc::make_mut`), leaving the pinned version untouched.
pub struct MemTable {
    data: RwLock<FrozenMemTable>,
    /// Approximate size in bytes (keys + values + overhead)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Arc::new(BTreeMap::new())),
            size: AtomicUsize::new(0),
        }
    }

    /// Get an entry by key (value or tombstone)
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(Arc::make_mut(&mut data), key, MemTableEntry::Value(value))
    }

    /// Delete a key (inserts tombstone), returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(Arc::make_mut(&mut data), key, MemTableEntry::Tombstone)
    }

    /// Apply several entries under one write lock
    ///
    /// Readers observe either none or all of them.
    pub fn apply<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (Vec<u8>, MemTableEntry)>,
    {
        let mut data = self.data.write();
        let map = Arc::make_mut(&mut data);
        let mut size = self.size.load(Ordering::SeqCst);
        for (key, entry) in entries {
            size = self.insert(map, key, entry);
        }
        size
    }

    /// Pin the current contents
    ///
    /// The first write after a freeze copies the whole map if the frozen
    /// handle is still alive, so long-lived views over a large memtable
    /// make writes O(memtable). Once every view is dropped writes go back
    /// to mutating in place.
    pub fn freeze(&self) -> FrozenMemTable {
        Arc::clone(&self.data.read())
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    /// Check whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> MemTableIterator {
        MemTableIterator::new(self.freeze())
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = Arc::new(BTreeMap::new());
        self.size.store(0, Ordering::SeqCst);
    }

    /// Insert into an already-locked map and update size accounting
    fn insert(
        &self,
        map: &mut BTreeMap<Vec<u8>, MemTableEntry>,
        key: Vec<u8>,
        entry: MemTableEntry,
    ) -> usize {
        let added = key.len() + entry.payload_len() + ENTRY_OVERHEAD;
        let removed = map
            .get(&key)
            .map(|old| key.len() + old.payload_len() + ENTRY_OVERHEAD)
            .unwrap_or(0);

        map.insert(key, entry);

        if added >= removed {
            self.size.fetch_add(added - removed, Ordering::SeqCst) + (added - removed)
        } else {
            self.size.fetch_sub(removed - added, Ordering::SeqCst) - (removed - added)
        }
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a pinned copy of the MemTable entries
pub struct MemTableIterator {
    data: FrozenMemTable,
    next_key: Option<Vec<u8>>,
    started: bool,
}

impl MemTableIterator {
    fn new(data: FrozenMemTable) -> Self {
        Self {
            data,
            next_key: None,
            started: false,
        }
    }
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        use std::ops::Bound;

        let lower = match (&self.next_key, self.started) {
            (_, false) => Bound::Unbounded,
            (Some(key), true) => Bound::Excluded(key.as_slice()),
            (None, true) => return None,
        };
        self.started = true;

        let found = self
            .data
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));

        self.next_key = found.as_ref().map(|(k, _)| k.clone());
        found
    }
}
