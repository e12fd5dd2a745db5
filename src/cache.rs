//! Value Cache
//!
//! Bounded cache of values read from SSTables, keyed by (table id, entry
//! offset). Point reads populate it; ranged scans and snapshot exports read
//! with `fill_cache = false` so a single large pass does not evict the hot
//! set. Eviction is first-in first-out.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

type CacheKey = (u64, u64);

/// Cached entry: `None` records a tombstone
type CachedValue = Option<Vec<u8>>;

/// Bounded FIFO cache of SSTable values
pub struct ValueCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Default)]
struct CacheInner {
    map: HashMap<CacheKey, CachedValue>,
    order: VecDeque<CacheKey>,
}

impl ValueCache {
    /// Create a cache holding at most `capacity` entries (0 disables it)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a value; the outer `None` is a miss
    pub fn get(&self, table_id: u64, offset: u64) -> Option<CachedValue> {
        if self.capacity == 0 {
            return None;
        }

        let found = self.inner.lock().map.get(&(table_id, offset)).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Remember a value, evicting the oldest entry when full
    pub fn insert(&self, table_id: u64, offset: u64, value: CachedValue) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        let key = (table_id, offset);
        if inner.map.insert(key, value).is_none() {
            inner.order.push_back(key);
        }

        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
