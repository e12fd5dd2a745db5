//! Cursor
//!
//! Directional cursor over a read view. The cursor remembers its current
//! record; stepping asks the view for the nearest live key strictly after
//! (or before) it, so deletes and overwrites across memtable and tables
//! resolve newest-wins at every step.

use std::ops::Bound;
use std::sync::Arc;

use crate::error::Result;
use crate::snapshot::ReadView;

/// Ordered cursor with seek/step in both directions
///
/// A cursor starts out invalid; position it with one of the seek methods.
/// Stepping an invalid cursor leaves it invalid. A read error invalidates
/// the cursor and is returned to the caller.
pub struct Cursor {
    view: Arc<ReadView>,
    fill_cache: bool,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl Cursor {
    pub(crate) fn new(view: Arc<ReadView>, fill_cache: bool) -> Self {
        Self {
            view,
            fill_cache,
            current: None,
        }
    }

    /// Position at the smallest key
    pub fn seek_to_first(&mut self) -> Result<()> {
        let found = self.view.first_from(Bound::Unbounded, self.fill_cache);
        self.settle(found)
    }

    /// Position at the largest key
    pub fn seek_to_last(&mut self) -> Result<()> {
        let found = self.view.last_until(Bound::Unbounded, self.fill_cache);
        self.settle(found)
    }

    /// Position at the first key >= `key` (invalid if there is none)
    pub fn seek(&mut self, key: &[u8]) -> Result<()> {
        let found = self.view.first_from(Bound::Included(key), self.fill_cache);
        self.settle(found)
    }

    /// Step to the next larger key
    pub fn next(&mut self) -> Result<()> {
        let Some((key, _)) = self.current.take() else {
            return Ok(());
        };
        let found = self.view.first_from(Bound::Excluded(&key), self.fill_cache);
        self.settle(found)
    }

    /// Step to the next smaller key
    pub fn prev(&mut self) -> Result<()> {
        let Some((key, _)) = self.current.take() else {
            return Ok(());
        };
        let found = self.view.last_until(Bound::Excluded(&key), self.fill_cache);
        self.settle(found)
    }

    /// Whether the cursor is positioned at a record
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Key at the current position
    pub fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(k, _)| k.as_slice())
    }

    /// Value at the current position
    pub fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, v)| v.as_slice())
    }

    /// Take the current record, leaving the position unchanged
    pub fn record(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.current.clone()
    }

    fn settle(&mut self, found: Result<Option<(Vec<u8>, Vec<u8>)>>) -> Result<()> {
        match found {
            Ok(record) => {
                self.current = record;
                Ok(())
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }
}
