//! Range Scanner
//!
//! Lazy traversal of the key space from a start bound in either direction.
//!
//! Cursor seeks land on the first key >= the target. Going backward we want
//! the last key <= the target instead, so after the seek:
//! - no key >= start exists: reposition at the last key
//! - exclusive start and the cursor is not on the start key itself: step
//!   back once
//!
//! An inclusive backward scan whose start key is absent begins at the next
//! larger key. Callers rely on that behavior.

use crate::cursor::Cursor;
use crate::engine::Engine;
use crate::error::Result;
use crate::snapshot::ReadOptions;

use super::{Direction, Record, ScanBound};

/// Iterator of records starting at a bound
///
/// Reads never populate the value cache. The first read error is yielded and
/// ends the sequence.
pub struct RangeScanner {
    cursor: Cursor,
    start: ScanBound,
    direction: Direction,
    /// Cursor is on a record that has not been yielded yet
    positioned: bool,
    first: bool,
    done: bool,
}

impl RangeScanner {
    /// Open a scanner over the live store
    pub fn new(engine: &Engine, start: ScanBound, direction: Direction) -> Self {
        Self::with_cursor(engine.iter(ReadOptions::new().fill_cache(false)), start, direction)
    }

    /// Scan with an already opened cursor
    pub fn with_cursor(cursor: Cursor, start: ScanBound, direction: Direction) -> Self {
        Self {
            cursor,
            start,
            direction,
            positioned: false,
            first: true,
            done: false,
        }
    }

    fn position(&mut self) -> Result<()> {
        let backward = self.direction == Direction::Backward;

        if self.start.key.is_empty() {
            if backward {
                self.cursor.seek_to_last()?;
            } else {
                self.cursor.seek_to_first()?;
            }
        } else {
            self.cursor.seek(&self.start.key)?;
        }

        if backward {
            if !self.cursor.valid() {
                self.cursor.seek_to_last()?;
            } else if !self.start.inclusive && self.cursor.key() != Some(self.start.key.as_slice()) {
                self.cursor.prev()?;
            }
        }

        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        match self.direction {
            Direction::Forward => self.cursor.next(),
            Direction::Backward => self.cursor.prev(),
        }
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        if self.positioned {
            self.step()?;
        } else {
            self.position()?;
            self.positioned = true;
        }

        if self.first {
            self.first = false;
            if !self.start.inclusive && self.cursor.key() == Some(self.start.key.as_slice()) {
                self.step()?;
            }
        }

        Ok(self.cursor.record())
    }
}

impl Iterator for RangeScanner {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
