//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs;
use std::path::Path;

use crate::error::{KvError, Result};
use super::entry::{WalEntry, HEADER_SIZE};

/// What the reader found at the current position
#[derive(Debug)]
pub(crate) enum Frame {
    /// A well-formed entry
    Entry(WalEntry),

    /// A complete frame whose checksum or body is bad
    Corrupt { offset: u64, reason: String },

    /// A partial frame at the end of the file (interrupted write)
    Torn { offset: u64 },
}

/// Reads entries from the WAL file
///
/// The log is read into memory on open; it is bounded by the memtable
/// size limit because the engine truncates it after every flush.
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self { data, position: 0 })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file and an error for a corrupt
    /// or torn frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame() {
            None => Ok(None),
            Some(Frame::Entry(entry)) => Ok(Some(entry)),
            Some(Frame::Corrupt { offset, reason }) => Err(KvError::WalCorruption(format!(
                "at offset {}: {}",
                offset, reason
            ))),
            Some(Frame::Torn { offset }) => Err(KvError::WalCorruption(format!(
                "partial entry at offset {}",
                offset
            ))),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            failed: false,
        }
    }

    /// Byte offset of the next unread frame
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Classify the frame at the current position and advance past it
    pub(crate) fn next_frame(&mut self) -> Option<Frame> {
        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return None;
        }

        let offset = self.position as u64;
        if remaining.len() < HEADER_SIZE {
            self.position = self.data.len();
            return Some(Frame::Torn { offset });
        }

        let frame_len = match WalEntry::framed_len(remaining) {
            Ok(len) => len,
            Err(_) => {
                self.position = self.data.len();
                return Some(Frame::Torn { offset });
            }
        };

        if remaining.len() < frame_len {
            self.position = self.data.len();
            return Some(Frame::Torn { offset });
        }

        let frame = &remaining[..frame_len];
        self.position += frame_len;

        match WalEntry::deserialize(frame) {
            Ok(entry) => Some(Frame::Entry(entry)),
            Err(e) => Some(Frame::Corrupt {
                offset,
                reason: e.to_string(),
            }),
        }
    }
}

/// Iterator over WAL entries
///
/// Yields the first error it meets and then stops.
pub struct WalIterator {
    reader: WalReader,
    failed: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
