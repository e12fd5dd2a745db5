//! SSTable Iterator
//!
//! Sequential iteration over all entries in an SSTable.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

use super::{HEADER_SIZE, TOMBSTONE_MARKER};

/// Iterator over SSTable entries in sorted key order
pub struct SSTableIterator {
    file: BufReader<File>,
    /// Start of the index block; reading stops here
    end_offset: u64,
    current_offset: u64,
    /// Set after the first I/O error so iteration ends
    done: bool,
}

impl SSTableIterator {
    pub(super) fn open(path: &Path, end_offset: u64) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        Ok(Self {
            file,
            end_offset,
            current_offset: HEADER_SIZE,
            done: false,
        })
    }

    fn read_entry(&mut self) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;

        let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let val_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let mut key = vec![0u8; key_len];
        self.file.read_exact(&mut key)?;
        self.current_offset += 8 + key_len as u64;

        if val_len == TOMBSTONE_MARKER {
            return Ok((key, None));
        }

        let mut value = vec![0u8; val_len as usize];
        self.file.read_exact(&mut value)?;
        self.current_offset += u64::from(val_len);
        Ok((key, Some(value)))
    }
}

impl Iterator for SSTableIterator {
    /// (key, Option<value>): None value means tombstone
    type Item = Result<(Vec<u8>, Option<Vec<u8>>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.current_offset >= self.end_offset {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_err() {
            self.done = true;
        }
        Some(entry)
    }
}
