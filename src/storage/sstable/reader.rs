//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{KvError, Result};

use super::iterator::SSTableIterator;
use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
///
/// Shared between threads behind an `Arc`; the file handle sits behind a
/// mutex so lookups take `&self`.
pub struct SSTableReader {
    id: u64,
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// key → file offset of its entry
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
    index_offset: u64,
    file_size: u64,
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Validates header, footer and data checksum, then loads the entire
    /// index into memory.
    pub fn open(path: &Path, id: u64) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(KvError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(KvError::Storage(format!(
                "Invalid SSTable magic: expected RKV1, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(KvError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = le_u64(&header[6..14]);

        file.seek(SeekFrom::Start(file_size - FOOTER_SIZE))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = le_u64(&footer[0..8]);
        let data_crc = le_u32(&footer[8..12]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(KvError::Storage(format!(
                "SSTable {} has bad index offset {}",
                path.display(),
                index_offset
            )));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut data = vec![0u8; (index_offset - HEADER_SIZE) as usize];
        file.read_exact(&mut data)?;
        if crc32fast::hash(&data) != data_crc {
            return Err(KvError::Storage(format!(
                "SSTable {} data checksum mismatch",
                path.display()
            )));
        }
        drop(data);

        // Index block: [key_len(4)][offset(8)][key] ...
        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.read_exact(&mut index_data)?;

        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < index_data.len() {
            if pos + 12 > index_data.len() {
                return Err(KvError::Storage("truncated SSTable index entry".to_string()));
            }
            let key_len = le_u32(&index_data[pos..]) as usize;
            let offset = le_u64(&index_data[pos + 4..]);
            pos += 12;

            if pos + key_len > index_data.len() {
                return Err(KvError::Storage("truncated SSTable index key".to_string()));
            }
            index.insert(index_data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }

        if index.len() as u64 != entry_count {
            return Err(KvError::Storage(format!(
                "SSTable {} index has {} keys, header says {}",
                path.display(),
                index.len(),
                entry_count
            )));
        }

        Ok(Self {
            id,
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
            index_offset,
            file_size,
        })
    }

    /// Get a value by key, O(log n) lookup via in-memory index
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key found but is a tombstone (deleted)
    /// - `Err(KeyNotFound)`: key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.index.get(key) {
            Some(&offset) => self.read_value_at(offset),
            None => Err(KvError::KeyNotFound),
        }
    }

    /// Offset of `key`'s entry if this table holds it (value or tombstone)
    pub fn offset_of(&self, key: &[u8]) -> Option<u64> {
        self.index.get(key).copied()
    }

    /// Read the value of the entry starting at `offset` (None = tombstone)
    pub fn read_value_at(&self, offset: u64) -> Result<Option<Vec<u8>>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let key_len = le_u32(&header[0..4]);
        let val_len = le_u32(&header[4..8]);

        file.seek_relative(i64::from(key_len))?;

        if val_len == TOMBSTONE_MARKER {
            return Ok(None);
        }

        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;
        Ok(Some(value))
    }

    /// Smallest indexed key satisfying `lower`, with its entry offset
    pub fn first_from(&self, lower: Bound<&[u8]>) -> Option<(&[u8], u64)> {
        self.index
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, &off)| (k.as_slice(), off))
    }

    /// Largest indexed key satisfying `upper`, with its entry offset
    pub fn last_until(&self, upper: Bound<&[u8]>) -> Option<(&[u8], u64)> {
        self.index
            .range::<[u8], _>((Bound::Unbounded, upper))
            .next_back()
            .map(|(k, &off)| (k.as_slice(), off))
    }

    /// Table id (monotonic, higher is newer)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Size of the backing file in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get the minimum key in this SSTable (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Get the maximum key in this SSTable (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false, // Empty SSTable
        }
    }

    /// Sequential pass over every entry using a separate file handle
    pub fn iter(&self) -> Result<SSTableIterator> {
        SSTableIterator::open(&self.path, self.index_offset)
    }
}
