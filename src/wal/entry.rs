//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Several puts/deletes that must be replayed together or not at all
    Batch { ops: Vec<Operation> },
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as `[LSN (8)][CRC (4)][Len (4)][Data]`, all little-endian
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        let len = u32::try_from(data.len())
            .map_err(|_| KvError::WalWrite(format!("entry too large: {} bytes", data.len())))?;
        let crc = crc32fast::hash(&data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Decode one entry from the front of `bytes`, verifying its CRC
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::read_header(bytes)?;

        let end = HEADER_SIZE + len;
        if bytes.len() < end {
            return Err(KvError::WalCorruption(format!(
                "entry truncated: need {} bytes, have {}",
                end,
                bytes.len()
            )));
        }

        let data = &bytes[HEADER_SIZE..end];
        let actual = crc32fast::hash(data);
        if actual != crc {
            return Err(KvError::WalCorruption(format!(
                "CRC mismatch at lsn {}: expected {:#010x}, got {:#010x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| KvError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != lsn {
            return Err(KvError::WalCorruption(format!(
                "LSN mismatch: header says {}, body says {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// Parse the fixed header, returning (lsn, crc, data length)
    pub(crate) fn read_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(KvError::WalCorruption(format!(
                "header truncated: {} bytes",
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Ok((
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len) as usize,
        ))
    }

    /// Total encoded size of an entry whose header is at the front of `bytes`
    pub(crate) fn framed_len(bytes: &[u8]) -> Result<usize> {
        let (_, _, len) = Self::read_header(bytes)?;
        Ok(HEADER_SIZE + len)
    }
}
