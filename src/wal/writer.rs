//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{KvError, Result};
use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN that the next appended entry receives
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// Appends after any existing entries; LSNs continue from the last
    /// valid one found in the file.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: last_lsn + 1,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an operation to the WAL, returning the LSN it was given
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.current_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer
            .write_all(&bytes)
            .and_then(|_| self.writer.flush())
            .map_err(|e| KvError::WalWrite(format!("append lsn {}: {}", lsn, e)))?;

        self.current_lsn += 1;
        self.unsynced += 1;

        let sync_now = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if sync_now {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (called once they are durable elsewhere)
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
