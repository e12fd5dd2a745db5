//! Configuration for RangeKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a RangeKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (WAL, SSTables, etc.)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── sstables/        (SSTable files)
    pub data_dir: PathBuf,

    /// Refuse to open if a store already exists in `data_dir`
    pub error_if_exists: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Max number of SSTable values kept in the read cache (0 disables it)
    pub cache_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Listen addresses: `host:port` for TCP, anything else is a unix socket path
    pub listen_addrs: Vec<String>,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./rangekv_data"),
            error_if_exists: false,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
            cache_capacity: 8192,
            listen_addrs: vec!["127.0.0.1:7000".to_string()],
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the engine or server misbehave
    pub fn validate(&self) -> Result<()> {
        if self.memtable_size_limit == 0 {
            return Err(KvError::Config(
                "memtable_size_limit must be greater than zero".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(KvError::Config(
                "WAL sync interval must be at least one entry".to_string(),
            ));
        }
        if self.listen_addrs.iter().any(|addr| addr.is_empty()) {
            return Err(KvError::Config("empty listen address".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Fail to open when a store is already present in the data directory
    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.config.error_if_exists = yes;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the value cache capacity (in entries)
    pub fn cache_capacity(mut self, entries: usize) -> Self {
        self.config.cache_capacity = entries;
        self
    }

    /// Replace the listen addresses
    pub fn listen_addrs<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.listen_addrs = addrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
