//! Error types for RangeKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for RangeKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Store already exists at {}", .0.display())]
    DestinationExists(PathBuf),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("bad write batch")]
    BadBatch,

    #[error("Bad request: {0}")]
    BadRequest(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Request handling faults
    // -------------------------------------------------------------------------
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl From<bincode::Error> for KvError {
    fn from(err: bincode::Error) -> Self {
        KvError::Serialization(err.to_string())
    }
}

impl KvError {
    /// Whether the error is the caller's fault rather than the store's
    pub fn is_client_error(&self) -> bool {
        matches!(self, KvError::BadBatch | KvError::BadRequest(_))
    }
}
