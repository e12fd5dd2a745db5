//! Batch Applier
//!
//! Validates a list of operations and commits them as one atomic write.
//! Nothing is written unless every operation is well formed.

use serde::Deserialize;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::write_batch::WriteBatch;

/// An operation as it arrives in a request body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOperation {
    pub op: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl RawOperation {
    pub fn new(op: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A validated batch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl TryFrom<RawOperation> for BatchOperation {
    type Error = KvError;

    fn try_from(raw: RawOperation) -> Result<Self> {
        match raw.op.as_str() {
            "put" => Ok(BatchOperation::Put {
                key: raw.key.into_bytes(),
                value: raw.value.into_bytes(),
            }),
            "delete" => Ok(BatchOperation::Delete {
                key: raw.key.into_bytes(),
            }),
            _ => Err(KvError::BadBatch),
        }
    }
}

/// Validate and atomically apply request operations
///
/// Fails with [`KvError::BadBatch`] before touching the store if any
/// operation has an unknown kind.
pub fn apply(engine: &Engine, ops: Vec<RawOperation>) -> Result<()> {
    let ops = ops
        .into_iter()
        .map(BatchOperation::try_from)
        .collect::<Result<Vec<_>>>()?;

    apply_operations(engine, ops)
}

/// Atomically apply already validated operations
pub fn apply_operations(engine: &Engine, ops: Vec<BatchOperation>) -> Result<()> {
    let mut batch = WriteBatch::new();
    for op in ops {
        match op {
            BatchOperation::Put { key, value } => batch.put(key, value),
            BatchOperation::Delete { key } => batch.delete(key),
        };
    }

    tracing::debug!("Applying batch of {} operations", batch.len());
    engine.write(batch)
}
