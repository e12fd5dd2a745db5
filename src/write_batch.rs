//! Write Batch
//!
//! An ordered set of puts and deletes committed as one atomic unit by
//! [`Engine::write`](crate::Engine::write). Later operations on the same
//! key win.

use crate::wal::Operation;

/// Ordered list of pending puts/deletes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<Operation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(Operation::Put {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queue a delete
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(Operation::Delete { key: key.into() });
        self
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.ops
    }
}
