//! Store Operations
//!
//! The request-level operations the service performs against an [`Engine`]:
//!
//! - [`scan`]: directional traversal from an arbitrary start key
//! - [`paginate`]: capped pages with a continuation flag
//! - [`batch`]: validated, atomic multi-key writes
//! - [`export`]: chunked point-in-time copy into a fresh store
//!
//! Every operation borrows the engine and runs synchronously on the calling
//! thread. Nothing here outlives the call that created it.
//!
//! [`Engine`]: crate::Engine

pub mod batch;
pub mod export;
pub mod paginate;
pub mod scan;

pub use batch::{apply, apply_operations, BatchOperation, RawOperation};
pub use export::{export, ExportStats, CHUNK_SIZE};
pub use paginate::paginate;
pub use scan::RangeScanner;

/// Hard ceiling on the number of entries in one page
pub const ABS_MAX: usize = 1000;

/// (key, value)
pub type Record = (Vec<u8>, Vec<u8>);

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// One end of a scan: a key plus whether that key itself is included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBound {
    pub key: Vec<u8>,
    pub inclusive: bool,
}

impl ScanBound {
    pub fn inclusive(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            inclusive: false,
        }
    }

    /// Inclusive empty key: the very first (or last) key of the store
    pub fn unbounded() -> Self {
        Self::inclusive(Vec::new())
    }
}

/// A page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub start: ScanBound,
    pub end: Option<ScanBound>,
    pub direction: Direction,
    /// Clamped to [`ABS_MAX`] when the page is produced
    pub max_count: usize,
    pub include_values: bool,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            start: ScanBound::unbounded(),
            end: None,
            direction: Direction::Forward,
            max_count: ABS_MAX,
            include_values: true,
        }
    }
}

/// One page entry: a record, or only its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Pair { key: Vec<u8>, value: Vec<u8> },
    Key(Vec<u8>),
}

impl Entry {
    pub fn key(&self) -> &[u8] {
        match self {
            Entry::Pair { key, .. } | Entry::Key(key) => key,
        }
    }
}

/// A page of entries in traversal order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    /// Set when the count cap cut the page short of the end bound
    pub more: bool,
    pub data: Vec<Entry>,
}
