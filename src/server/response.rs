//! HTTP response types for the server.

use serde::Serialize;

use crate::ops::{Entry, ScanResult};

/// A single entry in an iterate response: an object with the value, or
/// just the key string.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IterateEntry {
    Pair { key: String, value: String },
    Key(String),
}

impl From<Entry> for IterateEntry {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Pair { key, value } => IterateEntry::Pair {
                key: String::from_utf8_lossy(&key).into_owned(),
                value: String::from_utf8_lossy(&value).into_owned(),
            },
            Entry::Key(key) => IterateEntry::Key(String::from_utf8_lossy(&key).into_owned()),
        }
    }
}

/// Response for `GET /iterate`.
#[derive(Debug, Serialize)]
pub struct IterateResponse {
    pub more: bool,
    pub data: Vec<IterateEntry>,
}

impl From<ScanResult> for IterateResponse {
    fn from(result: ScanResult) -> Self {
        Self {
            more: result.more,
            data: result.data.into_iter().map(IterateEntry::from).collect(),
        }
    }
}
