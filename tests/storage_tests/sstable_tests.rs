//! SSTable Tests
//!
//! Tests verify:
//! - Builder output can be read back by key and sequentially
//! - Tombstones are stored and distinguished from absent keys
//! - Out-of-order keys are refused
//! - Damaged files are refused on open
//! - Bounded index lookups used by cursors

use std::fs;
use std::ops::Bound;
use std::path::PathBuf;

use rangekv::storage::{SSTableBuilder, SSTableReader};
use rangekv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn table_path(dir: &TempDir) -> PathBuf {
    dir.path().join("sstable_000001.sst")
}

/// Build a table from (key, Some(value) | None for tombstone)
fn build(path: &PathBuf, entries: &[(&str, Option<&str>)]) {
    let mut builder = SSTableBuilder::new(path).unwrap();
    for (key, value) in entries {
        match value {
            Some(v) => builder.add(key.as_bytes(), v.as_bytes()).unwrap(),
            None => builder.add_tombstone(key.as_bytes()).unwrap(),
        }
    }
    builder.finish().unwrap();
}

// =============================================================================
// Build and Read
// =============================================================================

#[test]
fn test_build_and_point_lookup() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let mut builder = SSTableBuilder::new(&path).unwrap();
    builder.add(b"apple", b"red").unwrap();
    builder.add_tombstone(b"banana").unwrap();
    builder.add(b"cherry", b"").unwrap();
    let meta = builder.finish().unwrap();

    assert_eq!(meta.entry_count(), 3);
    assert_eq!(meta.min_key, b"apple");
    assert_eq!(meta.max_key, b"cherry");
    assert_eq!(meta.file_size, fs::metadata(&path).unwrap().len());
    assert!(meta.might_contain(b"b"));
    assert!(!meta.might_contain(b"zebra"));

    let reader = SSTableReader::open(&path, 1).unwrap();
    assert_eq!(reader.id(), 1);
    assert_eq!(reader.entry_count(), 3);
    assert_eq!(reader.get(b"apple").unwrap(), Some(b"red".to_vec()));
    assert_eq!(reader.get(b"banana").unwrap(), None);
    assert_eq!(reader.get(b"cherry").unwrap(), Some(Vec::new()));
    assert!(matches!(reader.get(b"durian"), Err(KvError::KeyNotFound)));
}

#[test]
fn test_sequential_iteration() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    build(&path, &[("a", Some("1")), ("b", None), ("c", Some("3"))]);

    let reader = SSTableReader::open(&path, 1).unwrap();
    let entries: Vec<_> = reader.iter().unwrap().map(|e| e.unwrap()).collect();

    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), Some(b"1".to_vec())),
            (b"b".to_vec(), None),
            (b"c".to_vec(), Some(b"3".to_vec())),
        ]
    );
}

#[test]
fn test_empty_table() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    build(&path, &[]);

    let reader = SSTableReader::open(&path, 1).unwrap();
    assert_eq!(reader.entry_count(), 0);
    assert_eq!(reader.min_key(), None);
    assert!(!reader.might_contain(b""));
    assert_eq!(reader.iter().unwrap().count(), 0);
}

#[test]
fn test_reads_from_many_threads() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let keys: Vec<String> = (0..500).map(|i| format!("key{:04}", i)).collect();
    let mut builder = SSTableBuilder::new(&path).unwrap();
    for key in &keys {
        builder.add(key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
    }
    builder.finish().unwrap();

    let reader = std::sync::Arc::new(SSTableReader::open(&path, 1).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let reader = std::sync::Arc::clone(&reader);
            let keys = keys.clone();
            std::thread::spawn(move || {
                for key in keys.iter().skip(t).step_by(4) {
                    let value = reader.get(key.as_bytes()).unwrap();
                    assert_eq!(value, Some(key.to_uppercase().into_bytes()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// =============================================================================
// Builder Validation
// =============================================================================

#[test]
fn test_builder_refuses_unsorted_or_duplicate_keys() {
    let dir = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::new(&table_path(&dir)).unwrap();

    builder.add(b"m", b"1").unwrap();
    assert!(matches!(builder.add(b"a", b"2"), Err(KvError::Storage(_))));
    assert!(matches!(builder.add_tombstone(b"m"), Err(KvError::Storage(_))));
    builder.add(b"n", b"3").unwrap();
}

// =============================================================================
// Damaged Files
// =============================================================================

#[test]
fn test_open_rejects_bad_magic() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    build(&path, &[("a", Some("1"))]);

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path, 1), Err(KvError::Storage(_))));
}

#[test]
fn test_open_rejects_flipped_data_byte() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    build(&path, &[("key", Some("value"))]);

    // First value byte: header (14) + lengths (8) + key (3)
    let mut bytes = fs::read(&path).unwrap();
    bytes[25] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path, 1), Err(KvError::Storage(_))));
}

#[test]
fn test_open_rejects_short_file() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    fs::write(&path, b"RKV1").unwrap();

    assert!(SSTableReader::open(&path, 1).is_err());
}

// =============================================================================
// Bounded Lookups
// =============================================================================

#[test]
fn test_first_from_and_last_until() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    build(&path, &[("b", Some("1")), ("d", None), ("f", Some("3"))]);
    let reader = SSTableReader::open(&path, 1).unwrap();

    let first = |b: Bound<&[u8]>| reader.first_from(b).map(|(k, _)| k.to_vec());
    let last = |b: Bound<&[u8]>| reader.last_until(b).map(|(k, _)| k.to_vec());

    assert_eq!(first(Bound::Unbounded), Some(b"b".to_vec()));
    assert_eq!(first(Bound::Included(b"d")), Some(b"d".to_vec()));
    assert_eq!(first(Bound::Excluded(b"d")), Some(b"f".to_vec()));
    assert_eq!(first(Bound::Excluded(b"f")), None);

    assert_eq!(last(Bound::Unbounded), Some(b"f".to_vec()));
    assert_eq!(last(Bound::Included(b"c")), Some(b"b".to_vec()));
    assert_eq!(last(Bound::Excluded(b"b")), None);

    // Tombstones are indexed; reading one gives None
    let (_, offset) = reader.first_from(Bound::Included(b"c")).unwrap();
    assert_eq!(reader.read_value_at(offset).unwrap(), None);
    assert_eq!(reader.offset_of(b"d"), Some(offset));
}
