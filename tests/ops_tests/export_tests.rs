//! Tests for snapshot export
//!
//! These tests verify:
//! - Exported stores hold exactly the source records
//! - Chunk accounting for partial and exact final chunks
//! - Existing destinations are refused and left intact
//! - Exports read without filling the value cache

use std::path::Path;

use rangekv::config::Config;
use rangekv::engine::Engine;
use rangekv::ops::{export, ExportStats, CHUNK_SIZE};
use rangekv::{KvError, ReadOptions};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open(path: &Path) -> Engine {
    Engine::open(Config::builder().data_dir(path).build()).unwrap()
}

fn populate(engine: &Engine, count: usize) {
    for i in 0..count {
        engine
            .put(format!("key{:05}", i).as_bytes(), format!("value-{}", i).as_bytes())
            .unwrap();
    }
}

fn dump(engine: &Engine) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursor = engine.iter(ReadOptions::new());
    let mut out = Vec::new();
    cursor.seek_to_first().unwrap();
    while let Some(record) = cursor.record() {
        out.push(record);
        cursor.next().unwrap();
    }
    out
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_export_copies_every_record() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));

    populate(&source, 1500);
    source.flush().unwrap();
    source.delete(b"key00007").unwrap();
    source.put(&[0x00, 0xFF], &[0xFE, 0x00]).unwrap();

    let destination = temp_dir.path().join("copy");
    let stats = export(&source, &destination).unwrap();

    assert_eq!(stats, ExportStats { records: 1500, chunks: 2 });

    let copy = open(&destination);
    assert_eq!(dump(&copy), dump(&source));
    assert_eq!(copy.get(b"key00007").unwrap(), None);
}

#[test]
fn test_exact_multiple_has_no_trailing_chunk() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));
    populate(&source, CHUNK_SIZE * 2);

    let stats = export(&source, &temp_dir.path().join("copy")).unwrap();

    assert_eq!(stats, ExportStats { records: 2000, chunks: 2 });
}

#[test]
fn test_empty_store_exports_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));
    let destination = temp_dir.path().join("copy");

    let stats = export(&source, &destination).unwrap();

    assert_eq!(stats, ExportStats::default());
    assert!(Engine::exists(&destination));
    assert!(dump(&open(&destination)).is_empty());
}

#[test]
fn test_export_is_durable_without_wal_replay() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));
    populate(&source, 10);

    let destination = temp_dir.path().join("copy");
    export(&source, &destination).unwrap();

    // Closed destination: everything is in SSTables
    assert_eq!(
        std::fs::metadata(destination.join("wal.log")).unwrap().len(),
        0
    );
    assert_eq!(open(&destination).sstable_count(), 1);
}

// =============================================================================
// Existing Destination
// =============================================================================

#[test]
fn test_existing_destination_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));
    populate(&source, 5);

    let destination = temp_dir.path().join("copy");
    {
        let existing = open(&destination);
        existing.put(b"theirs", b"keep").unwrap();
        existing.close().unwrap();
    }
    let source_before = dump(&source);

    let result = export(&source, &destination);

    assert!(matches!(result, Err(KvError::DestinationExists(_))));
    assert_eq!(dump(&source), source_before);

    let existing = open(&destination);
    assert_eq!(dump(&existing), vec![(b"theirs".to_vec(), b"keep".to_vec())]);
}

#[test]
fn test_empty_destination_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));

    assert!(matches!(export(&source, Path::new("")), Err(KvError::Storage(_))));
}

// =============================================================================
// Read Behavior
// =============================================================================

#[test]
fn test_export_does_not_fill_cache() {
    let temp_dir = TempDir::new().unwrap();
    let source = open(&temp_dir.path().join("source"));
    populate(&source, 50);
    source.flush().unwrap();

    export(&source, &temp_dir.path().join("copy")).unwrap();

    assert_eq!(source.property("rangekv.cache-entries").as_deref(), Some("0"));
}
