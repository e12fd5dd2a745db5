//! Tests for Cursor
//!
//! These tests verify:
//! - Seek and step in both directions
//! - Merging of memtable and SSTables, newest wins
//! - Tombstones are skipped wherever they live
//! - Cursors read a fixed view of the store

use rangekv::config::Config;
use rangekv::engine::Engine;
use rangekv::{Cursor, ReadOptions};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(Config::builder().data_dir(temp_dir.path()).build()).unwrap();
    (temp_dir, engine)
}

fn key(cursor: &Cursor) -> Option<String> {
    cursor.key().map(|k| String::from_utf8(k.to_vec()).unwrap())
}

fn forward(engine: &Engine) -> Vec<(String, String)> {
    let mut cursor = engine.iter(ReadOptions::new());
    let mut out = Vec::new();
    cursor.seek_to_first().unwrap();
    while let Some((k, v)) = cursor.record() {
        out.push((String::from_utf8(k).unwrap(), String::from_utf8(v).unwrap()));
        cursor.next().unwrap();
    }
    out
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Positioning
// =============================================================================

#[test]
fn test_new_cursor_is_invalid() {
    let (_temp, engine) = setup();
    engine.put(b"a", b"1").unwrap();

    let mut cursor = engine.iter(ReadOptions::new());
    assert!(!cursor.valid());
    assert_eq!(cursor.key(), None);
    assert_eq!(cursor.value(), None);

    // Stepping an unpositioned cursor does nothing
    cursor.next().unwrap();
    cursor.prev().unwrap();
    assert!(!cursor.valid());
}

#[test]
fn test_empty_store() {
    let (_temp, engine) = setup();
    let mut cursor = engine.iter(ReadOptions::new());

    cursor.seek_to_first().unwrap();
    assert!(!cursor.valid());
    cursor.seek_to_last().unwrap();
    assert!(!cursor.valid());
    cursor.seek(b"a").unwrap();
    assert!(!cursor.valid());
}

#[test]
fn test_seek_lands_on_first_key_at_or_after() {
    let (_temp, engine) = setup();
    for k in ["b", "d", "f"] {
        engine.put(k.as_bytes(), b"v").unwrap();
    }
    let mut cursor = engine.iter(ReadOptions::new());

    cursor.seek(b"d").unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("d"));

    cursor.seek(b"c").unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("d"));

    cursor.seek(b"a").unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("b"));

    cursor.seek(b"g").unwrap();
    assert!(!cursor.valid());
}

#[test]
fn test_walk_both_directions() {
    let (_temp, engine) = setup();
    for k in ["a", "b", "c"] {
        engine.put(k.as_bytes(), k.to_uppercase().as_bytes()).unwrap();
    }
    let mut cursor = engine.iter(ReadOptions::new());

    cursor.seek_to_last().unwrap();
    assert_eq!(cursor.value(), Some(&b"C"[..]));
    cursor.prev().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("b"));
    cursor.next().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("c"));
    cursor.next().unwrap();
    assert!(!cursor.valid());

    cursor.seek_to_first().unwrap();
    cursor.prev().unwrap();
    assert!(!cursor.valid());
}

// =============================================================================
// Merging
// =============================================================================

#[test]
fn test_merges_memtable_and_tables() {
    let (_temp, engine) = setup();

    engine.put(b"a", b"t1").unwrap();
    engine.put(b"c", b"t1").unwrap();
    engine.put(b"e", b"t1").unwrap();
    engine.flush().unwrap();

    engine.put(b"b", b"t2").unwrap();
    engine.put(b"c", b"t2").unwrap();
    engine.flush().unwrap();

    engine.put(b"d", b"mem").unwrap();
    engine.put(b"e", b"mem").unwrap();

    assert_eq!(
        forward(&engine),
        pairs(&[("a", "t1"), ("b", "t2"), ("c", "t2"), ("d", "mem"), ("e", "mem")])
    );
}

#[test]
fn test_skips_tombstones_in_every_layer() {
    let (_temp, engine) = setup();

    for k in ["a", "b", "c", "d", "e"] {
        engine.put(k.as_bytes(), b"v").unwrap();
    }
    engine.flush().unwrap();

    // Tombstones in a newer table
    engine.delete(b"b").unwrap();
    engine.delete(b"c").unwrap();
    engine.flush().unwrap();

    // Tombstone in the memtable, and a revived key
    engine.delete(b"e").unwrap();
    engine.put(b"c", b"back").unwrap();

    assert_eq!(forward(&engine), pairs(&[("a", "v"), ("c", "back"), ("d", "v")]));

    let mut cursor = engine.iter(ReadOptions::new());
    cursor.seek_to_last().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("d"));
    cursor.prev().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("c"));
    cursor.prev().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("a"));

    cursor.seek(b"b").unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("c"));
}

// =============================================================================
// Isolation
// =============================================================================

#[test]
fn test_cursor_does_not_see_later_writes() {
    let (_temp, engine) = setup();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"b", b"2").unwrap();

    let mut cursor = engine.iter(ReadOptions::new());
    engine.delete(b"b").unwrap();
    engine.put(b"c", b"3").unwrap();
    engine.flush().unwrap();

    cursor.seek_to_first().unwrap();
    cursor.next().unwrap();
    assert_eq!(key(&cursor).as_deref(), Some("b"));
    cursor.next().unwrap();
    assert!(!cursor.valid());
}

#[test]
fn test_cursor_over_snapshot() {
    let (_temp, engine) = setup();
    engine.put(b"a", b"old").unwrap();
    let snapshot = engine.snapshot();
    engine.put(b"a", b"new").unwrap();

    let mut cursor = engine.iter(ReadOptions::new().snapshot(&snapshot));
    cursor.seek_to_first().unwrap();
    assert_eq!(cursor.value(), Some(&b"old"[..]));
}

#[test]
fn test_unfilled_cursor_leaves_cache_empty() {
    let (_temp, engine) = setup();
    for k in ["a", "b", "c"] {
        engine.put(k.as_bytes(), b"v").unwrap();
    }
    engine.flush().unwrap();

    let mut cursor = engine.iter(ReadOptions::new().fill_cache(false));
    cursor.seek_to_first().unwrap();
    while cursor.valid() {
        cursor.next().unwrap();
    }

    assert_eq!(engine.property("rangekv.cache-entries").as_deref(), Some("0"));
}
