//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Clean and empty logs recover without changes
//! - A torn tail is cut off on recover but left alone on verify
//! - Corrupt entries in the middle are skipped and counted

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use rangekv::config::WalSyncStrategy;
use rangekv::wal::{Operation, RecoveryResult, WalEntry, WalRecovery, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    (temp_dir, wal_path)
}

fn put(i: u64) -> Operation {
    Operation::Put {
        key: format!("key{}", i).into_bytes(),
        value: format!("value{}", i).into_bytes(),
    }
}

fn write_entries(path: &PathBuf, count: u64) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer.append(put(i)).unwrap();
    }
}

fn append_bytes(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Clean Logs
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result, RecoveryResult::default());
}

#[test]
fn test_recover_clean_log() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 4);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3].operation, put(3));
    assert_eq!(result.entries_recovered, 4);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 4);
    assert!(!result.was_truncated);
}

// =============================================================================
// Torn Tail
// =============================================================================

#[test]
fn test_recover_truncates_partial_write() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    // Half of a third entry
    let next = WalEntry::new(3, put(2)).serialize().unwrap();
    append_bytes(&wal_path, &next[..next.len() / 2]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);

    // A second pass finds nothing left to cut
    let (_, again) = WalRecovery::recover(&wal_path).unwrap();
    assert!(!again.was_truncated);
}

#[test]
fn test_verify_reports_without_modifying() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 3);
    append_bytes(&wal_path, &[0xAA; 5]);
    let len = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.last_lsn, 3);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len);
}

// =============================================================================
// Corrupt Entries
// =============================================================================

#[test]
fn test_recover_skips_corrupt_middle_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut file = File::create(&wal_path).unwrap();
    for lsn in 1..=3 {
        let mut bytes = WalEntry::new(lsn, put(lsn)).serialize().unwrap();
        if lsn == 2 {
            if let Some(byte) = bytes.last_mut() {
                *byte ^= 0xFF;
            }
        }
        file.write_all(&bytes).unwrap();
    }
    drop(file);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    let lsns: Vec<u64> = entries.iter().map(|e| e.lsn).collect();
    assert_eq!(lsns, vec![1, 3]);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 3);
    assert!(!result.was_truncated);
}

#[test]
fn test_batch_is_recovered_whole() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer
            .append(Operation::Batch {
                ops: vec![put(1), put(2), put(3)],
            })
            .unwrap();
    }

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(matches!(&entries[0].operation, Operation::Batch { ops } if ops.len() == 3));
}
