//! Tests for WAL entry framing
//!
//! These tests verify:
//! - Every operation kind survives encoding, including nested batches
//! - Corruption anywhere in the frame is reported as WalCorruption
//! - Truncated frames are rejected

use rangekv::wal::{Operation, WalEntry, HEADER_SIZE};
use rangekv::KvError;

fn put(key: &[u8], value: &[u8]) -> Operation {
    Operation::Put {
        key: key.to_vec(),
        value: value.to_vec(),
    }
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_put_and_delete_survive_encoding() {
    for operation in [put(b"hello", b"world"), Operation::Delete { key: b"gone".to_vec() }] {
        let entry = WalEntry::new(7, operation);
        let bytes = entry.serialize().unwrap();
        assert_eq!(WalEntry::deserialize(&bytes).unwrap(), entry);
    }
}

#[test]
fn test_batch_keeps_operation_order() {
    let entry = WalEntry::new(
        3,
        Operation::Batch {
            ops: vec![
                put(b"a", b"1"),
                Operation::Delete { key: b"a".to_vec() },
                put(b"a", b"2"),
            ],
        },
    );

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();
    let Operation::Batch { ops } = recovered.operation else {
        panic!("expected a batch");
    };
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[2], put(b"a", b"2"));
}

#[test]
fn test_header_layout() {
    let entry = WalEntry::new(0x0102_0304, put(b"k", b""));
    let bytes = entry.serialize().unwrap();

    assert_eq!(&bytes[0..8], &0x0102_0304u64.to_le_bytes());
    let len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    assert_eq!(bytes.len(), HEADER_SIZE + len);
}

#[test]
fn test_binary_keys_and_large_values() {
    let value = vec![0xAB; 512 * 1024];
    let entry = WalEntry::new(u64::MAX, put(&[0x00, 0xFF, 0x80], &value));

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();
    assert_eq!(recovered.lsn, u64::MAX);
    assert_eq!(recovered.operation, put(&[0x00, 0xFF, 0x80], &value));
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_flipped_payload_byte_is_detected() {
    let mut bytes = WalEntry::new(1, put(b"key", b"value")).serialize().unwrap();
    if let Some(byte) = bytes.last_mut() {
        *byte ^= 0xFF;
    }

    assert!(matches!(
        WalEntry::deserialize(&bytes),
        Err(KvError::WalCorruption(_))
    ));
}

#[test]
fn test_flipped_crc_is_detected() {
    let mut bytes = WalEntry::new(1, put(b"key", b"value")).serialize().unwrap();
    bytes[9] ^= 0x01;

    assert!(matches!(
        WalEntry::deserialize(&bytes),
        Err(KvError::WalCorruption(_))
    ));
}

#[test]
fn test_header_lsn_must_match_body() {
    let mut bytes = WalEntry::new(5, put(b"key", b"value")).serialize().unwrap();
    bytes[0] = 6;

    assert!(matches!(
        WalEntry::deserialize(&bytes),
        Err(KvError::WalCorruption(_))
    ));
}

// =============================================================================
// Truncation
// =============================================================================

#[test]
fn test_truncated_frames_are_rejected() {
    let bytes = WalEntry::new(1, Operation::Delete { key: b"key".to_vec() })
        .serialize()
        .unwrap();

    for cut in [0, 10, HEADER_SIZE, HEADER_SIZE + 2, bytes.len() - 1] {
        assert!(
            WalEntry::deserialize(&bytes[..cut]).is_err(),
            "frame cut at {} decoded",
            cut
        );
    }
}
