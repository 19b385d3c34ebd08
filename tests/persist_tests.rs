//! Tests for peer directory persistence
//!
//! Storage layout, triple-redundant records with majority recovery,
//! legacy import and write fault handling.

mod common;

use common::{addr, STORAGE_LEN};
use sensor_radio::hal::sim::{RamStorage, RamStorageError};
use sensor_radio::radio::persist::{self, decode_record, encode_record, PersistError, RecordRead, RECORD_LEN};
use sensor_radio::radio::PeerDirectory;

fn record_offset(index: usize) -> usize {
    STORAGE_LEN - 8 - RECORD_LEN * (index + 1)
}

fn saved(peers: &[u64]) -> RamStorage<STORAGE_LEN> {
    let mut storage = RamStorage::new();
    let mut dir = PeerDirectory::new();
    for &raw in peers {
        dir.add(addr(raw)).unwrap();
    }
    persist::save(&mut storage, &mut dir).unwrap();
    storage
}

fn loaded(storage: &mut RamStorage<STORAGE_LEN>) -> PeerDirectory {
    let mut dir = PeerDirectory::new();
    persist::load(storage, &mut dir);
    dir
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn count_byte_sits_at_the_top() {
    let storage = saved(&[0x11, 0x22, 0x33]);
    assert_eq!(storage.bytes()[STORAGE_LEN - 1], 3);
}

#[test]
fn records_grow_downward() {
    let storage = saved(&[0x0000_0102_0304_0506, 0x77]);
    let first = &storage.bytes()[record_offset(0)..record_offset(0) + RECORD_LEN];
    assert_eq!(first, &encode_record(addr(0x0000_0102_0304_0506))[..]);
    let second = &storage.bytes()[record_offset(1)..record_offset(1) + RECORD_LEN];
    assert_eq!(second, &encode_record(addr(0x77))[..]);
}

#[test]
fn save_then_load_restores_the_directory() {
    let mut storage = saved(&[0xA, 0xB, 0xC]);
    let dir = loaded(&mut storage);
    assert_eq!(dir.len(), 3);
    assert!(dir.contains(addr(0xB)));
    assert!(!dir.is_dirty());
}

// ============================================================================
// Majority Recovery
// ============================================================================

#[test]
fn any_single_corrupted_copy_is_recovered() {
    let address = addr(0x0000_DEAD_BEEF_0001);
    for copy in 0..3 {
        let mut record = encode_record(address);
        record[copy * 8 + 2] ^= 0x5A;
        assert_eq!(decode_record(&record), RecordRead::Repaired(address.as_u64()));
    }
}

#[test]
fn two_corrupted_copies_are_rejected() {
    let mut record = encode_record(addr(0x1234));
    record[0] ^= 1;
    record[9] ^= 2;
    assert_eq!(decode_record(&record), RecordRead::Corrupt);
}

#[test]
fn repaired_record_loads_and_marks_dirty() {
    let mut storage = saved(&[0x0000_0A0B_0C0D_0E0F]);
    storage.bytes_mut()[record_offset(0) + 3] ^= 0xFF;

    let mut dir = loaded(&mut storage);
    assert!(dir.contains(addr(0x0000_0A0B_0C0D_0E0F)));
    assert!(dir.is_dirty());

    // The rewrite restores the intact record
    persist::save(&mut storage, &mut dir).unwrap();
    let record = &storage.bytes()[record_offset(0)..record_offset(0) + RECORD_LEN];
    assert_eq!(record, &encode_record(addr(0x0000_0A0B_0C0D_0E0F))[..]);
}

#[test]
fn corrupt_record_is_skipped() {
    let mut storage = saved(&[0x10, 0x20]);
    let off = record_offset(0);
    storage.bytes_mut()[off] ^= 1;
    storage.bytes_mut()[off + 8] ^= 2;

    let dir = loaded(&mut storage);
    assert_eq!(dir.len(), 1);
    assert!(dir.contains(addr(0x20)));
}

#[test]
fn erased_storage_loads_empty() {
    let mut storage = RamStorage::<STORAGE_LEN>::filled(0xFF);
    let dir = loaded(&mut storage);
    assert!(dir.is_empty());
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn saving_an_unchanged_directory_only_writes_the_count() {
    let mut storage = saved(&[1, 2, 3]);
    let mut dir = loaded(&mut storage);
    let before = storage.write_count;

    persist::save(&mut storage, &mut dir).unwrap();
    assert_eq!(storage.write_count, before + 1);
}

#[test]
fn write_fault_leaves_directory_dirty() {
    let mut storage = RamStorage::<STORAGE_LEN>::new();
    storage.fail_writes_after(0);
    let mut dir = PeerDirectory::new();
    dir.add(addr(5)).unwrap();

    assert_eq!(
        persist::save(&mut storage, &mut dir),
        Err(PersistError::Storage(RamStorageError::WriteFault))
    );
    assert!(dir.is_dirty());

    storage.heal();
    persist::save(&mut storage, &mut dir).unwrap();
    assert!(!dir.is_dirty());
}

#[test]
fn tiny_storage_reports_out_of_space() {
    let mut storage = RamStorage::<16>::new();
    let mut dir = PeerDirectory::new();
    dir.add(addr(5)).unwrap();
    assert_eq!(persist::save(&mut storage, &mut dir), Err(PersistError::OutOfSpace));
}

// ============================================================================
// Legacy Layout
// ============================================================================

fn legacy_storage(words: &[u64; 8]) -> RamStorage<STORAGE_LEN> {
    let mut storage = RamStorage::new();
    let checksum = words.iter().fold(0, |acc, w| acc ^ w);
    for (i, word) in words.iter().chain(core::iter::once(&checksum)).enumerate() {
        storage.bytes_mut()[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
    }
    storage
}

#[test]
fn legacy_layout_is_imported() {
    let mut storage = legacy_storage(&[0x101, 0, 0x303, 0, 0, 0, 0, 0]);
    let dir = loaded(&mut storage);
    assert_eq!(dir.len(), 2);
    assert!(dir.contains(addr(0x101)));
    assert!(dir.contains(addr(0x303)));
    assert!(dir.is_dirty());
}

#[test]
fn legacy_layout_with_bad_checksum_is_ignored() {
    let mut storage = legacy_storage(&[0x101, 0, 0, 0, 0, 0, 0, 0]);
    storage.bytes_mut()[64] ^= 1;
    let dir = loaded(&mut storage);
    assert!(dir.is_empty());
}

#[test]
fn current_layout_wins_over_legacy() {
    let mut storage = legacy_storage(&[0x101, 0, 0, 0, 0, 0, 0, 0]);
    let mut dir = PeerDirectory::new();
    dir.add(addr(0x999)).unwrap();
    persist::save(&mut storage, &mut dir).unwrap();

    let dir = loaded(&mut storage);
    assert_eq!(dir.len(), 1);
    assert!(dir.contains(addr(0x999)));
}
