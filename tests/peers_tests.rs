//! Tests for the in-memory peer directory

mod common;

use std::collections::BTreeSet;

use common::{addr, ready_radio, settle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensor_radio::config::MAX_PEERS;
use sensor_radio::radio::{PeerDirectory, PeerError};

#[test]
fn add_and_remove() {
    let mut dir = PeerDirectory::new();
    dir.add(addr(1)).unwrap();
    dir.add(addr(2)).unwrap();
    assert!(dir.contains(addr(1)));
    assert_eq!(dir.len(), 2);

    dir.remove(addr(1)).unwrap();
    assert!(!dir.contains(addr(1)));
    assert!(dir.contains(addr(2)));
}

#[test]
fn duplicate_add_is_rejected() {
    let mut dir = PeerDirectory::new();
    dir.add(addr(9)).unwrap();
    assert_eq!(dir.add(addr(9)), Err(PeerError::AlreadyPaired));
    assert_eq!(dir.len(), 1);
}

#[test]
fn remove_unknown_is_rejected() {
    let mut dir = PeerDirectory::new();
    assert_eq!(dir.remove(addr(3)), Err(PeerError::NotPaired));
}

#[test]
fn directory_holds_seven_peers() {
    let mut dir = PeerDirectory::new();
    for raw in 1..=7 {
        dir.add(addr(raw)).unwrap();
    }
    assert!(dir.is_full());
    assert_eq!(dir.add(addr(8)), Err(PeerError::DirectoryFull));
    // Capacity is checked first
    assert_eq!(dir.add(addr(1)), Err(PeerError::DirectoryFull));
}

#[test]
fn list_is_bounded() {
    let mut dir = PeerDirectory::new();
    for raw in 1..=5 {
        dir.add(addr(raw)).unwrap();
    }
    assert_eq!(dir.list(3).len(), 3);
    assert_eq!(dir.list(100).len(), 5);
    assert!(dir.list(0).is_empty());
}

#[test]
fn anti_replay_accepts_first_and_changed_ids() {
    let mut dir = PeerDirectory::new();
    dir.add(addr(4)).unwrap();

    assert_eq!(dir.accept(addr(4), 10), Some(true));
    assert_eq!(dir.accept(addr(4), 10), Some(false));
    assert_eq!(dir.accept(addr(4), 11), Some(true));
    // Any different id counts as new, including older ones
    assert_eq!(dir.accept(addr(4), 3), Some(true));
    assert_eq!(dir.accept(addr(5), 1), None);
}

#[test]
fn first_frame_with_stale_id_is_accepted() {
    let mut dir = PeerDirectory::new();
    dir.add(addr(4)).unwrap();
    // A freshly attached peer has last id 0 but is not yet synced
    assert_eq!(dir.accept(addr(4), 0), Some(true));
}

// ============================================================================
// Random Sequences
// ============================================================================

#[test]
fn random_add_remove_sequences_keep_directory_unique_and_bounded() {
    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut dir = PeerDirectory::new();
        let mut model = BTreeSet::new();

        for _ in 0..500 {
            // A small address pool makes duplicates and misses common
            let raw = rng.gen_range(1..=12u64);
            if rng.gen_bool(0.6) {
                let expected = if model.len() >= MAX_PEERS - 1 {
                    Err(PeerError::DirectoryFull)
                } else if model.contains(&raw) {
                    Err(PeerError::AlreadyPaired)
                } else {
                    Ok(())
                };
                assert_eq!(dir.add(addr(raw)), expected, "seed {seed} add {raw:#x}");
                if expected.is_ok() {
                    model.insert(raw);
                }
            } else {
                let expected = if model.remove(&raw) {
                    Ok(())
                } else {
                    Err(PeerError::NotPaired)
                };
                assert_eq!(dir.remove(addr(raw)), expected, "seed {seed} remove {raw:#x}");
            }

            let listed: Vec<u64> = dir.list(MAX_PEERS).iter().map(|a| a.as_u64()).collect();
            let unique: BTreeSet<u64> = listed.iter().copied().collect();
            assert_eq!(unique.len(), listed.len(), "seed {seed}: duplicate entry");
            assert!(dir.len() <= MAX_PEERS - 1, "seed {seed}: {} peers", dir.len());
            assert_eq!(unique, model, "seed {seed}");
        }
    }
}

#[test]
fn random_peer_add_remove_on_the_radio_stays_unique() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut radio = ready_radio();

    for _ in 0..120 {
        let raw = rng.gen_range(1..=10u64);
        if rng.gen_bool(0.5) {
            let _ = radio.peer_add(addr(raw));
        } else {
            let _ = radio.peer_remove(addr(raw));
        }
        settle(&mut radio);

        let peers = radio.peer_addresses(MAX_PEERS);
        let unique: BTreeSet<u64> = peers.iter().map(|a| a.as_u64()).collect();
        assert_eq!(unique.len(), peers.len());
        assert!(peers.len() <= MAX_PEERS - 1);
    }
}
