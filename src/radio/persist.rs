//! Peer directory persistence
//!
//! The directory is written to the top of a byte-addressable store and
//! grows downward:
//!
//! ```text
//!  capacity-1  ┌───────────────┐  peer count (1 byte)
//!  capacity-8  ├───────────────┤
//!              │ record 0      │  copy1 │ copy2 │ !copy3   (3 × 8 bytes)
//!              ├───────────────┤
//!              │ record 1      │
//!              ├───────────────┤
//!              │ ...           │
//! ```
//!
//! Every copy is the address as a little-endian `u64`; the third copy has
//! both 32-bit halves bit-inverted. A record is accepted when two copies
//! agree. Unchanged records are not rewritten.
//!
//! An older layout (`MAX_PEERS` words plus an XOR checksum word at offset 0)
//! is imported once when the current layout holds no peers.

use core::fmt;

use embedded_storage::Storage;

use super::peers::PeerDirectory;
use crate::config::MAX_PEERS;
use crate::types::DeviceAddress;

/// Bytes per stored address copy
const COPY_LEN: usize = 8;

/// Bytes per record (three copies)
pub const RECORD_LEN: usize = 3 * COPY_LEN;

/// Bytes reserved at the very top (the count lives in the last one)
const TOP_RESERVED: usize = 8;

/// Bytes occupied by the legacy layout at offset 0
const LEGACY_LEN: usize = (MAX_PEERS + 1) * COPY_LEN;

/// Persistence failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistError<E> {
    /// The storage device reported an error
    Storage(E),
    /// The storage is too small for the directory
    OutOfSpace,
}

impl<E: fmt::Debug> fmt::Display for PersistError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage error: {e:?}"),
            Self::OutOfSpace => f.write_str("storage too small for peer directory"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for PersistError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Storage(_) => defmt::write!(f, "Storage"),
            Self::OutOfSpace => defmt::write!(f, "OutOfSpace"),
        }
    }
}

/// Result of decoding one stored record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordRead {
    /// All three copies agree
    Intact(u64),
    /// Two copies agree; the record should be rewritten
    Repaired(u64),
    /// No two copies agree
    Corrupt,
}

/// Serialize one record
#[must_use]
pub fn encode_record(address: DeviceAddress) -> [u8; RECORD_LEN] {
    let raw = address.as_u64();
    let mut out = [0u8; RECORD_LEN];
    out[..COPY_LEN].copy_from_slice(&raw.to_le_bytes());
    out[COPY_LEN..2 * COPY_LEN].copy_from_slice(&raw.to_le_bytes());
    out[2 * COPY_LEN..].copy_from_slice(&invert_halves(raw).to_le_bytes());
    out
}

/// Deserialize one record by majority vote
#[must_use]
pub fn decode_record(bytes: &[u8; RECORD_LEN]) -> RecordRead {
    let copy = |i: usize| {
        let mut word = [0u8; COPY_LEN];
        word.copy_from_slice(&bytes[i * COPY_LEN..(i + 1) * COPY_LEN]);
        u64::from_le_bytes(word)
    };
    let (a, b, c) = (copy(0), copy(1), invert_halves(copy(2)));

    if a == b && b == c {
        RecordRead::Intact(a)
    } else if a == b || a == c {
        RecordRead::Repaired(a)
    } else if b == c {
        RecordRead::Repaired(b)
    } else {
        RecordRead::Corrupt
    }
}

/// Flip both 32-bit halves of a stored word
const fn invert_halves(word: u64) -> u64 {
    let low = !(word as u32);
    let high = !((word >> 32) as u32);
    (high as u64) << 32 | low as u64
}

/// Offset of the count byte
fn count_offset(capacity: usize) -> Option<u32> {
    u32::try_from(capacity.checked_sub(1)?).ok()
}

/// Offset of record `index`
fn record_offset(capacity: usize, index: usize) -> Option<u32> {
    let offset = capacity
        .checked_sub(TOP_RESERVED)?
        .checked_sub((index + 1) * RECORD_LEN)?;
    u32::try_from(offset).ok()
}

/// Load the directory from storage, replacing its contents
///
/// Corrupt records are skipped. The directory is left dirty when a record
/// needed repair or the legacy layout was consulted, so the caller rewrites
/// it in the current layout.
pub fn load<S: Storage>(storage: &mut S, directory: &mut PeerDirectory) {
    directory.clear();
    directory.mark_clean();

    let capacity = storage.capacity();
    let mut count = [0u8; 1];
    let count_read = count_offset(capacity)
        .map(|offset| storage.read(offset, &mut count).is_ok())
        .unwrap_or(false);
    if !count_read {
        warn!("peer count unreadable");
        return;
    }

    let stored = usize::from(count[0]).min(PeerDirectory::CAPACITY);
    let mut record = [0u8; RECORD_LEN];

    for index in 0..stored {
        let Some(offset) = record_offset(capacity, index) else {
            break;
        };
        if storage.read(offset, &mut record).is_err() {
            continue;
        }

        let raw = match decode_record(&record) {
            RecordRead::Intact(raw) => raw,
            RecordRead::Repaired(raw) => {
                directory.mark_dirty();
                raw
            }
            RecordRead::Corrupt => continue,
        };

        if let Some(address) = DeviceAddress::new(raw) {
            // Duplicates in storage collapse into one peer
            let _ = directory.add(address);
        }
    }

    if directory.is_empty() {
        load_legacy(storage, directory);
        directory.mark_dirty();
    }

    debug!("loaded {} peers", directory.len());
}

/// Import peers from the legacy flat layout if its checksum holds
fn load_legacy<S: Storage>(storage: &mut S, directory: &mut PeerDirectory) {
    let mut raw = [0u8; LEGACY_LEN];
    if storage.capacity() < LEGACY_LEN || storage.read(0, &mut raw).is_err() {
        return;
    }

    let words = raw.chunks_exact(COPY_LEN).map(|chunk| {
        let mut word = [0u8; COPY_LEN];
        word.copy_from_slice(chunk);
        u64::from_le_bytes(word)
    });

    if words.clone().fold(0, |acc, w| acc ^ w) != 0 {
        return;
    }

    for address in words.take(MAX_PEERS).filter_map(DeviceAddress::new) {
        let _ = directory.add(address);
    }

    if !directory.is_empty() {
        info!("imported {} peers from legacy layout", directory.len());
    }
}

/// Write the directory to storage and mark it clean
///
/// Records whose stored bytes already match are skipped. On failure the
/// directory stays dirty.
pub fn save<S: Storage>(
    storage: &mut S,
    directory: &mut PeerDirectory,
) -> Result<(), PersistError<S::Error>> {
    let capacity = storage.capacity();
    let mut current = [0u8; RECORD_LEN];

    directory.mark_dirty();

    for (index, peer) in directory.records().iter().enumerate() {
        let offset = record_offset(capacity, index).ok_or(PersistError::OutOfSpace)?;
        let record = encode_record(peer.address);

        let unchanged = storage.read(offset, &mut current).is_ok() && current == record;
        if !unchanged {
            storage.write(offset, &record).map_err(PersistError::Storage)?;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let count = directory.len() as u8;
    let offset = count_offset(capacity).ok_or(PersistError::OutOfSpace)?;
    storage.write(offset, &[count]).map_err(PersistError::Storage)?;

    directory.mark_clean();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(raw: u64) -> DeviceAddress {
        DeviceAddress::new(raw).unwrap()
    }

    #[test]
    fn third_copy_is_inverted() {
        let record = encode_record(addr(0x0000_1122_3344_5566));
        assert_eq!(&record[..8], &0x0000_1122_3344_5566u64.to_le_bytes());
        assert_eq!(&record[8..16], &record[..8]);
        for i in 0..8 {
            assert_eq!(record[16 + i], !record[i]);
        }
    }

    #[test]
    fn invert_halves_is_involution() {
        for word in [0, 1, u64::MAX, 0xDEAD_BEEF_0BAD_F00D] {
            assert_eq!(invert_halves(invert_halves(word)), word);
        }
    }

    #[test]
    fn record_offsets_grow_downward() {
        assert_eq!(record_offset(1024, 0), Some(1024 - 8 - 24));
        assert_eq!(record_offset(1024, 1), Some(1024 - 8 - 48));
        assert_eq!(record_offset(40, 1), None);
        assert_eq!(count_offset(1024), Some(1023));
    }
}
