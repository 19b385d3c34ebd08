//! Peer Directory
//!
//! In-memory set of paired devices with per-peer anti-replay state.
//! Persistence lives in [`super::persist`]; the radio glues the two
//! together and emits the attach/detach events.

use core::fmt;

use heapless::Vec;

use crate::config::MAX_PEERS;
use crate::types::DeviceAddress;

/// Directory operation failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerError {
    /// No free slot left
    DirectoryFull,
    /// Address is already a peer
    AlreadyPaired,
    /// Address is not a peer
    NotPaired,
    /// The change could not be written to persistent storage
    Storage,
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryFull => f.write_str("peer directory full"),
            Self::AlreadyPaired => f.write_str("device already paired"),
            Self::NotPaired => f.write_str("device not paired"),
            Self::Storage => f.write_str("peer directory not persisted"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PeerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::DirectoryFull => defmt::write!(f, "DirectoryFull"),
            Self::AlreadyPaired => defmt::write!(f, "AlreadyPaired"),
            Self::NotPaired => defmt::write!(f, "NotPaired"),
            Self::Storage => defmt::write!(f, "Storage"),
        }
    }
}

/// One paired device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    /// Peer address
    pub address: DeviceAddress,
    /// Message id of the last accepted frame
    pub last_message_id: u16,
    /// False until a frame has been accepted from this peer in this session
    pub id_synced: bool,
}

impl PeerRecord {
    /// Fresh record with no accepted message yet
    #[must_use]
    pub const fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            last_message_id: 0,
            id_synced: false,
        }
    }
}

/// Capacity-bounded list of peers, unique by address
#[derive(Clone, Debug, Default)]
pub struct PeerDirectory {
    peers: Vec<PeerRecord, MAX_PEERS>,
    dirty: bool,
}

impl PeerDirectory {
    /// Most peers the directory accepts (one slot stays reserved)
    pub const CAPACITY: usize = MAX_PEERS - 1;

    /// Create an empty, clean directory
    #[must_use]
    pub const fn new() -> Self {
        Self {
            peers: Vec::new(),
            dirty: false,
        }
    }

    /// Append a peer
    pub fn add(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        if self.peers.len() >= Self::CAPACITY {
            return Err(PeerError::DirectoryFull);
        }
        if self.contains(address) {
            return Err(PeerError::AlreadyPaired);
        }
        self.peers
            .push(PeerRecord::new(address))
            .map_err(|_| PeerError::DirectoryFull)
    }

    /// Remove a peer, moving the last record into its slot
    pub fn remove(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        let index = self.position(address).ok_or(PeerError::NotPaired)?;
        self.peers.swap_remove(index);
        Ok(())
    }

    /// Check if the address is a peer
    #[must_use]
    pub fn contains(&self, address: DeviceAddress) -> bool {
        self.position(address).is_some()
    }

    /// Up to `max_n` peer addresses in directory order
    #[must_use]
    pub fn list(&self, max_n: usize) -> Vec<DeviceAddress, MAX_PEERS> {
        self.peers.iter().take(max_n).map(|p| p.address).collect()
    }

    /// Anti-replay check for a frame from `address`
    ///
    /// Returns None if the sender is not a peer, otherwise whether the frame
    /// is new. The first frame of a session is always new; after that any
    /// id different from the last accepted one is new.
    pub fn accept(&mut self, address: DeviceAddress, message_id: u16) -> Option<bool> {
        let index = self.position(address)?;
        let peer = &mut self.peers[index];

        if peer.id_synced && peer.last_message_id == message_id {
            return Some(false);
        }

        peer.last_message_id = message_id;
        peer.id_synced = true;
        Some(true)
    }

    /// Records in directory order
    #[must_use]
    pub fn records(&self) -> &[PeerRecord] {
        &self.peers
    }

    /// Number of peers
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Check if there are no peers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Check if no more peers can be added
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.peers.len() >= Self::CAPACITY
    }

    /// Check if the persisted copy is stale
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the persisted copy as stale
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Flag the persisted copy as current
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Drop every record without touching the dirty flag
    pub fn clear(&mut self) {
        self.peers.clear();
    }

    fn position(&self, address: DeviceAddress) -> Option<usize> {
        self.peers.iter().position(|p| p.address == address)
    }
}
