//! Scan de-duplication cache
//!
//! While scanning, every frame from an unpaired device would raise a
//! discovery event. The cache remembers the last few reported addresses so
//! each device is reported once per scan window.

use crate::config::SCAN_CACHE_LEN;
use crate::types::DeviceAddress;

/// Ring of recently reported addresses
#[derive(Clone, Debug, Default)]
pub struct ScanCache {
    entries: [Option<DeviceAddress>; SCAN_CACHE_LEN],
    head: usize,
}

impl ScanCache {
    /// Create an empty cache
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [None; SCAN_CACHE_LEN],
            head: 0,
        }
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.entries = [None; SCAN_CACHE_LEN];
        self.head = 0;
    }

    /// Record an address, returns false if it was already cached
    ///
    /// When full, the oldest entry is overwritten.
    pub fn push(&mut self, address: DeviceAddress) -> bool {
        if self.contains(address) {
            return false;
        }
        self.entries[self.head] = Some(address);
        self.head = (self.head + 1) % SCAN_CACHE_LEN;
        true
    }

    /// Check if an address is cached
    #[must_use]
    pub fn contains(&self, address: DeviceAddress) -> bool {
        self.entries.contains(&Some(address))
    }
}
