//! Shared types used across the radio stack
//!
//! Newtypes here carry the invariants of the wire protocol (48-bit device
//! addresses, rolling message ids) so the rest of the crate can rely on them.

use core::fmt;

/// 48-bit globally unique device address
///
/// Stored in the low 48 bits of a `u64`. Zero is reserved for "unknown /
/// empty slot" and is never a valid peer address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceAddress(u64);

impl DeviceAddress {
    /// Length of an address on the wire
    pub const LEN: usize = 6;

    /// Largest representable address
    pub const MAX: u64 = 0xFFFF_FFFF_FFFF;

    /// Create from a raw value, returns None if zero or wider than 48 bits
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 || raw > Self::MAX {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Create from a secure-element serial, keeping the low 48 bits
    #[must_use]
    pub const fn from_serial(serial: u64) -> Option<Self> {
        Self::new(serial & Self::MAX)
    }

    /// Decode from 6 little-endian bytes
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; Self::LEN]) -> Option<Self> {
        let raw = (bytes[0] as u64)
            | (bytes[1] as u64) << 8
            | (bytes[2] as u64) << 16
            | (bytes[3] as u64) << 24
            | (bytes[4] as u64) << 32
            | (bytes[5] as u64) << 40;
        Self::new(raw)
    }

    /// Decode from the first 6 bytes of a slice
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; Self::LEN] = bytes.get(..Self::LEN)?.try_into().ok()?;
        Self::from_le_bytes(raw)
    }

    /// Encode as 6 little-endian bytes
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; Self::LEN] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2], b[3], b[4], b[5]]
    }

    /// Raw 48-bit value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceAddress({:012x})", self.0)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012x}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u64:x}", self.0);
    }
}

/// When the radio task wants to run next
///
/// Replaces "plan now / plan relative" calls into a scheduler: every entry
/// point records its request here and the caller drives the task from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Nothing to do until an external event arrives
    #[default]
    Idle,
    /// Run again immediately
    Now,
    /// Run again after the given number of milliseconds
    In(u32),
}

impl Schedule {
    /// Keep whichever of the two requests fires first
    #[must_use]
    pub const fn earliest(self, other: Self) -> Self {
        match (self, other) {
            (Self::Now, _) | (_, Self::Now) => Self::Now,
            (Self::In(a), Self::In(b)) => Self::In(if a < b { a } else { b }),
            (Self::In(ms), Self::Idle) | (Self::Idle, Self::In(ms)) => Self::In(ms),
            (Self::Idle, Self::Idle) => Self::Idle,
        }
    }

    /// Delay in milliseconds, None when idle
    #[must_use]
    pub const fn delay_ms(self) -> Option<u32> {
        match self {
            Self::Idle => None,
            Self::Now => Some(0),
            Self::In(ms) => Some(ms),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Now => f.write_str("now"),
            Self::In(ms) => write!(f, "in {ms} ms"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Schedule {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "idle"),
            Self::Now => defmt::write!(f, "now"),
            Self::In(ms) => defmt::write!(f, "in {} ms", ms),
        }
    }
}
