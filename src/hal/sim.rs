//! Host simulation of the radio peripherals
//!
//! In-memory stand-ins used by host tests and desktop tooling. They record
//! what the stack asked of them so behaviour can be asserted on.

use std::vec::Vec;

use embedded_storage::{ReadStorage, Storage};

use super::{SecureElement, Transceiver};
use crate::protocol::Frame;

/// Storage access outside the device or a simulated fault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RamStorageError {
    /// Offset + length exceeds the capacity
    OutOfBounds,
    /// Write rejected by `fail_writes`
    WriteFault,
}

/// Byte-addressable storage backed by RAM
#[derive(Clone, Debug)]
pub struct RamStorage<const N: usize> {
    bytes: [u8; N],
    /// Remaining writes before writes start failing (None = never)
    writes_until_fault: Option<usize>,
    /// Number of successful writes
    pub write_count: usize,
}

impl<const N: usize> RamStorage<N> {
    /// Create zero-filled storage
    #[must_use]
    pub const fn new() -> Self {
        Self::filled(0)
    }

    /// Create storage with every byte set to `value` (0xFF = erased EEPROM)
    #[must_use]
    pub const fn filled(value: u8) -> Self {
        Self {
            bytes: [value; N],
            writes_until_fault: None,
            write_count: 0,
        }
    }

    /// Let `count` more writes succeed, then fail every write
    pub fn fail_writes_after(&mut self, count: usize) {
        self.writes_until_fault = Some(count);
    }

    /// Stop injecting write faults
    pub fn heal(&mut self) {
        self.writes_until_fault = None;
    }

    /// Raw contents
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw contents, for corrupting on purpose
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, RamStorageError> {
        let start = offset as usize;
        let end = start.checked_add(len).ok_or(RamStorageError::OutOfBounds)?;
        if end > N {
            return Err(RamStorageError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReadStorage for RamStorage<N> {
    type Error = RamStorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for RamStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        if let Some(left) = self.writes_until_fault.as_mut() {
            if *left == 0 {
                return Err(RamStorageError::WriteFault);
            }
            *left -= 1;
        }
        self.bytes[range].copy_from_slice(bytes);
        self.write_count += 1;
        Ok(())
    }
}

/// Receiver state of the simulated transceiver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SimRxState {
    /// Receiver off
    #[default]
    Off,
    /// Receiver armed
    Listening(Option<u32>),
}

/// Transceiver that records every transmission
#[derive(Clone, Debug, Default)]
pub struct SimTransceiver {
    loaded: Frame,
    /// Every frame put on air, in order (repeats included)
    pub sent: Vec<Frame>,
    /// Current receiver state
    pub rx: SimRxState,
}

impl SimTransceiver {
    /// Create an idle transceiver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame currently in the transmit buffer
    #[must_use]
    pub fn loaded(&self) -> &[u8] {
        &self.loaded
    }

    /// Distinct frames in transmission order (consecutive repeats collapsed)
    #[must_use]
    pub fn distinct_sent(&self) -> Vec<Frame> {
        let mut out: Vec<Frame> = Vec::new();
        for frame in &self.sent {
            if out.last() != Some(frame) {
                out.push(frame.clone());
            }
        }
        out
    }
}

impl Transceiver for SimTransceiver {
    fn load(&mut self, frame: &[u8]) {
        self.loaded.clear();
        // Frames are built within MAX_FRAME_LEN, so this cannot overflow
        let _ = self.loaded.extend_from_slice(frame);
    }

    fn transmit(&mut self) {
        self.sent.push(self.loaded.clone());
    }

    fn listen(&mut self, timeout_ms: Option<u32>) {
        self.rx = SimRxState::Listening(timeout_ms);
    }

    fn sleep(&mut self) {
        self.rx = SimRxState::Off;
    }
}

/// Secure element that only counts requests
///
/// Tests answer a request by calling `Radio::on_serial_number`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimSecureElement {
    /// Number of serial-number reads issued
    pub requests: usize,
}

impl SecureElement for SimSecureElement {
    fn request_serial_number(&mut self) {
        self.requests += 1;
    }
}
