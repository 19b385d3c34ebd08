//! Hardware Abstraction Layer
//!
//! Traits for the peripherals the radio stack drives. Board support code
//! implements them over the real transceiver and secure element; persistent
//! storage uses the `embedded-storage` traits directly.
//!
//! Completion events travel the other way: the board calls
//! [`Radio::on_tx_done`](crate::radio::Radio::on_tx_done),
//! [`Radio::on_rx_done`](crate::radio::Radio::on_rx_done) and
//! [`Radio::on_serial_number`](crate::radio::Radio::on_serial_number).

pub use embedded_storage::{ReadStorage, Storage};

#[cfg(feature = "std")]
pub mod sim;

/// Packet transceiver
///
/// Transmission is fire-and-forget: the driver must eventually report
/// every `transmit` through `Radio::on_tx_done`, and every received packet
/// through `Radio::on_rx_done`.
pub trait Transceiver {
    /// Copy a frame into the transmit buffer
    fn load(&mut self, frame: &[u8]);

    /// Send the frame currently held in the transmit buffer
    fn transmit(&mut self);

    /// Arm the receiver; `None` waits indefinitely
    fn listen(&mut self, timeout_ms: Option<u32>);

    /// Power the receiver down
    fn sleep(&mut self);
}

/// Serial-number read failed (bus error or invalid response)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialNumberError;

impl core::fmt::Display for SerialNumberError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("serial number read failed")
    }
}

/// Secure element holding the factory serial number
pub trait SecureElement {
    /// Start an asynchronous serial-number read
    ///
    /// The outcome is reported through `Radio::on_serial_number`.
    fn request_serial_number(&mut self);
}
