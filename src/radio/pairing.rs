//! Pairing button
//!
//! A short press publishes a running press counter; holding the button
//! broadcasts an enrollment request to the gateway.

use embedded_storage::Storage;
use rand_core::RngCore;

use super::{PublishError, Radio, RadioEventListener};
use crate::drivers::button::ButtonEvent;
use crate::hal::{SecureElement, Transceiver};

/// Maps button gestures onto radio actions
#[derive(Clone, Copy, Debug, Default)]
pub struct PairingButton {
    event_count: u16,
}

impl PairingButton {
    /// Create a handler with the counter at zero
    #[must_use]
    pub const fn new() -> Self {
        Self { event_count: 0 }
    }

    /// Presses seen so far
    #[must_use]
    pub const fn event_count(&self) -> u16 {
        self.event_count
    }

    /// Act on one button event
    ///
    /// The counter advances on every press, even when the publish fails.
    ///
    /// # Errors
    ///
    /// The publish error for a press that could not be queued.
    pub fn handle<T, S, E, R, L>(
        &mut self,
        event: ButtonEvent,
        radio: &mut Radio<T, S, E, R, L>,
    ) -> Result<(), PublishError>
    where
        T: Transceiver,
        S: Storage,
        E: SecureElement,
        R: RngCore,
        L: RadioEventListener,
    {
        match event {
            ButtonEvent::Press => {
                let count = self.event_count;
                self.event_count = self.event_count.wrapping_add(1);
                radio.publish_push_button(count)
            }
            ButtonEvent::Hold => {
                info!("pairing button held, enrolling");
                radio.enroll_to_gateway();
                Ok(())
            }
            ButtonEvent::Click => Ok(()),
        }
    }
}
