//! Publish API
//!
//! Each call encodes one message into the publish queue and requests an
//! immediate run; the frame goes on air on a later [`Radio::run`].

use core::fmt;

use embedded_storage::Storage;
use rand_core::RngCore;

use super::{Radio, RadioEventListener};
use crate::hal::{SecureElement, Transceiver};
use crate::protocol::Message;
use crate::types::{DeviceAddress, Schedule};

/// Reason a message was not queued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishError {
    /// The publish queue has no room for the message
    QueueFull,
    /// The content does not fit in one frame
    TooLong,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("publish queue full"),
            Self::TooLong => f.write_str("message too long"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PublishError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::QueueFull => defmt::write!(f, "QueueFull"),
            Self::TooLong => defmt::write!(f, "TooLong"),
        }
    }
}

impl<T, S, E, R, L> Radio<T, S, E, R, L>
where
    T: Transceiver,
    S: Storage,
    E: SecureElement,
    R: RngCore,
    L: RadioEventListener,
{
    /// Publish a push-button counter
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_push_button(&mut self, event_count: u16) -> Result<(), PublishError> {
        self.publish(&Message::PushButton { event_count })
    }

    /// Publish a temperature in °C
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_thermometer(&mut self, channel: u8, temperature: f32) -> Result<(), PublishError> {
        self.publish(&Message::Thermometer { channel, temperature })
    }

    /// Publish a relative humidity in percent
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_humidity(&mut self, channel: u8, percentage: f32) -> Result<(), PublishError> {
        self.publish(&Message::Humidity { channel, percentage })
    }

    /// Publish an illuminance in lux
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_illuminance(&mut self, channel: u8, lux: f32) -> Result<(), PublishError> {
        self.publish(&Message::Illuminance { channel, lux })
    }

    /// Publish pressure in Pa and altitude in m
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_barometer(
        &mut self,
        channel: u8,
        pressure: f32,
        altitude: f32,
    ) -> Result<(), PublishError> {
        self.publish(&Message::Barometer {
            channel,
            pressure,
            altitude,
        })
    }

    /// Publish a CO2 concentration in ppm
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_co2(&mut self, concentration: f32) -> Result<(), PublishError> {
        self.publish(&Message::Co2 { concentration })
    }

    /// Publish battery format, voltage and charge
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_battery(&mut self, format: u8, voltage: f32, percentage: f32) -> Result<(), PublishError> {
        self.publish(&Message::Battery {
            format,
            voltage,
            percentage,
        })
    }

    /// Publish opaque bytes
    ///
    /// # Errors
    ///
    /// `TooLong` above [`MAX_BUFFER_LEN`](crate::config::MAX_BUFFER_LEN)
    /// bytes, `QueueFull` if the publish queue has no room.
    pub fn publish_buffer(&mut self, data: &[u8]) -> Result<(), PublishError> {
        self.publish(&Message::Buffer(data))
    }

    /// Publish a firmware identification string
    ///
    /// Strings longer than [`MAX_INFO_LEN`](crate::config::MAX_INFO_LEN)
    /// bytes are truncated at a character boundary.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_info(&mut self, firmware: &str) -> Result<(), PublishError> {
        self.publish(&Message::Info(firmware))
    }

    /// Ask `target` to set state `state_id`
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_node_state_set(
        &mut self,
        target: DeviceAddress,
        state_id: u8,
        state: Option<bool>,
    ) -> Result<(), PublishError> {
        self.publish(&Message::NodeStateSet {
            target,
            state_id,
            state,
        })
    }

    /// Ask `target` for state `state_id`
    ///
    /// # Errors
    ///
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_node_state_get(&mut self, target: DeviceAddress, state_id: u8) -> Result<(), PublishError> {
        self.publish(&Message::NodeStateGet { target, state_id })
    }

    /// Send opaque bytes addressed to `target`
    ///
    /// # Errors
    ///
    /// `TooLong` above
    /// [`MAX_NODE_BUFFER_LEN`](crate::protocol::MAX_NODE_BUFFER_LEN) bytes,
    /// `QueueFull` if the publish queue has no room.
    pub fn publish_node_buffer(&mut self, target: DeviceAddress, data: &[u8]) -> Result<(), PublishError> {
        self.publish(&Message::NodeBuffer { target, data })
    }

    fn publish(&mut self, message: &Message<'_>) -> Result<(), PublishError> {
        let payload = message.encode().map_err(|_| PublishError::TooLong)?;
        self.pub_queue.push(&payload).map_err(|_| {
            warn!("publish queue full");
            PublishError::QueueFull
        })?;
        self.plan(Schedule::Now);
        Ok(())
    }
}
