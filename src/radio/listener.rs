//! Radio event listener
//!
//! Everything the radio reports to the application goes through this
//! trait. Every method has an empty default body, so an application only
//! implements what it consumes; `()` is the listener that ignores all.

use crate::types::DeviceAddress;

/// Receiver of radio events and decoded telemetry
#[allow(unused_variables)]
pub trait RadioEventListener {
    /// The device address was read from the secure element
    fn on_init_done(&mut self, address: DeviceAddress) {}

    /// The secure element read failed; it is retried on the next task run
    fn on_init_failure(&mut self) {}

    /// `peer` was added to the directory
    fn on_attach(&mut self, peer: DeviceAddress) {}

    /// `peer` could not be added because the directory is full
    fn on_attach_failure(&mut self, peer: DeviceAddress) {}

    /// `peer` was removed from the directory
    fn on_detach(&mut self, peer: DeviceAddress) {}

    /// An unpaired device was heard while scanning
    fn on_scan_find_device(&mut self, device: DeviceAddress) {}

    /// Push-button counter from `peer`
    fn on_push_button(&mut self, peer: DeviceAddress, event_count: u16) {}

    /// Temperature in °C from `peer`
    fn on_thermometer(&mut self, peer: DeviceAddress, channel: u8, temperature: f32) {}

    /// Relative humidity in percent from `peer`
    fn on_humidity(&mut self, peer: DeviceAddress, channel: u8, percentage: f32) {}

    /// Illuminance in lux from `peer`
    fn on_illuminance(&mut self, peer: DeviceAddress, channel: u8, lux: f32) {}

    /// Pressure in Pa and altitude in m from `peer`
    fn on_barometer(&mut self, peer: DeviceAddress, channel: u8, pressure: f32, altitude: f32) {}

    /// CO2 concentration in ppm from `peer`
    fn on_co2(&mut self, peer: DeviceAddress, concentration: f32) {}

    /// Battery state from `peer`
    fn on_battery(&mut self, peer: DeviceAddress, format: u8, voltage: f32, percentage: f32) {}

    /// Opaque bytes from `peer`
    fn on_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {}

    /// Firmware identification from `peer`
    fn on_info(&mut self, peer: DeviceAddress, firmware: &str) {}

    /// `peer` asks this node to set state `state_id`
    fn on_node_state_set(&mut self, peer: DeviceAddress, state_id: u8, state: Option<bool>) {}

    /// `peer` asks this node for state `state_id`
    fn on_node_state_get(&mut self, peer: DeviceAddress, state_id: u8) {}

    /// `peer` sent bytes addressed to this node
    fn on_node_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {}
}

impl RadioEventListener for () {}

impl<L: RadioEventListener + ?Sized> RadioEventListener for &mut L {
    fn on_init_done(&mut self, address: DeviceAddress) {
        (**self).on_init_done(address);
    }

    fn on_init_failure(&mut self) {
        (**self).on_init_failure();
    }

    fn on_attach(&mut self, peer: DeviceAddress) {
        (**self).on_attach(peer);
    }

    fn on_attach_failure(&mut self, peer: DeviceAddress) {
        (**self).on_attach_failure(peer);
    }

    fn on_detach(&mut self, peer: DeviceAddress) {
        (**self).on_detach(peer);
    }

    fn on_scan_find_device(&mut self, device: DeviceAddress) {
        (**self).on_scan_find_device(device);
    }

    fn on_push_button(&mut self, peer: DeviceAddress, event_count: u16) {
        (**self).on_push_button(peer, event_count);
    }

    fn on_thermometer(&mut self, peer: DeviceAddress, channel: u8, temperature: f32) {
        (**self).on_thermometer(peer, channel, temperature);
    }

    fn on_humidity(&mut self, peer: DeviceAddress, channel: u8, percentage: f32) {
        (**self).on_humidity(peer, channel, percentage);
    }

    fn on_illuminance(&mut self, peer: DeviceAddress, channel: u8, lux: f32) {
        (**self).on_illuminance(peer, channel, lux);
    }

    fn on_barometer(&mut self, peer: DeviceAddress, channel: u8, pressure: f32, altitude: f32) {
        (**self).on_barometer(peer, channel, pressure, altitude);
    }

    fn on_co2(&mut self, peer: DeviceAddress, concentration: f32) {
        (**self).on_co2(peer, concentration);
    }

    fn on_battery(&mut self, peer: DeviceAddress, format: u8, voltage: f32, percentage: f32) {
        (**self).on_battery(peer, format, voltage, percentage);
    }

    fn on_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {
        (**self).on_buffer(peer, data);
    }

    fn on_info(&mut self, peer: DeviceAddress, firmware: &str) {
        (**self).on_info(peer, firmware);
    }

    fn on_node_state_set(&mut self, peer: DeviceAddress, state_id: u8, state: Option<bool>) {
        (**self).on_node_state_set(peer, state_id, state);
    }

    fn on_node_state_get(&mut self, peer: DeviceAddress, state_id: u8) {
        (**self).on_node_state_get(peer, state_id);
    }

    fn on_node_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {
        (**self).on_node_buffer(peer, data);
    }
}
