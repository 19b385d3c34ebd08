//! Shared fixtures for the radio integration tests

#![allow(dead_code)]

use rand::rngs::mock::StepRng;
use sensor_radio::config::RadioConfig;
use sensor_radio::hal::sim::{RamStorage, SimSecureElement, SimTransceiver};
use sensor_radio::protocol::{self, Header, Message};
use sensor_radio::radio::{Radio, RadioEventListener};
use sensor_radio::types::{DeviceAddress, Schedule};

/// Storage size used by the fixtures
pub const STORAGE_LEN: usize = 256;

/// Serial number of the device under test
pub const OWN_SERIAL: u64 = 0x0000_A1B2_C3D4_E5F6;

/// Radio wired to the simulation HAL
pub type TestRadio =
    Radio<SimTransceiver, RamStorage<STORAGE_LEN>, SimSecureElement, StepRng, RecordingListener>;

/// Everything the radio reported, in order
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    InitDone(DeviceAddress),
    InitFailure,
    Attach(DeviceAddress),
    AttachFailure(DeviceAddress),
    Detach(DeviceAddress),
    ScanFound(DeviceAddress),
    PushButton(DeviceAddress, u16),
    Thermometer(DeviceAddress, u8, f32),
    Humidity(DeviceAddress, u8, f32),
    Illuminance(DeviceAddress, u8, f32),
    Barometer(DeviceAddress, u8, f32, f32),
    Co2(DeviceAddress, f32),
    Battery(DeviceAddress, u8, f32, f32),
    Buffer(DeviceAddress, Vec<u8>),
    Info(DeviceAddress, String),
    NodeStateSet(DeviceAddress, u8, Option<bool>),
    NodeStateGet(DeviceAddress, u8),
    NodeBuffer(DeviceAddress, Vec<u8>),
}

/// Listener that records every event
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<Event>,
}

impl RadioEventListener for RecordingListener {
    fn on_init_done(&mut self, address: DeviceAddress) {
        self.events.push(Event::InitDone(address));
    }

    fn on_init_failure(&mut self) {
        self.events.push(Event::InitFailure);
    }

    fn on_attach(&mut self, peer: DeviceAddress) {
        self.events.push(Event::Attach(peer));
    }

    fn on_attach_failure(&mut self, peer: DeviceAddress) {
        self.events.push(Event::AttachFailure(peer));
    }

    fn on_detach(&mut self, peer: DeviceAddress) {
        self.events.push(Event::Detach(peer));
    }

    fn on_scan_find_device(&mut self, device: DeviceAddress) {
        self.events.push(Event::ScanFound(device));
    }

    fn on_push_button(&mut self, peer: DeviceAddress, event_count: u16) {
        self.events.push(Event::PushButton(peer, event_count));
    }

    fn on_thermometer(&mut self, peer: DeviceAddress, channel: u8, temperature: f32) {
        self.events.push(Event::Thermometer(peer, channel, temperature));
    }

    fn on_humidity(&mut self, peer: DeviceAddress, channel: u8, percentage: f32) {
        self.events.push(Event::Humidity(peer, channel, percentage));
    }

    fn on_illuminance(&mut self, peer: DeviceAddress, channel: u8, lux: f32) {
        self.events.push(Event::Illuminance(peer, channel, lux));
    }

    fn on_barometer(&mut self, peer: DeviceAddress, channel: u8, pressure: f32, altitude: f32) {
        self.events.push(Event::Barometer(peer, channel, pressure, altitude));
    }

    fn on_co2(&mut self, peer: DeviceAddress, concentration: f32) {
        self.events.push(Event::Co2(peer, concentration));
    }

    fn on_battery(&mut self, peer: DeviceAddress, format: u8, voltage: f32, percentage: f32) {
        self.events.push(Event::Battery(peer, format, voltage, percentage));
    }

    fn on_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {
        self.events.push(Event::Buffer(peer, data.to_vec()));
    }

    fn on_info(&mut self, peer: DeviceAddress, firmware: &str) {
        self.events.push(Event::Info(peer, firmware.to_owned()));
    }

    fn on_node_state_set(&mut self, peer: DeviceAddress, state_id: u8, state: Option<bool>) {
        self.events.push(Event::NodeStateSet(peer, state_id, state));
    }

    fn on_node_state_get(&mut self, peer: DeviceAddress, state_id: u8) {
        self.events.push(Event::NodeStateGet(peer, state_id));
    }

    fn on_node_buffer(&mut self, peer: DeviceAddress, data: &[u8]) {
        self.events.push(Event::NodeBuffer(peer, data.to_vec()));
    }
}

pub fn addr(raw: u64) -> DeviceAddress {
    DeviceAddress::new(raw).unwrap()
}

/// Radio over the given storage, serial number not yet answered
pub fn radio_with(config: RadioConfig, storage: RamStorage<STORAGE_LEN>) -> TestRadio {
    Radio::new(
        config,
        SimTransceiver::new(),
        storage,
        SimSecureElement::default(),
        StepRng::new(0, 37),
        RecordingListener::default(),
    )
}

/// Radio over blank storage with its address known and the task settled
pub fn ready_radio() -> TestRadio {
    ready_radio_with(RamStorage::new())
}

/// Like [`ready_radio`] over the given storage
pub fn ready_radio_with(storage: RamStorage<STORAGE_LEN>) -> TestRadio {
    let mut radio = radio_with(RadioConfig::default(), storage);
    radio.on_serial_number(Ok(OWN_SERIAL));
    settle(&mut radio);
    radio.listener_mut().events.clear();
    radio
}

/// Run the task until it goes idle, completing every transmission
///
/// Returns the number of task runs.
pub fn settle(radio: &mut TestRadio) -> usize {
    let mut next = radio.take_schedule().earliest(Schedule::Now);
    let mut runs = 0;
    while next != Schedule::Idle && runs < 1_000 {
        let sent_before = radio.transceiver().sent.len();
        next = radio.run();
        runs += 1;
        if radio.transceiver().sent.len() > sent_before {
            radio.on_tx_done();
            next = next.earliest(radio.take_schedule());
        }
    }
    runs
}

/// Frame as another node would put it on air
pub fn frame_from(sender: u64, message_id: u16, message: &Message<'_>) -> Vec<u8> {
    let payload = message.encode().unwrap();
    protocol::encode_frame(&Header::new(addr(sender), message_id), &payload)
        .unwrap()
        .to_vec()
}

/// Payloads of every distinct frame sent, header stripped
pub fn sent_payloads(radio: &TestRadio) -> Vec<Vec<u8>> {
    radio
        .transceiver()
        .distinct_sent()
        .iter()
        .map(|frame| frame[8..].to_vec())
        .collect()
}
