//! Tests for the embassy runner
//!
//! Polls `SharedRadio::drive` by hand against embassy-time's mock clock.

mod common;

use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::{frame_from, RecordingListener, OWN_SERIAL, STORAGE_LEN};
use embassy_futures::poll_once;
use embassy_time::{Duration, MockDriver};
use rand::rngs::mock::StepRng;
use sensor_radio::config::RadioConfig;
use sensor_radio::hal::sim::{RamStorage, SimSecureElement, SimTransceiver};
use sensor_radio::protocol::Message;
use sensor_radio::radio::{Radio, RadioState};
use sensor_radio::runner::SharedRadio;

type SharedTestRadio = SharedRadio<
    SimTransceiver,
    RamStorage<STORAGE_LEN>,
    SimSecureElement,
    StepRng,
    RecordingListener,
>;

/// The mock clock is global to the test binary
static CLOCK: Mutex<()> = Mutex::new(());

fn clock() -> MutexGuard<'static, ()> {
    let guard = CLOCK.lock().unwrap_or_else(PoisonError::into_inner);
    MockDriver::get().reset();
    guard
}

fn advance_ms(ms: u64) {
    MockDriver::get().advance(Duration::from_millis(ms));
}

/// Ready radio whose gap between repeats is always `gap_ms`
fn shared_radio(gap_ms: u32) -> SharedTestRadio {
    let mut radio = Radio::new(
        RadioConfig::default()
            .with_publish_repeats(3)
            .with_backoff_window_ms(1_000),
        SimTransceiver::new(),
        RamStorage::new(),
        SimSecureElement::default(),
        StepRng::new(u64::from(gap_ms), 0),
        RecordingListener::default(),
    );
    radio.on_serial_number(Ok(OWN_SERIAL));
    SharedRadio::new(radio)
}

fn sent(shared: &SharedTestRadio) -> usize {
    shared.lock(|radio| radio.transceiver().sent.len())
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn publish_runs_at_once_and_repeats_after_the_gap() {
    let _clock = clock();
    let shared = shared_radio(80);
    let mut drive = pin!(shared.drive());
    assert!(poll_once(drive.as_mut()).is_pending());

    shared.lock(|radio| radio.publish_co2(400.0)).unwrap();
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(sent(&shared), 1);

    shared.on_tx_done();
    assert!(poll_once(drive.as_mut()).is_pending());
    advance_ms(79);
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(sent(&shared), 1);

    advance_ms(1);
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(sent(&shared), 2);
}

#[test]
fn wake_ups_do_not_postpone_a_repeat() {
    let _clock = clock();
    let shared = shared_radio(80);
    let mut drive = pin!(shared.drive());
    assert!(poll_once(drive.as_mut()).is_pending());

    shared.lock(|radio| radio.publish_co2(400.0)).unwrap();
    assert!(poll_once(drive.as_mut()).is_pending());
    shared.on_tx_done();
    assert!(poll_once(drive.as_mut()).is_pending());

    // Traffic from an unknown node every 20 ms
    for id in 0..3 {
        advance_ms(20);
        shared.on_rx_done(&frame_from(0xCD, id, &Message::Co2 { concentration: 1.0 }));
        assert!(poll_once(drive.as_mut()).is_pending());
    }
    assert_eq!(sent(&shared), 1);

    advance_ms(20);
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(sent(&shared), 2);
}

#[test]
fn idle_task_sleeps_until_woken() {
    let _clock = clock();
    let shared = shared_radio(0);
    let mut drive = pin!(shared.drive());
    assert!(poll_once(drive.as_mut()).is_pending());

    advance_ms(10_000);
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(sent(&shared), 0);

    shared.lock(|radio| radio.listen());
    assert!(poll_once(drive.as_mut()).is_pending());
    assert_eq!(shared.lock(|radio| radio.state()), RadioState::Listening);
}
