//! Embassy runner
//!
//! Shares one [`Radio`] between interrupt handlers and an async task.
//! Driver interrupts call [`SharedRadio::on_tx_done`] and friends; the task
//! awaits [`SharedRadio::drive`], which sleeps until the radio's next
//! requested run or until an interrupt wakes it.
//!
//! The radio lives in a `critical_section::Mutex`, so every call, including
//! a full task run with its storage writes and listener callbacks, runs with
//! interrupts masked.
//!
//! ```ignore
//! static RADIO: StaticCell<SharedRadio<...>> = StaticCell::new();
//!
//! #[embassy_executor::task]
//! async fn radio_task(radio: &'static SharedRadio<...>) -> ! {
//!     radio.drive().await
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_storage::Storage;
use rand_core::RngCore;

use crate::hal::{SecureElement, SerialNumberError, Transceiver};
use crate::radio::{Radio, RadioEventListener};
use crate::types::Schedule;

/// Radio context guarded for interrupt and task access
pub struct SharedRadio<T, S, E, R, L = ()> {
    radio: Mutex<RefCell<Radio<T, S, E, R, L>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl<T, S, E, R, L> SharedRadio<T, S, E, R, L>
where
    T: Transceiver,
    S: Storage,
    E: SecureElement,
    R: RngCore,
    L: RadioEventListener,
{
    /// Wrap a radio context
    pub const fn new(radio: Radio<T, S, E, R, L>) -> Self {
        Self {
            radio: Mutex::new(RefCell::new(radio)),
            wake: Signal::new(),
        }
    }

    /// Run `f` on the radio and wake the task
    ///
    /// Use this for every application call (publish, pairing, control).
    pub fn lock<U>(&self, f: impl FnOnce(&mut Radio<T, S, E, R, L>) -> U) -> U {
        let out = self.with(f);
        self.wake.signal(());
        out
    }

    /// Transmit-complete interrupt
    pub fn on_tx_done(&self) {
        self.lock(|radio| radio.on_tx_done());
    }

    /// Receive-complete interrupt
    pub fn on_rx_done(&self, frame: &[u8]) {
        self.lock(|radio| radio.on_rx_done(frame));
    }

    /// Secure element response
    pub fn on_serial_number(&self, serial: Result<u64, SerialNumberError>) {
        self.lock(|radio| radio.on_serial_number(serial));
    }

    /// Drive the radio task forever
    ///
    /// Wake-ups only ever move the next deadline earlier, so frequent
    /// interrupts cannot push a pending retransmission back.
    pub async fn drive(&self) -> ! {
        let mut deadline = deadline_for(self.with(|radio| radio.take_schedule()));
        loop {
            let due = match deadline {
                Some(at) => matches!(
                    select(Timer::at(at), self.wake.wait()).await,
                    Either::First(())
                ),
                None => {
                    self.wake.wait().await;
                    false
                }
            };

            let requested = self.with(|radio| radio.take_schedule());
            let expired = deadline.is_some_and(|at| at <= Instant::now());
            deadline = if due || expired || requested == Schedule::Now {
                let after = self.with(|radio| radio.run());
                trace!("radio task ran, next {}", after);
                deadline_for(after)
            } else {
                earliest(deadline, deadline_for(requested))
            };
        }
    }

    /// Run `f` with interrupts masked
    ///
    /// A whole [`Radio::run`] executes in one critical section, storage
    /// writes and listener callbacks included. Keep listener callbacks short
    /// on targets with tight interrupt latency.
    fn with<U>(&self, f: impl FnOnce(&mut Radio<T, S, E, R, L>) -> U) -> U {
        critical_section::with(|cs| f(&mut self.radio.borrow_ref_mut(cs)))
    }
}

/// Absolute time a schedule request falls due
fn deadline_for(schedule: Schedule) -> Option<Instant> {
    match schedule {
        Schedule::Idle => None,
        Schedule::Now => Some(Instant::now()),
        Schedule::In(ms) => Some(Instant::now() + Duration::from_millis(u64::from(ms))),
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
