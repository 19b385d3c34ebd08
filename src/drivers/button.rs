//! Push Button Driver
//!
//! Debounced button with click and hold detection, polled every
//! [`SCAN_INTERVAL_MS`](crate::config::button::SCAN_INTERVAL_MS).
//!
//! ```text
//!  raw    ──┐     ┌─┐ ┌──────────────────────────┐
//!           └─────┘ └─┘                          └──
//!  events     Press (after debounce)   Hold (2 s)   (release)
//! ```
//!
//! A release within the click timeout yields `Click`; a press kept for
//! the hold time yields one `Hold`.

use embedded_hal::digital::InputPin;

use crate::config::button::{CLICK_TIMEOUT_MS, DEBOUNCE_MS, HOLD_MS};

/// Button event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Button went down
    Press,
    /// Button released shortly after being pressed
    Click,
    /// Button kept down past the hold threshold
    Hold,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ButtonEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Press => defmt::write!(f, "Press"),
            Self::Click => defmt::write!(f, "Click"),
            Self::Hold => defmt::write!(f, "Hold"),
        }
    }
}

/// Pin-independent debounce and gesture state machine
#[derive(Clone, Copy, Debug, Default)]
pub struct Debouncer {
    pressed: bool,
    debounce_deadline: u32,
    click_deadline: u32,
    hold_deadline: u32,
    hold_signalled: bool,
}

impl Debouncer {
    /// Create a debouncer in the released state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pressed: false,
            debounce_deadline: 0,
            click_deadline: 0,
            hold_deadline: 0,
            hold_signalled: false,
        }
    }

    /// Feed one sample taken at `now_ms`
    ///
    /// A level different from the debounced state must persist for
    /// `DEBOUNCE_MS` before it is accepted.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonEvent> {
        if pressed == self.pressed {
            self.debounce_deadline = now_ms.wrapping_add(DEBOUNCE_MS);
        } else if reached(now_ms, self.debounce_deadline) {
            self.pressed = pressed;
            if pressed {
                self.click_deadline = now_ms.wrapping_add(CLICK_TIMEOUT_MS);
                self.hold_deadline = now_ms.wrapping_add(HOLD_MS);
                self.hold_signalled = false;
                return Some(ButtonEvent::Press);
            }
            return (!reached(now_ms, self.click_deadline)).then_some(ButtonEvent::Click);
        }

        if self.pressed && !self.hold_signalled && reached(now_ms, self.hold_deadline) {
            self.hold_signalled = true;
            return Some(ButtonEvent::Hold);
        }

        None
    }

    /// Debounced level
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Check if `deadline` has passed, tolerating timer wrap-around
#[allow(clippy::cast_possible_wrap)]
const fn reached(now_ms: u32, deadline: u32) -> bool {
    now_ms.wrapping_sub(deadline) as i32 >= 0
}

/// Button on a GPIO input
pub struct Button<P> {
    pin: P,
    active_low: bool,
    debouncer: Debouncer,
}

impl<P: InputPin> Button<P> {
    /// Button that reads high when pressed
    #[must_use]
    pub const fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            debouncer: Debouncer::new(),
        }
    }

    /// Button that pulls the pin low when pressed (pull-up idle)
    #[must_use]
    pub const fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
            debouncer: Debouncer::new(),
        }
    }

    /// Sample the pin and advance the state machine
    ///
    /// # Errors
    ///
    /// Returns the pin error; the state machine is not advanced.
    pub fn poll(&mut self, now_ms: u32) -> Result<Option<ButtonEvent>, P::Error> {
        let high = self.pin.is_high()?;
        Ok(self.debouncer.update(high != self.active_low, now_ms))
    }

    /// Debounced level
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.debouncer.is_pressed()
    }

    /// Release the pin
    pub fn release(self) -> P {
        self.pin
    }
}
