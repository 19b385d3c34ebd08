//! System configuration and protocol constants
//!
//! Compile-time sizes of the radio stack live here next to the runtime
//! [`RadioConfig`]. Buffer sizes are fixed because nothing in the stack
//! allocates.

/// Largest frame the transceiver can send or receive in one packet
pub const MAX_FRAME_LEN: usize = 64;

/// Frame header length (6-byte sender address + 2-byte message id)
pub const HEADER_LEN: usize = 8;

/// Shortest frame that carries a type tag
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// Largest payload (type tag included) that fits behind the header
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - HEADER_LEN;

/// Largest opaque buffer accepted by `publish_buffer`
pub const MAX_BUFFER_LEN: usize = MAX_PAYLOAD_LEN - 1;

/// Largest firmware string carried by `publish_info` (NUL terminator excluded)
pub const MAX_INFO_LEN: usize = MAX_BUFFER_LEN - 1;

/// Peer directory slots; one slot is always kept free
pub const MAX_PEERS: usize = 8;

/// Byte capacity of each message queue
pub const QUEUE_CAPACITY: usize = 128;

/// Entries remembered by the scan de-duplication cache
pub const SCAN_CACHE_LEN: usize = 4;

/// Transmissions of every published frame
pub const PUBLISH_REPEATS: u8 = 6;

/// Transmissions of a gateway enrollment frame
pub const ENROLLMENT_REPEATS: u8 = 10;

/// Upper bound (exclusive) of the random gap between repeats, in milliseconds
pub const BACKOFF_WINDOW_MS: u32 = 100;

/// Pairing button timing
pub mod button {
    //! Debounce and gesture thresholds for the pairing button, in milliseconds

    /// Interval between pin samples
    pub const SCAN_INTERVAL_MS: u32 = 20;

    /// Time a new level must be stable before it is accepted
    pub const DEBOUNCE_MS: u32 = 50;

    /// Release before this is reported as a click
    pub const CLICK_TIMEOUT_MS: u32 = 500;

    /// Press longer than this is reported as a hold
    pub const HOLD_MS: u32 = 2000;
}

/// Runtime tunables of the radio task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioConfig {
    /// Transmissions of every published frame
    pub publish_repeats: u8,
    /// Transmissions of a gateway enrollment frame
    pub enrollment_repeats: u8,
    /// Random gap between repeats is drawn from `0..backoff_window_ms`
    pub backoff_window_ms: u32,
}

impl RadioConfig {
    /// Configuration matching the protocol defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            publish_repeats: PUBLISH_REPEATS,
            enrollment_repeats: ENROLLMENT_REPEATS,
            backoff_window_ms: BACKOFF_WINDOW_MS,
        }
    }

    /// Set the repeat count of published frames (at least one)
    #[must_use]
    pub const fn with_publish_repeats(self, repeats: u8) -> Self {
        Self {
            publish_repeats: if repeats == 0 { 1 } else { repeats },
            ..self
        }
    }

    /// Set the repeat count of enrollment frames (at least one)
    #[must_use]
    pub const fn with_enrollment_repeats(self, repeats: u8) -> Self {
        Self {
            enrollment_repeats: if repeats == 0 { 1 } else { repeats },
            ..self
        }
    }

    /// Set the backoff window; zero disables the random gap
    #[must_use]
    pub const fn with_backoff_window_ms(self, window_ms: u32) -> Self {
        Self {
            backoff_window_ms: window_ms,
            ..self
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RadioConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "RadioConfig(repeats {}/{}, backoff {} ms)",
            self.publish_repeats,
            self.enrollment_repeats,
            self.backoff_window_ms
        );
    }
}
