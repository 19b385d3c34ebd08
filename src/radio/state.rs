//! Radio task state

/// What the transceiver is doing from the radio task's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RadioState {
    /// Receiver off, nothing on air
    #[default]
    Sleep,
    /// A frame is being sent and repeated
    Transmitting,
    /// Receiver armed with no timeout
    Listening,
}

impl RadioState {
    /// Check if a frame is on air
    #[must_use]
    pub const fn is_transmitting(self) -> bool {
        matches!(self, Self::Transmitting)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RadioState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Sleep => defmt::write!(f, "SLEEP"),
            Self::Transmitting => defmt::write!(f, "TX"),
            Self::Listening => defmt::write!(f, "RX"),
        }
    }
}
