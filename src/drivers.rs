//! Peripheral Drivers
//!
//! Input devices that feed the radio stack.

pub mod button;
