//! Sensor Radio Stack
//!
//! Peer-to-peer telemetry radio for battery-powered sensor nodes. Nodes
//! publish typed measurements as small broadcast frames, pair with each
//! other through enrollment, and keep their peer list in non-volatile
//! storage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  publish_*()  │  RadioEventListener  │  PairingButton        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      RADIO TASK                              │
//! │  Radio::run  │  PeerDirectory  │  persist  │  FrameQueue     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       PROTOCOL                               │
//! │  Header  │  Message encode/decode  │  MessageType            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  Transceiver  │  SecureElement  │  Storage  │  Button        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │      embassy runner (embedded) or caller-driven (host)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Caller-driven task**: entry points never block; they record a
//!   [`Schedule`](types::Schedule) request and the caller runs the task
//! - **Type-driven design**: addresses, message tags and radio states are
//!   newtypes and enums, not raw integers
//! - **No unsafe**: all peripheral access goes through traits
//! - **Explicit error handling**: every fallible operation returns `Result`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module
mod fmt;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Length-prefixed byte queues
pub mod queue;

/// Frame format and message codec
pub mod protocol;

/// Hardware Abstraction Layer
///
/// Traits for the transceiver, secure element and storage, plus a
/// simulation implementation for host builds.
pub mod hal;

/// Peripheral Drivers
pub mod drivers;

/// Radio Control Logic
///
/// The radio task, peer directory and persistence.
pub mod radio;

/// Embassy runner for interrupt-driven targets
#[cfg(feature = "runner")]
pub mod runner;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::RadioConfig;
    pub use crate::drivers::button::{Button, ButtonEvent};
    pub use crate::hal::{SecureElement, SerialNumberError, Transceiver};
    pub use crate::radio::{
        PairingButton, PeerError, PublishError, Radio, RadioEventListener, RadioState,
    };
    pub use crate::types::{DeviceAddress, Schedule};

    #[cfg(feature = "runner")]
    pub use crate::runner::SharedRadio;
}
