//! Radio Frame Codec
//!
//! Encodes and decodes the over-the-air frame:
//!
//! ```text
//! ┌──────────────┬────────────────┬──────┬───────────────────────┐
//! │ sender (6 B) │ message id (2) │ type │ type-specific payload │
//! └──────────────┴────────────────┴──────┴───────────────────────┘
//! ```
//!
//! All multi-byte fields are little-endian, floats are IEEE-754 binary32.
//! Decoding never fails loudly: anything malformed or unknown decodes to
//! `None` and the caller drops it.

use core::fmt;

use heapless::Vec;

use crate::config::{HEADER_LEN, MAX_BUFFER_LEN, MAX_FRAME_LEN, MAX_INFO_LEN, MAX_PAYLOAD_LEN};
use crate::types::DeviceAddress;

/// Encoded payload (type tag included)
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Encoded frame (header included)
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Frame length of an attach/detach announcement
pub const ANNOUNCE_FRAME_LEN: usize = HEADER_LEN + 1 + 8;

/// Largest raw buffer carried by a node-addressed buffer message
pub const MAX_NODE_BUFFER_LEN: usize = MAX_PAYLOAD_LEN - 1 - DeviceAddress::LEN;

/// Wire value of an absent node state
const NULL_STATE: u8 = 0xFF;

/// Message type tag, the first payload byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Request to join a coordinator's peer list
    Enroll = 0,
    /// Push-button event counter
    PushButton = 1,
    /// Temperature reading
    Thermometer = 2,
    /// Relative humidity reading
    Humidity = 3,
    /// Illuminance reading
    Illuminance = 4,
    /// Pressure and altitude reading
    Barometer = 5,
    /// CO2 concentration reading
    Co2 = 6,
    /// Opaque application bytes
    Buffer = 7,
    /// Peer added to the sender's directory
    Attach = 8,
    /// Peer removed from the sender's directory
    Detach = 9,
    /// Battery voltage and charge
    Battery = 10,
    /// Firmware identification string
    Info = 11,
    /// Set a boolean state on one node
    NodeStateSet = 12,
    /// Ask one node for a boolean state
    NodeStateGet = 13,
    /// Opaque bytes for one node
    NodeBuffer = 14,
}

impl MessageType {
    /// Parse a wire tag
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Enroll,
            1 => Self::PushButton,
            2 => Self::Thermometer,
            3 => Self::Humidity,
            4 => Self::Illuminance,
            5 => Self::Barometer,
            6 => Self::Co2,
            7 => Self::Buffer,
            8 => Self::Attach,
            9 => Self::Detach,
            10 => Self::Battery,
            11 => Self::Info,
            12 => Self::NodeStateSet,
            13 => Self::NodeStateGet,
            14 => Self::NodeBuffer,
            _ => return None,
        })
    }

    /// Wire tag
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MessageType {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "MessageType({=u8})", self.as_u8());
    }
}

/// Frame header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Address of the transmitting device
    pub sender: DeviceAddress,
    /// Rolling per-frame counter of the sender
    pub message_id: u16,
}

impl Header {
    /// Create a header
    #[must_use]
    pub const fn new(sender: DeviceAddress, message_id: u16) -> Self {
        Self { sender, message_id }
    }

    /// Encode to the 8 header bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..DeviceAddress::LEN].copy_from_slice(&self.sender.to_le_bytes());
        out[DeviceAddress::LEN..].copy_from_slice(&self.message_id.to_le_bytes());
        out
    }

    /// Parse the header at the start of a frame
    #[must_use]
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let sender = DeviceAddress::from_slice(frame)?;
        let id = frame.get(DeviceAddress::LEN..HEADER_LEN)?;
        Some(Self {
            sender,
            message_id: u16::from_le_bytes([id[0], id[1]]),
        })
    }
}

/// Reason a message could not be encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Variable-length content exceeds what one frame can carry
    TooLong,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => f.write_str("message does not fit in one frame"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EncodeError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::TooLong => defmt::write!(f, "TooLong"),
        }
    }
}

/// Decoded message payload
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Message<'a> {
    /// Enrollment request (tag only)
    Enroll,
    /// Push-button event counter
    PushButton {
        /// Number of presses since boot
        event_count: u16,
    },
    /// Temperature in °C
    Thermometer {
        /// Sensor channel (I2C bus / address selector)
        channel: u8,
        /// Temperature in °C
        temperature: f32,
    },
    /// Relative humidity in percent
    Humidity {
        /// Sensor channel
        channel: u8,
        /// Relative humidity in percent
        percentage: f32,
    },
    /// Illuminance in lux
    Illuminance {
        /// Sensor channel
        channel: u8,
        /// Illuminance in lux
        lux: f32,
    },
    /// Barometric pressure and derived altitude
    Barometer {
        /// Sensor channel
        channel: u8,
        /// Pressure in pascal
        pressure: f32,
        /// Altitude in metres
        altitude: f32,
    },
    /// CO2 concentration in ppm
    Co2 {
        /// Concentration in ppm
        concentration: f32,
    },
    /// Battery state
    Battery {
        /// Battery pack format identifier
        format: u8,
        /// Voltage in volts
        voltage: f32,
        /// Charge in percent
        percentage: f32,
    },
    /// Opaque application bytes
    Buffer(&'a [u8]),
    /// Firmware identification
    Info(&'a str),
    /// The sender added `target` to its directory
    Attach(DeviceAddress),
    /// The sender removed `target` from its directory
    Detach(DeviceAddress),
    /// Set a boolean state on `target`
    NodeStateSet {
        /// Addressed node
        target: DeviceAddress,
        /// Application-defined state slot
        state_id: u8,
        /// New value, None for "unknown"
        state: Option<bool>,
    },
    /// Request a boolean state from `target`
    NodeStateGet {
        /// Addressed node
        target: DeviceAddress,
        /// Application-defined state slot
        state_id: u8,
    },
    /// Opaque bytes for `target`
    NodeBuffer {
        /// Addressed node
        target: DeviceAddress,
        /// Raw bytes
        data: &'a [u8],
    },
}

impl<'a> Message<'a> {
    /// Type tag of this message
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Enroll => MessageType::Enroll,
            Self::PushButton { .. } => MessageType::PushButton,
            Self::Thermometer { .. } => MessageType::Thermometer,
            Self::Humidity { .. } => MessageType::Humidity,
            Self::Illuminance { .. } => MessageType::Illuminance,
            Self::Barometer { .. } => MessageType::Barometer,
            Self::Co2 { .. } => MessageType::Co2,
            Self::Battery { .. } => MessageType::Battery,
            Self::Buffer(_) => MessageType::Buffer,
            Self::Info(_) => MessageType::Info,
            Self::Attach(_) => MessageType::Attach,
            Self::Detach(_) => MessageType::Detach,
            Self::NodeStateSet { .. } => MessageType::NodeStateSet,
            Self::NodeStateGet { .. } => MessageType::NodeStateGet,
            Self::NodeBuffer { .. } => MessageType::NodeBuffer,
        }
    }

    /// Encode into a payload (type tag first)
    ///
    /// Info strings longer than [`MAX_INFO_LEN`] are truncated on a
    /// character boundary; oversized buffers are rejected.
    pub fn encode(&self) -> Result<Payload, EncodeError> {
        let mut out = Payload::new();
        let mut w = Writer(&mut out);
        w.put(&[self.message_type().as_u8()])?;

        match *self {
            Self::Enroll => {}
            Self::PushButton { event_count } => w.put(&event_count.to_le_bytes())?,
            Self::Thermometer { channel, temperature: value }
            | Self::Humidity { channel, percentage: value }
            | Self::Illuminance { channel, lux: value } => {
                w.put(&[channel])?;
                w.put(&value.to_le_bytes())?;
            }
            Self::Barometer { channel, pressure, altitude } => {
                w.put(&[channel])?;
                w.put(&pressure.to_le_bytes())?;
                w.put(&altitude.to_le_bytes())?;
            }
            Self::Co2 { concentration } => w.put(&concentration.to_le_bytes())?,
            Self::Battery { format, voltage, percentage } => {
                w.put(&[format])?;
                w.put(&voltage.to_le_bytes())?;
                w.put(&percentage.to_le_bytes())?;
            }
            Self::Buffer(data) => {
                if data.len() > MAX_BUFFER_LEN {
                    return Err(EncodeError::TooLong);
                }
                w.put(data)?;
            }
            Self::Info(firmware) => {
                w.put(truncate_str(firmware, MAX_INFO_LEN).as_bytes())?;
                w.put(&[0])?;
            }
            Self::Attach(target) | Self::Detach(target) => {
                w.put(&target.as_u64().to_le_bytes())?;
            }
            Self::NodeStateSet { target, state_id, state } => {
                w.put(&target.to_le_bytes())?;
                w.put(&[state_id, state.map_or(NULL_STATE, u8::from)])?;
            }
            Self::NodeStateGet { target, state_id } => {
                w.put(&target.to_le_bytes())?;
                w.put(&[state_id])?;
            }
            Self::NodeBuffer { target, data } => {
                if data.len() > MAX_NODE_BUFFER_LEN {
                    return Err(EncodeError::TooLong);
                }
                w.put(&target.to_le_bytes())?;
                w.put(data)?;
            }
        }

        Ok(out)
    }

    /// Decode a payload (type tag first)
    #[must_use]
    pub fn decode(payload: &'a [u8]) -> Option<Self> {
        let (&tag, body) = payload.split_first()?;

        match MessageType::from_u8(tag)? {
            MessageType::Enroll => body.is_empty().then_some(Self::Enroll),
            MessageType::PushButton => {
                let [lo, hi] = exact::<2>(body)?;
                Some(Self::PushButton {
                    event_count: u16::from_le_bytes([lo, hi]),
                })
            }
            MessageType::Thermometer => {
                let (channel, temperature) = channel_f32(body)?;
                Some(Self::Thermometer { channel, temperature })
            }
            MessageType::Humidity => {
                let (channel, percentage) = channel_f32(body)?;
                Some(Self::Humidity { channel, percentage })
            }
            MessageType::Illuminance => {
                let (channel, lux) = channel_f32(body)?;
                Some(Self::Illuminance { channel, lux })
            }
            MessageType::Barometer => {
                let b = exact::<9>(body)?;
                Some(Self::Barometer {
                    channel: b[0],
                    pressure: f32_at(&b, 1),
                    altitude: f32_at(&b, 5),
                })
            }
            MessageType::Co2 => {
                let b = exact::<4>(body)?;
                Some(Self::Co2 {
                    concentration: f32::from_le_bytes(b),
                })
            }
            MessageType::Battery => {
                let b = exact::<9>(body)?;
                Some(Self::Battery {
                    format: b[0],
                    voltage: f32_at(&b, 1),
                    percentage: f32_at(&b, 5),
                })
            }
            MessageType::Buffer => Some(Self::Buffer(body)),
            MessageType::Info => {
                let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
                core::str::from_utf8(&body[..end]).ok().map(Self::Info)
            }
            MessageType::Attach => announced_address(body).map(Self::Attach),
            MessageType::Detach => announced_address(body).map(Self::Detach),
            MessageType::NodeStateSet => {
                let b = exact::<8>(body)?;
                let state = match b[7] {
                    0 => Some(false),
                    1 => Some(true),
                    NULL_STATE => None,
                    _ => return None,
                };
                Some(Self::NodeStateSet {
                    target: DeviceAddress::from_slice(&b)?,
                    state_id: b[6],
                    state,
                })
            }
            MessageType::NodeStateGet => {
                let b = exact::<7>(body)?;
                Some(Self::NodeStateGet {
                    target: DeviceAddress::from_slice(&b)?,
                    state_id: b[6],
                })
            }
            MessageType::NodeBuffer => Some(Self::NodeBuffer {
                target: DeviceAddress::from_slice(body)?,
                data: &body[DeviceAddress::LEN..],
            }),
        }
    }
}

/// Prepend a header to an encoded payload
#[must_use]
pub fn encode_frame(header: &Header, payload: &[u8]) -> Option<Frame> {
    let mut frame = Frame::new();
    frame.extend_from_slice(&header.to_bytes()).ok()?;
    frame.extend_from_slice(payload).ok()?;
    Some(frame)
}

/// Split a received frame into header and decoded message
#[must_use]
pub fn decode_frame(frame: &[u8]) -> Option<(Header, Message<'_>)> {
    let header = Header::parse(frame)?;
    let message = Message::decode(frame.get(HEADER_LEN..)?)?;
    Some((header, message))
}

/// Bounded writer over a payload vector
struct Writer<'v>(&'v mut Payload);

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.0.extend_from_slice(bytes).map_err(|()| EncodeError::TooLong)
    }
}

fn exact<const N: usize>(body: &[u8]) -> Option<[u8; N]> {
    body.try_into().ok()
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn channel_f32(body: &[u8]) -> Option<(u8, f32)> {
    let b = exact::<5>(body)?;
    Some((b[0], f32_at(&b, 1)))
}

fn announced_address(body: &[u8]) -> Option<DeviceAddress> {
    DeviceAddress::new(u64::from_le_bytes(exact::<8>(body)?))
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
