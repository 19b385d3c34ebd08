//! Framed byte queue
//!
//! FIFO of variable-length messages packed into a fixed byte buffer. Each
//! message is stored behind a one-byte length prefix, so a 128-byte queue
//! holds nine 13-byte telemetry messages but only one full 64-byte frame
//! (65 bytes with its prefix). A second full frame is refused until the
//! first one is popped.

use core::fmt;

use heapless::Deque;

/// Push failed because the message does not fit in the remaining space
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue full")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for QueueFull {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "QueueFull");
    }
}

/// Fixed-capacity queue of length-prefixed messages
pub struct FrameQueue<const N: usize> {
    bytes: Deque<u8, N>,
    messages: usize,
}

impl<const N: usize> FrameQueue<N> {
    /// Longest message a single entry can hold
    pub const MAX_MESSAGE_LEN: usize = if N - 1 < 255 { N - 1 } else { 255 };

    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Deque::new(),
            messages: 0,
        }
    }

    /// Append a message; the queue is left untouched on failure
    pub fn push(&mut self, message: &[u8]) -> Result<(), QueueFull> {
        if message.len() > Self::MAX_MESSAGE_LEN || message.len() + 1 > self.free() {
            return Err(QueueFull);
        }

        #[allow(clippy::cast_possible_truncation)]
        let len = message.len() as u8;
        self.bytes.push_back(len).map_err(|_| QueueFull)?;
        for &byte in message {
            self.bytes.push_back(byte).map_err(|_| QueueFull)?;
        }
        self.messages += 1;
        Ok(())
    }

    /// Remove the oldest message, copying it into `out`
    ///
    /// Returns the number of bytes copied. A message longer than `out` is
    /// truncated but still consumed as a whole.
    pub fn pop_into(&mut self, out: &mut [u8]) -> Option<usize> {
        let len = usize::from(self.bytes.pop_front()?);
        let mut copied = 0;
        for i in 0..len {
            let Some(byte) = self.bytes.pop_front() else {
                break;
            };
            if let Some(slot) = out.get_mut(i) {
                *slot = byte;
                copied += 1;
            }
        }
        self.messages -= 1;
        Some(copied)
    }

    /// Number of queued messages
    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages
    }

    /// Check if no message is queued
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages == 0
    }

    /// Free bytes, length prefixes included
    #[must_use]
    pub fn free(&self) -> usize {
        N - self.bytes.len()
    }

    /// Drop every queued message
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.messages = 0;
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
