//! Non-blocking analog conversion contract.
//!
//! The converter hardware runs one conversion at a time with no queue. The
//! split into `start` / `done` / `read` is what lets a task take an analog
//! sample without ever blocking the shared loop: the task starts a
//! conversion, yields, and polls completion on later passes.

use core::fmt;

/// Number of selectable analog inputs.
pub const CHANNEL_COUNT: usize = 8;

/// Sentinel sample value recorded when a conversion never completed.
pub const TIMED_OUT: u16 = 0xFFFF;

/// A validated analog input identifier in `0..8`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Channel(u8);

impl Channel {
    /// Builds a channel from its mux index, rejecting out-of-range values.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// The channel's mux index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Hardware seam for the one-at-a-time analog converter.
///
/// Exactly one conversion may be outstanding. Calling `start` again before
/// the previous result has been consumed is undefined and must be prevented
/// by the owning task's state machine; the converter does not police it.
/// `read` is only valid once `done` has reported `true`; that is caller
/// discipline, not enforced here.
pub trait AnalogConverter {
    /// Begins a conversion on `channel` and returns immediately.
    fn start(&mut self, channel: Channel);

    /// Polls, without blocking, whether the outstanding conversion finished.
    fn done(&self) -> bool;

    /// Returns the completed result.
    fn read(&mut self) -> u16;
}
