//! Radio link contract and modem bring-up.
//!
//! The ground link is a serial radio modem. The transport itself is a thin
//! byte pipe implemented by the firmware (USART plus an optional clear-to-send
//! line) and by the bench tooling (in-memory buffers); this module owns the
//! contract both sides implement and the modem's command-mode configuration
//! dialogue. Every wait in the transport is bounded: a link that cannot
//! accept a byte eventually reports a transmit failure upward instead of
//! stalling the loop forever.

use crate::clock::TimeStamp;

/// Transmit failures surfaced by a [`SerialLink`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkError {
    /// The clear-to-send line never went ready within the retry budget.
    CtsTimeout,
    /// The transmitter never accepted the byte within the retry budget.
    TransmitTimeout,
}

/// Byte-oriented transport to the ground station.
///
/// `send` honours flow control with a bounded retry count. `recv` never
/// blocks; callers that need to wait poll through [`SerialLink::recv_with_retries`].
pub trait SerialLink {
    /// Sends one byte, or reports a bounded-wait failure.
    fn send(&mut self, byte: u8) -> Result<(), LinkError>;

    /// Sends every byte of `text`, stopping at the first failure.
    fn send_str(&mut self, text: &str) -> Result<(), LinkError> {
        for byte in text.bytes() {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Takes the next received byte, if one is waiting.
    fn recv(&mut self) -> Option<u8>;

    /// Polls for a byte up to `retries` times.
    fn recv_with_retries(&mut self, retries: u32) -> Option<u8> {
        for _ in 0..retries {
            if let Some(byte) = self.recv() {
                return Some(byte);
            }
        }
        None
    }
}

/// Microseconds of radio guard time before and after the escape sequence.
pub const GUARD_TIME_US: u32 = 1_000_000;

/// Receive polls allowed while waiting for each response byte.
pub const RESPONSE_RETRIES: u32 = 50_000;

/// Command-mode dialogue: sleep mode 1, write to flash, exit command mode.
const SLEEP_MODE_COMMAND: &str = "ATSM1,WR,CN\r\n";

/// Failures during modem bring-up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SetupError {
    /// The modem answered with the wrong byte (or nothing at all).
    UnexpectedResponse {
        expected: u8,
        got: Option<u8>,
    },
    /// The transport itself failed.
    Link(LinkError),
}

impl From<LinkError> for SetupError {
    fn from(error: LinkError) -> Self {
        SetupError::Link(error)
    }
}

/// The radio modem wrapped around its serial transport.
///
/// Configuration happens once at boot, before the scheduler loop starts, so
/// the guard delays here may simply spin on the clock.
pub struct RadioModem<L: SerialLink> {
    link: L,
}

impl<L: SerialLink> RadioModem<L> {
    /// Wraps a transport.
    pub const fn new(link: L) -> Self {
        Self { link }
    }

    /// Returns the transport for normal traffic once setup is done.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Puts the modem into pin-sleep mode 1 via the command-mode dialogue.
    ///
    /// `delay` must busy-wait for the requested number of microseconds; the
    /// modem rejects the escape sequence unless it is preceded by radio
    /// silence for its guard time.
    pub fn setup(&mut self, mut delay: impl FnMut(u32)) -> Result<(), SetupError> {
        delay(GUARD_TIME_US);
        self.link.send_str("+++")?;
        self.expect_ok()?;

        self.link.send_str(SLEEP_MODE_COMMAND)?;
        self.expect_ok()?;

        Ok(())
    }

    fn expect_ok(&mut self) -> Result<(), SetupError> {
        for expected in *b"OK\r" {
            let got = self.link.recv_with_retries(RESPONSE_RETRIES);
            if got != Some(expected) {
                return Err(SetupError::UnexpectedResponse { expected, got });
            }
        }
        Ok(())
    }
}

/// Renders one reporting line for a table entry.
///
/// The format on the wire is `<timestamp> <value>\r\n`, timestamp in seconds
/// with a six-digit microsecond fraction.
#[must_use]
pub fn render_report_line(stamp: TimeStamp, value: u16) -> heapless::String<24> {
    use core::fmt::Write;

    let mut line = heapless::String::new();
    // Worst case is 22 bytes ("4294.967295 65535\r\n"); the buffer fits it.
    let _ = write!(line, "{stamp} {value}\r\n");
    line
}
