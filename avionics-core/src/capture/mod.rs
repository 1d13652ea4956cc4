//! Interrupt-driven pulse-width measurement for the RC control signal.
//!
//! An external interrupt timestamps each rising and falling transition of the
//! receiver's PWM line. The state machine lives entirely in interrupt
//! context; the only value that crosses into the main loop is the latest
//! completed pulse, published through [`PulseCell`] so the reader can never
//! observe a torn measurement. A pulse that completes before the previous one
//! was consumed silently supersedes it: accepted data loss, since the
//! consumer always wants the freshest measurement anyway.

use portable_atomic::{AtomicU32, Ordering};

use crate::clock::TimeStamp;

/// Direction of a digital transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
}

/// One timestamped transition, produced in interrupt context.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeEvent {
    /// Time the interrupt sampled the clock.
    pub at: TimeStamp,
    /// Which way the line went.
    pub edge: Edge,
}

/// A completed high pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseMeasurement {
    /// Width of the pulse in microseconds.
    pub width_us: u32,
    /// Timestamp of the falling edge that completed the pulse.
    pub completed_at: TimeStamp,
}

/// Single-slot publication cell between one interrupt writer and one
/// main-loop reader.
///
/// A sequence counter brackets every write: the writer bumps it to an odd
/// value, stores the payload words, then bumps it to the next even value. A
/// reader that sees an odd or changed counter retries. On a single core the
/// interrupt that interrupted the read has finished by the time the reader
/// resumes, so the retry loop terminates immediately. The counter starts at
/// zero, which doubles as the "nothing published yet" marker.
pub struct PulseCell {
    seq: AtomicU32,
    width_us: AtomicU32,
    completed_at: AtomicU32,
}

impl PulseCell {
    /// Creates an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            width_us: AtomicU32::new(0),
            completed_at: AtomicU32::new(0),
        }
    }

    /// Publishes a completed pulse, overwriting any unconsumed one.
    ///
    /// Single-producer: must only be called from the one interrupt context
    /// that owns the capture state machine.
    pub fn publish(&self, measurement: PulseMeasurement) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Release);
        self.width_us
            .store(measurement.width_us, Ordering::Relaxed);
        self.completed_at
            .store(measurement.completed_at.as_micros(), Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Reads the latest completed pulse, or `None` before the first one.
    ///
    /// Re-reading without an intervening publish returns the same
    /// measurement; the consumer's read rate is decoupled from the pulse
    /// rate.
    pub fn latest(&self) -> Option<PulseMeasurement> {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before == 0 {
                return None;
            }
            if before & 1 != 0 {
                // Writer mid-flight; it has already finished by the time we
                // run again on a single core.
                continue;
            }

            let width_us = self.width_us.load(Ordering::Relaxed);
            let completed_at = self.completed_at.load(Ordering::Relaxed);

            let after = self.seq.load(Ordering::Acquire);
            if before == after {
                return Some(PulseMeasurement {
                    width_us,
                    completed_at: TimeStamp::from_micros(completed_at),
                });
            }
        }
    }
}

impl Default for PulseCell {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum CaptureState {
    /// No edge seen yet.
    Idle,
    /// Rising edge recorded; waiting for the line to fall.
    HaveRising(TimeStamp),
    /// A pulse completed; its measurement is readable until overwritten.
    HavePulse,
}

/// The interrupt-side edge state machine.
///
/// `record_edge` runs in interrupt context, logically concurrent with the
/// scheduler; everything it shares with the main loop goes through the cell.
pub struct PulseCapture<'a> {
    state: CaptureState,
    cell: &'a PulseCell,
}

impl<'a> PulseCapture<'a> {
    /// Creates a capture unit publishing into `cell`.
    #[must_use]
    pub const fn new(cell: &'a PulseCell) -> Self {
        Self {
            state: CaptureState::Idle,
            cell,
        }
    }

    /// Feeds one timestamped edge into the state machine.
    pub fn record_edge(&mut self, event: EdgeEvent) {
        match (self.state, event.edge) {
            // A rising edge always begins a new measurement. Seeing one while
            // already high means the falling edge was missed; the fresher
            // timestamp wins.
            (_, Edge::Rising) => {
                self.state = CaptureState::HaveRising(event.at);
            }
            (CaptureState::HaveRising(rose_at), Edge::Falling) => {
                self.cell.publish(PulseMeasurement {
                    width_us: event.at.elapsed_since(rose_at),
                    completed_at: event.at,
                });
                self.state = CaptureState::HavePulse;
            }
            // A falling edge with no rising edge on record is noise.
            (CaptureState::Idle | CaptureState::HavePulse, Edge::Falling) => {}
        }
    }

    /// Whether the line is currently between a rising and a falling edge.
    #[must_use]
    pub fn mid_pulse(&self) -> bool {
        matches!(self.state, CaptureState::HaveRising(_))
    }
}
