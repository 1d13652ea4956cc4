//! Actuator command task.
//!
//! The RC receiver encodes the pilot's stick position as the width of a
//! periodic high pulse. The edge-capture interrupt measures those pulses; this
//! task reads the latest completed measurement at its own rate, converts the
//! width into a commanded actuator position, and publishes it to the
//! reporting table. Reading the same pulse twice is normal; the task rate
//! and the RC frame rate are deliberately decoupled.

use crate::capture::PulseCell;
use crate::clock::TimeStamp;
use crate::sched::{Step, Task, TaskFault};
use crate::table::{ChannelReading, ReportTable};

/// Shortest servo pulse the transmitter produces (full deflection one way).
pub const SERVO_PULSE_MIN_US: u32 = 1_000;

/// Longest servo pulse the transmitter produces (full deflection the other).
pub const SERVO_PULSE_MAX_US: u32 = 2_000;

/// Measurements outside this window are electrical noise, not commands.
pub const PLAUSIBLE_PULSE_MIN_US: u32 = 600;
pub const PLAUSIBLE_PULSE_MAX_US: u32 = 2_400;

/// Full-scale commanded position.
pub const POSITION_FULL_SCALE: u16 = 1_023;

/// Maps a pulse width onto the commanded position range.
///
/// Widths are clamped to the servo envelope first, so a transmitter that
/// overshoots the envelope saturates instead of wrapping.
#[must_use]
pub fn pulse_to_position(width_us: u32) -> u16 {
    let clamped = width_us.clamp(SERVO_PULSE_MIN_US, SERVO_PULSE_MAX_US);
    let offset = clamped - SERVO_PULSE_MIN_US;
    let span = SERVO_PULSE_MAX_US - SERVO_PULSE_MIN_US;
    (offset * u32::from(POSITION_FULL_SCALE) / span) as u16
}

/// Task that turns captured RC pulses into commanded positions.
pub struct ActuatorTracker<'a, const SLOTS: usize> {
    pulses: &'a PulseCell,
    table: &'a ReportTable<SLOTS>,
    slot: usize,
    interval_us: u32,
    discarded: u32,
}

impl<'a, const SLOTS: usize> ActuatorTracker<'a, SLOTS> {
    /// Creates a tracker reading `pulses` and publishing into `slot`.
    pub const fn new(
        pulses: &'a PulseCell,
        table: &'a ReportTable<SLOTS>,
        slot: usize,
        interval_us: u32,
    ) -> Self {
        Self {
            pulses,
            table,
            slot,
            interval_us,
            discarded: 0,
        }
    }

    /// Number of measurements rejected as implausible.
    #[must_use]
    pub const fn discarded(&self) -> u32 {
        self.discarded
    }
}

impl<const SLOTS: usize> Task for ActuatorTracker<'_, SLOTS> {
    fn name(&self) -> &'static str {
        "actuator-track"
    }

    fn interval(&self) -> u32 {
        self.interval_us
    }

    fn step(&mut self, now: TimeStamp) -> Result<Step, TaskFault> {
        if let Some(pulse) = self.pulses.latest() {
            if (PLAUSIBLE_PULSE_MIN_US..=PLAUSIBLE_PULSE_MAX_US).contains(&pulse.width_us) {
                self.table.store(
                    self.slot,
                    ChannelReading {
                        value: pulse_to_position(pulse.width_us),
                        stamp: now,
                    },
                );
            } else {
                // Noise spike or a glitched edge pair; the previous command
                // stands.
                self.discarded = self.discarded.wrapping_add(1);
            }
        }
        Ok(Step::Complete)
    }
}
