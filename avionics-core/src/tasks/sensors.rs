//! Sensor sweep task.
//!
//! One sweep walks the configured wiring table in order and takes a single
//! conversion per channel. Every scheduler step performs at most one
//! converter operation (a start, a completion poll, or the read), so the
//! step cost is constant no matter how many channels are configured; a
//! full sweep simply takes more passes. A channel whose conversion never
//! completes is written as the timeout sentinel after a bounded number of
//! polls and the sweep moves on rather than wedging.

use crate::clock::TimeStamp;
use crate::config::SensorChannel;
use crate::convert::{AnalogConverter, TIMED_OUT};
use crate::sched::{Step, Task, TaskFault};
use crate::table::{ChannelReading, ReportTable};

/// Completion polls allowed per channel before the sentinel is written.
pub const DEFAULT_POLL_BUDGET: u32 = 1_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SweepState {
    /// About to start the conversion for the channel at `index`.
    Start { index: usize },
    /// Conversion outstanding for the channel at `index`; `polls` completion
    /// checks have come back negative so far.
    Wait { index: usize, polls: u32 },
}

/// Round-robin analog sampler over the wiring table.
///
/// The task owns the converter outright, so the single-conversion discipline
/// of [`AnalogConverter`] cannot be violated from outside.
pub struct SensorPoller<'a, A: AnalogConverter, const SLOTS: usize> {
    adc: A,
    table: &'a ReportTable<SLOTS>,
    channels: &'static [SensorChannel],
    interval_us: u32,
    poll_budget: u32,
    state: SweepState,
    sweeps: u32,
}

impl<'a, A: AnalogConverter, const SLOTS: usize> SensorPoller<'a, A, SLOTS> {
    /// Creates a sweep task over `channels`, publishing into `table`.
    pub const fn new(
        adc: A,
        table: &'a ReportTable<SLOTS>,
        channels: &'static [SensorChannel],
        interval_us: u32,
        poll_budget: u32,
    ) -> Self {
        Self {
            adc,
            table,
            channels,
            interval_us,
            poll_budget,
            state: SweepState::Start { index: 0 },
            sweeps: 0,
        }
    }

    /// Number of completed sweeps.
    #[must_use]
    pub const fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Records `value` for the channel at `index` and advances the sweep.
    fn finish_channel(&mut self, index: usize, value: u16, now: TimeStamp) -> Step {
        self.table.store(
            self.channels[index].slot,
            ChannelReading { value, stamp: now },
        );

        if index + 1 == self.channels.len() {
            self.state = SweepState::Start { index: 0 };
            self.sweeps = self.sweeps.wrapping_add(1);
            Step::Complete
        } else {
            self.state = SweepState::Start { index: index + 1 };
            Step::Yield
        }
    }
}

impl<A: AnalogConverter, const SLOTS: usize> Task for SensorPoller<'_, A, SLOTS> {
    fn name(&self) -> &'static str {
        "sensor-sweep"
    }

    fn interval(&self) -> u32 {
        self.interval_us
    }

    fn step(&mut self, now: TimeStamp) -> Result<Step, TaskFault> {
        match self.state {
            SweepState::Start { index: _ } if self.channels.is_empty() => {
                // Nothing wired; a sweep is trivially complete.
                Ok(Step::Complete)
            }
            SweepState::Start { index } => {
                self.adc.start(self.channels[index].channel);
                self.state = SweepState::Wait { index, polls: 0 };
                Ok(Step::Yield)
            }
            SweepState::Wait { index, polls } => {
                if self.adc.done() {
                    let value = self.adc.read();
                    return Ok(self.finish_channel(index, value, now));
                }

                let polls = polls + 1;
                if polls > self.poll_budget {
                    // Converter wedged on this channel: record the sentinel
                    // and move on so the rest of the sweep still happens.
                    return Ok(self.finish_channel(index, TIMED_OUT, now));
                }

                self.state = SweepState::Wait { index, polls };
                Ok(Step::Yield)
            }
        }
    }

    fn recover(&mut self) {
        self.state = SweepState::Start { index: 0 };
    }
}
