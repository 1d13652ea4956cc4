//! Status summary surfaced by the `status` console command.

use core::fmt;

use crate::clock::TimeStamp;

/// Point-in-time counters describing the health of the loop.
///
/// The firmware and the emulator assemble this from the scheduler and the
/// reporting table each pass; rendering lives here so both front-ends print
/// the identical text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    /// Clock reading for the pass that produced the snapshot.
    pub uptime: TimeStamp,
    /// Scheduler passes completed.
    pub passes: u32,
    /// Task faults contained by the scheduler.
    pub task_faults: u32,
    /// Timeout sentinels recorded in the reporting table.
    pub conversion_timeouts: u32,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "up {} passes {} faults {} timeouts {}",
            self.uptime, self.passes, self.task_faults, self.conversion_timeouts
        )
    }
}
