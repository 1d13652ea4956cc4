//! Cooperative round-robin scheduler.
//!
//! The main loop owns a fixed, ordered list of tasks and repeatedly offers
//! each one a single bounded step. Nothing here blocks: a task that is
//! waiting on a peripheral yields and is offered another step on the very
//! next pass, while its interval only gates when a *new* unit of work may
//! begin. A faulting task is reset to its safe state and the loop carries on;
//! no task failure can take down its neighbours.

use heapless::Vec;

use crate::clock::TimeStamp;

/// Outcome of one task step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// The current unit of work finished; wait out the interval before
    /// starting the next one.
    Complete,
    /// Work is mid-flight; offer another step on the next pass regardless of
    /// the interval.
    Yield,
}

/// Structured record of a step that could not be contained inside its task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TaskFault {
    /// Name of the offending task.
    pub task: &'static str,
    /// Task-specific fault code.
    pub code: u8,
}

/// A unit of cooperative work advanced by the scheduler.
///
/// Implementations decompose their work into short, non-blocking steps. Each
/// concrete task keeps its progress in a private state enum, so a state the
/// task does not recognise cannot be represented at all; the residual runtime
/// failures (a violated peripheral handshake, an exhausted internal budget)
/// surface as [`TaskFault`] and are contained by the scheduler.
pub trait Task {
    /// Stable name used in fault records and status output.
    fn name(&self) -> &'static str;

    /// Minimum number of microseconds between the starts of two successive
    /// units of work.
    fn interval(&self) -> u32;

    /// Performs at most one bounded unit of work. Must not block.
    fn step(&mut self, now: TimeStamp) -> Result<Step, TaskFault>;

    /// Forces the task back to its designated safe state after a fault.
    fn recover(&mut self) {}
}

struct Slot<'a> {
    task: &'a mut dyn Task,
    next_due: TimeStamp,
    /// Set while the task is mid-unit; overrides the interval gate.
    in_progress: bool,
}

/// Report for one scheduler pass.
#[derive(Debug)]
pub struct PassReport<const N: usize> {
    /// Number of task steps that ran this pass.
    pub steps: usize,
    /// Faults raised this pass, in task order.
    pub faults: Vec<TaskFault, N>,
}

impl<const N: usize> PassReport<N> {
    const fn empty() -> Self {
        Self {
            steps: 0,
            faults: Vec::new(),
        }
    }
}

/// Error returned when the fixed task list is already full.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TaskListFull;

/// Round-robin scheduler over a fixed task list.
///
/// Task order is fixed at registration and honoured on every pass; there is
/// no priority, so each task must bound its own per-step work to keep pass
/// latency predictable.
pub struct Scheduler<'a, const N: usize> {
    slots: Vec<Slot<'a>, N>,
    passes: u32,
    fault_count: u32,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    /// Creates a scheduler with an empty task list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            passes: 0,
            fault_count: 0,
        }
    }

    /// Appends a task to the round-robin order, first due at `first_due`.
    pub fn register(
        &mut self,
        task: &'a mut dyn Task,
        first_due: TimeStamp,
    ) -> Result<(), TaskListFull> {
        self.slots
            .push(Slot {
                task,
                next_due: first_due,
                in_progress: false,
            })
            .map_err(|_| TaskListFull)
    }

    /// Runs one pass: every due task is offered exactly one step.
    ///
    /// All tasks scheduled in the same pass observe the identical `now`
    /// snapshot. The caller samples the clock once per pass and loops forever.
    pub fn pass(&mut self, now: TimeStamp) -> PassReport<N> {
        let mut report = PassReport::empty();

        for slot in &mut self.slots {
            if !slot.in_progress && !now.at_or_after(slot.next_due) {
                continue;
            }

            report.steps += 1;
            match slot.task.step(now) {
                Ok(Step::Yield) => slot.in_progress = true,
                Ok(Step::Complete) => {
                    slot.in_progress = false;
                    slot.next_due = now.wrapping_add_micros(slot.task.interval());
                }
                Err(fault) => {
                    self.fault_count = self.fault_count.wrapping_add(1);
                    slot.task.recover();
                    slot.in_progress = false;
                    slot.next_due = now.wrapping_add_micros(slot.task.interval());
                    // The report is sized to hold one fault per task.
                    let _ = report.faults.push(fault);
                }
            }
        }

        self.passes = self.passes.wrapping_add(1);
        report
    }

    /// Number of passes run so far.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.passes
    }

    /// Total task faults contained so far.
    #[must_use]
    pub const fn fault_count(&self) -> u32 {
        self.fault_count
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.slots.len()
    }
}

impl<const N: usize> Default for Scheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
