//! Microsecond-resolution time base shared by the scheduler and every task.
//!
//! The flight computer has no calendar clock. Time is a 32-bit count of
//! microseconds assembled from a free-running 16-bit hardware counter and a
//! 16-bit software overflow count that the counter's own overflow interrupt
//! maintains. The composed value rolls over after a little more than 71
//! minutes; all arithmetic here is modular so a rollover between two samples
//! is indistinguishable from ordinary passage of time.

use core::fmt;

/// Microseconds per second, for rendering and interval math.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// A 32-bit monotonic microsecond count since power-on.
///
/// Wraps at 2^32 µs. Differences must always be taken with
/// [`TimeStamp::elapsed_since`] and orderings with [`TimeStamp::at_or_after`];
/// both remain correct across the wrap for spans shorter than 2^31 µs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TimeStamp(u32);

impl TimeStamp {
    /// The power-on epoch.
    pub const ZERO: TimeStamp = TimeStamp(0);

    /// Builds a timestamp from a raw microsecond count.
    #[must_use]
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    /// Raw microsecond count since the epoch, modulo 2^32.
    #[must_use]
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Whole seconds of the current 32-bit window.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.0 / MICROS_PER_SECOND
    }

    /// Microseconds into the current second.
    #[must_use]
    pub const fn subsec_micros(self) -> u32 {
        self.0 % MICROS_PER_SECOND
    }

    /// Advances the timestamp by `micros`, wrapping modularly.
    #[must_use]
    pub const fn wrapping_add_micros(self, micros: u32) -> Self {
        Self(self.0.wrapping_add(micros))
    }

    /// Microseconds elapsed since `earlier`, computed modulo 2^32.
    ///
    /// Correct even when the counter wrapped between the two samples: the
    /// "negative" difference is the wrapped span, not an error.
    #[must_use]
    pub const fn elapsed_since(self, earlier: TimeStamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Whether `self` is at or past `other` on the modular timeline.
    ///
    /// Interprets the modular difference as a signed span, so the answer is
    /// meaningful for timestamps less than 2^31 µs apart, far beyond any
    /// task interval this system schedules.
    #[must_use]
    pub const fn at_or_after(self, other: TimeStamp) -> bool {
        self.0.wrapping_sub(other.0) as i32 >= 0
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.seconds(), self.subsec_micros())
    }
}

/// One coherent sample of the hardware counter and its overflow count.
///
/// Producers guarantee coherence: `overflows` is the overflow count that was
/// current when `ticks` was read. The firmware driver achieves this with an
/// overflow-recheck read loop; simulated drivers derive both halves from one
/// integer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CounterSample {
    /// Live value of the 16-bit hardware counter (one tick per microsecond).
    pub ticks: u16,
    /// Number of times the counter has rolled over since power-on.
    pub overflows: u16,
}

impl CounterSample {
    /// Composes the two 16-bit halves into the 32-bit microsecond count.
    #[must_use]
    pub const fn compose(self) -> TimeStamp {
        TimeStamp(((self.overflows as u32) << 16) | self.ticks as u32)
    }
}

/// Hardware seam: something that can sample the free-running counter.
///
/// `sample` must not block and must not fail; a counter register that cannot
/// be read is a hard fault below this layer.
pub trait ClockDriver {
    /// Takes one coherent counter sample.
    fn sample(&mut self) -> CounterSample;
}

/// The monotonic clock every scheduler pass consults exactly once.
pub struct SystemClock<D: ClockDriver> {
    driver: D,
}

impl<D: ClockDriver> SystemClock<D> {
    /// Wraps a counter driver into a clock.
    pub const fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Current monotonic time. Never blocks.
    pub fn now(&mut self) -> TimeStamp {
        self.driver.sample().compose()
    }
}
