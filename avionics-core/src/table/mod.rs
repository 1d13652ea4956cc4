//! Shared per-channel reporting table.
//!
//! Each task owns a disjoint set of slots and stores whole readings into
//! them; the radio console is the single reader. A reading (16-bit sample
//! plus 32-bit timestamp) is packed into one 64-bit atomic word, so every
//! store is observed in its entirety. There is no locking primitive on this
//! hardware and none is needed.

use portable_atomic::{AtomicU32, AtomicU64, Ordering};

use crate::clock::TimeStamp;
use crate::convert::TIMED_OUT;

/// One sample with the time it was taken.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelReading {
    /// Converter sample, or [`TIMED_OUT`] when the conversion never finished.
    pub value: u16,
    /// Scheduler-pass timestamp under which the sample was stored.
    pub stamp: TimeStamp,
}

impl ChannelReading {
    /// Whether this reading is the timeout sentinel rather than a sample.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.value == TIMED_OUT
    }
}

// Packed slot layout: bits 0..16 value, bits 16..48 timestamp, bit 48 set
// once the slot has been written. Zero therefore means "never written".
const OCCUPIED: u64 = 1 << 48;

const fn pack(reading: ChannelReading) -> u64 {
    OCCUPIED | ((reading.stamp.as_micros() as u64) << 16) | reading.value as u64
}

const fn unpack(raw: u64) -> Option<ChannelReading> {
    if raw & OCCUPIED == 0 {
        return None;
    }
    Some(ChannelReading {
        value: (raw & 0xFFFF) as u16,
        stamp: TimeStamp::from_micros(((raw >> 16) & 0xFFFF_FFFF) as u32),
    })
}

/// Fixed-size table of atomically stored readings.
pub struct ReportTable<const SLOTS: usize> {
    slots: [AtomicU64; SLOTS],
    timeouts: AtomicU32,
}

impl<const SLOTS: usize> ReportTable<SLOTS> {
    /// Creates a table with every slot empty.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU64::new(0) }; SLOTS],
            timeouts: AtomicU32::new(0),
        }
    }

    /// Stores a whole reading into `slot`.
    ///
    /// Timeout sentinels additionally bump the table-wide timeout counter.
    /// Each slot must have exactly one writing task; the reader may run at
    /// any time.
    pub fn store(&self, slot: usize, reading: ChannelReading) {
        if reading.timed_out() {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
        self.slots[slot].store(pack(reading), Ordering::Release);
    }

    /// Loads the current reading of `slot`, or `None` if never written.
    pub fn load(&self, slot: usize) -> Option<ChannelReading> {
        unpack(self.slots[slot].load(Ordering::Acquire))
    }

    /// Number of timeout sentinels stored since power-on.
    pub fn timeout_count(&self) -> u32 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Number of slots in the table.
    #[must_use]
    pub const fn len(&self) -> usize {
        SLOTS
    }

    /// Whether the table has no slots at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        SLOTS == 0
    }

    /// Iterates the table in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Option<ChannelReading>> + '_ {
        self.slots
            .iter()
            .map(|slot| unpack(slot.load(Ordering::Acquire)))
    }
}

impl<const SLOTS: usize> Default for ReportTable<SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}
