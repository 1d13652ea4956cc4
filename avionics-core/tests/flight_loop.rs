//! End-to-end loop test: clock, scheduler, both tasks, table, and console
//! wired together the way the firmware wires them, driven by simulated
//! hardware.

use avionics_core::capture::{Edge, EdgeEvent, PulseCapture, PulseCell};
use avionics_core::clock::{ClockDriver, CounterSample, SystemClock, TimeStamp};
use avionics_core::config::{FLIGHT_CHANNELS, RC_COMMAND_SLOT, REPORT_SLOTS};
use avionics_core::console::{Console, StatusSnapshot};
use avionics_core::convert::{AnalogConverter, Channel};
use avionics_core::link::{LinkError, SerialLink};
use avionics_core::sched::Scheduler;
use avionics_core::table::ReportTable;
use avionics_core::tasks::{ActuatorTracker, SensorPoller};

use std::cell::Cell;
use std::rc::Rc;

/// Simulated microsecond counter the test advances by hand.
struct BenchCounter {
    micros: Rc<Cell<u64>>,
}

impl ClockDriver for BenchCounter {
    fn sample(&mut self) -> CounterSample {
        let total = self.micros.get();
        CounterSample {
            ticks: (total & 0xFFFF) as u16,
            overflows: ((total >> 16) & 0xFFFF) as u16,
        }
    }
}

/// Converter returning `100 + channel` after one completion poll.
struct BenchConverter {
    pending: Option<Channel>,
}

impl AnalogConverter for BenchConverter {
    fn start(&mut self, channel: Channel) {
        assert!(self.pending.is_none(), "single-conversion rule violated");
        self.pending = Some(channel);
    }

    fn done(&self) -> bool {
        self.pending.is_some()
    }

    fn read(&mut self) -> u16 {
        let channel = self.pending.take().unwrap();
        100 + u16::from(channel.index())
    }
}

struct BenchLink {
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
}

impl SerialLink for BenchLink {
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        self.outgoing.push(byte);
        Ok(())
    }

    fn recv(&mut self) -> Option<u8> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }
}

#[test]
fn a_full_sweep_lands_in_the_report() {
    let micros = Rc::new(Cell::new(0_u64));
    let mut clock = SystemClock::new(BenchCounter {
        micros: micros.clone(),
    });

    let table: ReportTable<REPORT_SLOTS> = ReportTable::new();
    let pulses = PulseCell::new();
    let mut capture = PulseCapture::new(&pulses);

    let mut sensors = SensorPoller::new(
        BenchConverter { pending: None },
        &table,
        &FLIGHT_CHANNELS,
        20_000,
        1_000,
    );
    let mut tracker = ActuatorTracker::new(&pulses, &table, RC_COMMAND_SLOT, 50_000);

    let mut scheduler: Scheduler<'_, 2> = Scheduler::new();
    scheduler.register(&mut sensors, TimeStamp::ZERO).unwrap();
    scheduler.register(&mut tracker, TimeStamp::ZERO).unwrap();

    // One RC frame arrives before the loop starts: 1.6 ms high pulse.
    capture.record_edge(EdgeEvent {
        at: TimeStamp::from_micros(100),
        edge: Edge::Rising,
    });
    capture.record_edge(EdgeEvent {
        at: TimeStamp::from_micros(1_700),
        edge: Edge::Falling,
    });

    // Run enough passes for a full sweep: two passes per channel plus the
    // tracker's single step, advancing simulated time between passes.
    for _ in 0..(FLIGHT_CHANNELS.len() * 2 + 2) {
        micros.set(micros.get() + 50);
        let now = clock.now();
        let report = scheduler.pass(now);
        assert!(report.faults.is_empty());
    }

    // Every sensor slot carries its channel's value.
    for entry in &FLIGHT_CHANNELS {
        let reading = table.load(entry.slot).unwrap();
        assert_eq!(reading.value, 100 + u16::from(entry.channel.index()));
    }

    // The RC command slot carries the scaled 1.6 ms pulse.
    let command = table.load(RC_COMMAND_SLOT).unwrap();
    assert_eq!(command.value, (600_u32 * 1_023 / 1_000) as u16);

    // Sensor timestamps never decrease in sweep order.
    let stamps: Vec<u32> = FLIGHT_CHANNELS
        .iter()
        .map(|entry| table.load(entry.slot).unwrap().stamp.as_micros())
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));

    // The ground station asks for a report and gets one line per slot.
    let mut link = BenchLink {
        incoming: b"report\r".to_vec(),
        outgoing: Vec::new(),
    };
    let mut console = Console::new();
    let status = StatusSnapshot {
        uptime: clock.now(),
        passes: scheduler.passes(),
        task_faults: scheduler.fault_count(),
        conversion_timeouts: table.timeout_count(),
    };
    console.poll(&mut link, &table, status).unwrap();

    let output = String::from_utf8(link.outgoing).unwrap();
    assert_eq!(output.lines().count(), REPORT_SLOTS);
    for line in output.lines() {
        let (stamp, value) = line.split_once(' ').unwrap();
        assert!(stamp.contains('.'));
        value.parse::<u16>().unwrap();
    }
}

#[test]
fn the_loop_keeps_time_across_counter_wraparound() {
    // Start the simulated counter just shy of the 32-bit wrap and make sure
    // scheduling cadence is unaffected while the clock rolls over.
    let micros = Rc::new(Cell::new(u64::from(u32::MAX) - 200));
    let mut clock = SystemClock::new(BenchCounter {
        micros: micros.clone(),
    });

    let table: ReportTable<REPORT_SLOTS> = ReportTable::new();
    let mut sensors = SensorPoller::new(
        BenchConverter { pending: None },
        &table,
        &FLIGHT_CHANNELS,
        1_000,
        1_000,
    );

    let first_due = clock.now();
    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut sensors, first_due).unwrap();

    let mut steps_run = 0;
    for _ in 0..(FLIGHT_CHANNELS.len() * 2) {
        micros.set(micros.get() + 40);
        let report = scheduler.pass(clock.now());
        steps_run += report.steps;
    }

    // The wrap happened mid-run; every pass still stepped the sweep.
    assert!(u64::from(u32::MAX) < micros.get());
    assert_eq!(steps_run, FLIGHT_CHANNELS.len() * 2);
    for entry in &FLIGHT_CHANNELS {
        assert!(table.load(entry.slot).is_some());
    }
}
