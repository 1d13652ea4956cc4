//! Timing properties of the sensor sweep under the scheduler: bounded
//! per-pass work, bounded timeout recovery, and interval-gated sweep starts.

use avionics_core::clock::TimeStamp;
use avionics_core::config::SensorChannel;
use avionics_core::convert::{AnalogConverter, Channel};
use avionics_core::sched::Scheduler;
use avionics_core::table::ReportTable;
use avionics_core::tasks::SensorPoller;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct ConverterLog {
    starts: u32,
    polls: u32,
    reads: u32,
}

/// Converter that counts every operation and can wedge selected channels.
struct CountingConverter {
    log: Rc<RefCell<ConverterLog>>,
    wedged: &'static [u8],
    pending: Option<Channel>,
}

impl AnalogConverter for CountingConverter {
    fn start(&mut self, channel: Channel) {
        assert!(self.pending.is_none(), "single-conversion rule violated");
        self.log.borrow_mut().starts += 1;
        self.pending = Some(channel);
    }

    fn done(&self) -> bool {
        self.log.borrow_mut().polls += 1;
        self.pending
            .is_some_and(|c| !self.wedged.contains(&c.index()))
    }

    fn read(&mut self) -> u16 {
        self.log.borrow_mut().reads += 1;
        u16::from(self.pending.take().unwrap().index()) * 10
    }
}

const fn channel(index: u8) -> Channel {
    match Channel::new(index) {
        Some(channel) => channel,
        None => panic!("bad channel"),
    }
}

static FOUR_CHANNELS: [SensorChannel; 4] = [
    SensorChannel::new("a", channel(0), 0),
    SensorChannel::new("b", channel(1), 1),
    SensorChannel::new("c", channel(2), 2),
    SensorChannel::new("d", channel(3), 3),
];

#[test]
fn per_pass_converter_work_is_constant() {
    let log = Rc::new(RefCell::new(ConverterLog::default()));
    let table: ReportTable<4> = ReportTable::new();
    let mut task = SensorPoller::new(
        CountingConverter {
            log: log.clone(),
            wedged: &[],
            pending: None,
        },
        &table,
        &FOUR_CHANNELS,
        1_000,
        1_000,
    );

    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut task, TimeStamp::ZERO).unwrap();

    let mut previous_total = 0;
    for i in 0..8u32 {
        scheduler.pass(TimeStamp::from_micros(i));
        let log = log.borrow();
        let total = log.starts + log.polls + log.reads;
        // No pass may issue more than two converter operations (one
        // completion poll plus the read, or a single start).
        assert!(total - previous_total <= 2, "pass {i} did too much work");
        previous_total = total;
    }

    // Eight passes complete the four-channel sweep.
    assert_eq!(table.load(3).unwrap().value, 30);
}

#[test]
fn a_wedged_channel_delays_but_never_stalls_the_sweep() {
    let log = Rc::new(RefCell::new(ConverterLog::default()));
    let budget = 50;
    let table: ReportTable<4> = ReportTable::new();
    let mut task = SensorPoller::new(
        CountingConverter {
            log,
            wedged: &[1],
            pending: None,
        },
        &table,
        &FOUR_CHANNELS,
        1_000,
        budget,
    );

    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut task, TimeStamp::ZERO).unwrap();

    // Channel 1 burns its poll budget; the sweep still finishes in a bounded
    // number of passes: 2 per healthy channel, budget + 2 for the wedged one.
    let passes = 3 * 2 + budget + 2;
    for i in 0..passes {
        scheduler.pass(TimeStamp::from_micros(i));
    }

    assert!(table.load(1).unwrap().timed_out());
    assert_eq!(table.timeout_count(), 1);
    assert_eq!(table.load(0).unwrap().value, 0);
    assert_eq!(table.load(2).unwrap().value, 20);
    assert_eq!(table.load(3).unwrap().value, 30);
}

#[test]
fn sweeps_start_on_the_interval_not_back_to_back() {
    let log = Rc::new(RefCell::new(ConverterLog::default()));
    let table: ReportTable<4> = ReportTable::new();
    let interval = 10_000;
    let mut task = SensorPoller::new(
        CountingConverter {
            log,
            wedged: &[],
            pending: None,
        },
        &table,
        &FOUR_CHANNELS,
        interval,
        1_000,
    );

    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut task, TimeStamp::ZERO).unwrap();

    // First sweep: 8 passes over 8 µs of simulated time.
    let mut steps = 0;
    for i in 0..8u32 {
        steps += scheduler.pass(TimeStamp::from_micros(i)).steps;
    }
    assert_eq!(steps, 8);

    // Sweep complete; idle until the interval elapses.
    let report = scheduler.pass(TimeStamp::from_micros(500));
    assert_eq!(report.steps, 0);

    // Past the interval the next sweep begins.
    let report = scheduler.pass(TimeStamp::from_micros(7 + interval));
    assert_eq!(report.steps, 1);
}
