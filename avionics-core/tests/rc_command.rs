//! RC command path: edges recorded "in interrupt context" between scheduler
//! passes must flow through the pulse cell into the reporting table at the
//! tracker's own rate.

use avionics_core::capture::{Edge, EdgeEvent, PulseCapture, PulseCell};
use avionics_core::clock::TimeStamp;
use avionics_core::sched::Scheduler;
use avionics_core::table::ReportTable;
use avionics_core::tasks::ActuatorTracker;
use avionics_core::tasks::actuator::pulse_to_position;

fn edge(at: u32, edge: Edge) -> EdgeEvent {
    EdgeEvent {
        at: TimeStamp::from_micros(at),
        edge,
    }
}

#[test]
fn commands_follow_the_most_recent_complete_pulse() {
    let pulses = PulseCell::new();
    let mut capture = PulseCapture::new(&pulses);
    let table: ReportTable<1> = ReportTable::new();
    let mut tracker = ActuatorTracker::new(&pulses, &table, 0, 10_000);

    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut tracker, TimeStamp::ZERO).unwrap();

    // No pulse yet: the first pass stores nothing.
    scheduler.pass(TimeStamp::from_micros(0));
    assert!(table.load(0).is_none());

    // First RC frame: 1.2 ms pulse.
    capture.record_edge(edge(2_000, Edge::Rising));
    capture.record_edge(edge(3_200, Edge::Falling));

    scheduler.pass(TimeStamp::from_micros(10_000));
    assert_eq!(table.load(0).unwrap().value, pulse_to_position(1_200));

    // Two frames arrive between task steps; only the newest one counts.
    capture.record_edge(edge(22_000, Edge::Rising));
    capture.record_edge(edge(23_400, Edge::Falling));
    capture.record_edge(edge(42_000, Edge::Rising));
    capture.record_edge(edge(43_900, Edge::Falling));

    scheduler.pass(TimeStamp::from_micros(50_000));
    assert_eq!(table.load(0).unwrap().value, pulse_to_position(1_900));
}

#[test]
fn a_half_finished_pulse_leaves_the_previous_command_active() {
    let pulses = PulseCell::new();
    let mut capture = PulseCapture::new(&pulses);
    let table: ReportTable<1> = ReportTable::new();
    let mut tracker = ActuatorTracker::new(&pulses, &table, 0, 10_000);

    let mut scheduler: Scheduler<'_, 1> = Scheduler::new();
    scheduler.register(&mut tracker, TimeStamp::ZERO).unwrap();

    capture.record_edge(edge(100, Edge::Rising));
    capture.record_edge(edge(1_600, Edge::Falling));
    scheduler.pass(TimeStamp::from_micros(5_000));

    // The next frame's rising edge has arrived but not its falling edge.
    capture.record_edge(edge(20_100, Edge::Rising));
    scheduler.pass(TimeStamp::from_micros(15_000));

    // Still the 1.5 ms command, restamped at the newer task step.
    let reading = table.load(0).unwrap();
    assert_eq!(reading.value, pulse_to_position(1_500));
    assert_eq!(reading.stamp, TimeStamp::from_micros(15_000));
}
