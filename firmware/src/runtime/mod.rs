//! MCU runtime: hardware bring-up and the scheduler loop.
//!
//! Construction order mirrors the flight procedure: time base first, then the
//! peripherals, then the radio greeting, and finally the loop that never
//! exits. There is no graceful shutdown path; power removal is the shutdown.

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Pull};

use avionics_core::clock::SystemClock;
use avionics_core::config::{FLIGHT_CHANNELS, RC_COMMAND_SLOT, REPORT_SLOTS};
use avionics_core::console::{Console, StatusSnapshot};
use avionics_core::link::{RadioModem, SerialLink as _};
use avionics_core::sched::Scheduler;
use avionics_core::table::ReportTable;
use avionics_core::tasks::sensors::DEFAULT_POLL_BUDGET;
use avionics_core::tasks::{ActuatorTracker, SensorPoller};

mod adc;
mod radio;
mod rc_input;
mod timer;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Sweep every analog sensor at 50 Hz.
const SENSOR_SWEEP_INTERVAL_US: u32 = 20_000;

/// Refresh the RC command at 20 Hz; the receiver frames arrive at 50 Hz, so
/// re-reading the same frame occasionally is expected.
const RC_TRACK_INTERVAL_US: u32 = 50_000;

/// The shared reporting table: tasks write disjoint slots, the console reads.
static TABLE: ReportTable<REPORT_SLOTS> = ReportTable::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = hal::init(hal::Config::default());

    let counter = timer::HardwareCounter::start();
    let mut clock = SystemClock::new(counter);

    // RC PWM input on PB2; the pin binding stays alive for the whole run.
    let _rc_pin = Input::new(p.PB2, Pull::Down);
    rc_input::init();

    let adc = adc::OnboardAdc::start();

    let cts = Input::new(p.PB4, Pull::Up);
    let uart = radio::RadioUart::start(Some(cts));

    // Put the modem into pin-sleep mode before traffic starts. A failure is
    // reported and flown with: the link usually still passes data, just
    // without the power savings.
    let mut modem = RadioModem::new(uart);
    let setup = modem.setup(|micros| {
        let from = clock.now();
        while clock.now().elapsed_since(from) < micros {}
    });
    if let Err(error) = setup {
        defmt::warn!("radio modem setup failed: {}", defmt::Debug2Format(&error));
    }

    let mut link = modem.into_link();
    let _ = link.send_str("\r\n\nPara-Ceres avionics up. Hello!\r\n");

    let mut sensors = SensorPoller::new(
        adc,
        &TABLE,
        &FLIGHT_CHANNELS,
        SENSOR_SWEEP_INTERVAL_US,
        DEFAULT_POLL_BUDGET,
    );
    let mut tracker = ActuatorTracker::new(
        rc_input::pulses(),
        &TABLE,
        RC_COMMAND_SLOT,
        RC_TRACK_INTERVAL_US,
    );

    let boot = clock.now();
    let mut scheduler: Scheduler<'_, 2> = Scheduler::new();
    scheduler
        .register(&mut sensors, boot)
        .expect("task list sized for both tasks");
    scheduler
        .register(&mut tracker, boot)
        .expect("task list sized for both tasks");

    let mut console = Console::new();

    loop {
        let now = clock.now();
        let report = scheduler.pass(now);
        for fault in &report.faults {
            defmt::warn!(
                "task {=str} fault {=u8}, reset to safe state",
                fault.task,
                fault.code
            );
        }

        let status = StatusSnapshot {
            uptime: now,
            passes: scheduler.passes(),
            task_faults: scheduler.fault_count(),
            conversion_timeouts: TABLE.timeout_count(),
        };
        if let Err(error) = console.poll(&mut link, &TABLE, status) {
            defmt::warn!("radio transmit failed: {}", defmt::Debug2Format(&error));
        }
    }
}
