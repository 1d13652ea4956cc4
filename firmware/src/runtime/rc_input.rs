//! RC PWM input capture.
//!
//! EXTI line 2 fires on both edges of PB2. The handler timestamps the edge
//! and advances the pulse state machine; the completed measurement crosses to
//! the main loop through the pulse cell, never through bare flags.

use core::cell::RefCell;

use avionics_core::capture::{Edge, EdgeEvent, PulseCapture, PulseCell};
use embassy_stm32::pac;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::timer;

const RC_LINE: usize = 2;

static PULSES: PulseCell = PulseCell::new();

// The state machine is touched from interrupt context only, but a critical
// section still guards it so a future second producer cannot race it
// silently.
static CAPTURE: Mutex<CriticalSectionRawMutex, RefCell<PulseCapture<'static>>> =
    Mutex::new(RefCell::new(PulseCapture::new(&PULSES)));

/// The cell the actuator task reads its commands from.
pub fn pulses() -> &'static PulseCell {
    &PULSES
}

/// Routes EXTI line 2 to port B and arms both edge triggers.
pub fn init() {
    pac::EXTI.exticr(RC_LINE / 4).modify(|w| w.set_exti(RC_LINE % 4, 1));
    pac::EXTI.rtsr(0).modify(|w| w.set_line(RC_LINE, true));
    pac::EXTI.ftsr(0).modify(|w| w.set_line(RC_LINE, true));
    pac::EXTI.imr(0).modify(|w| w.set_line(RC_LINE, true));

    unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::EXTI2_3) };
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
extern "C" fn EXTI2_3() {
    let rising = pac::EXTI.rpr(0).read().line(RC_LINE);
    let falling = pac::EXTI.fpr(0).read().line(RC_LINE);
    let at = timer::sample_now().compose();

    if rising {
        pac::EXTI.rpr(0).write(|w| w.set_line(RC_LINE, true));
    }
    if falling {
        pac::EXTI.fpr(0).write(|w| w.set_line(RC_LINE, true));
    }

    critical_section::with(|cs| {
        let mut capture = CAPTURE.borrow(cs).borrow_mut();
        if rising {
            capture.record_edge(EdgeEvent {
                at,
                edge: Edge::Rising,
            });
        }
        if falling {
            capture.record_edge(EdgeEvent {
                at,
                edge: Edge::Falling,
            });
        }
    });
}
