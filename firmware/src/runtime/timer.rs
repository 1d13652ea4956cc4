//! The 1 MHz time base.
//!
//! TIM3 free-runs at one tick per microsecond across its full 16-bit range;
//! its update interrupt maintains the 16-bit overflow count. A coherent
//! sample needs care at the seams: the overflow count is re-read after the
//! counter, and a pending-but-unserviced update flag is folded in by hand so
//! time never appears to step backwards.

use avionics_core::clock::{ClockDriver, CounterSample};
use embassy_stm32::pac;
use portable_atomic::{AtomicU16, Ordering};

/// Divides the 16 MHz boot clock down to one tick per microsecond.
const TICK_PRESCALER: u16 = 15;

static OVERFLOWS: AtomicU16 = AtomicU16::new(0);

/// Owner of TIM3. Constructing it starts the counter and unmasks its
/// interrupt; it is never stopped afterwards.
pub struct HardwareCounter {
    _private: (),
}

impl HardwareCounter {
    pub fn start() -> Self {
        pac::RCC.apbenr1().modify(|w| w.set_tim3en(true));

        let tim = pac::TIM3;
        tim.psc().write(|w| w.set_psc(TICK_PRESCALER));
        tim.arr().write(|w| w.set_arr(0xFFFF));
        // Force-load the prescaler now, then drop the update flag the force
        // raised so it does not count as a phantom overflow.
        tim.egr().write(|w| w.set_ug(true));
        tim.sr().modify(|w| w.set_uif(false));
        tim.dier().modify(|w| w.set_uie(true));
        tim.cr1().modify(|w| w.set_cen(true));

        unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM3_TIM4) };

        Self { _private: () }
    }
}

/// Takes one coherent counter sample. Safe from any context, including the
/// edge-capture interrupt.
pub fn sample_now() -> CounterSample {
    loop {
        let overflows = OVERFLOWS.load(Ordering::Acquire);
        let ticks = pac::TIM3.cnt().read().cnt();
        let update_pending = pac::TIM3.sr().read().uif();
        if OVERFLOWS.load(Ordering::Acquire) != overflows {
            // The overflow interrupt ran mid-sample; try again.
            continue;
        }
        if update_pending && ticks < 0x8000 {
            // The counter wrapped but its interrupt has not run yet.
            return CounterSample {
                ticks,
                overflows: overflows.wrapping_add(1),
            };
        }
        return CounterSample { ticks, overflows };
    }
}

impl ClockDriver for HardwareCounter {
    fn sample(&mut self) -> CounterSample {
        sample_now()
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
extern "C" fn TIM3_TIM4() {
    pac::TIM3.sr().modify(|w| w.set_uif(false));
    OVERFLOWS.fetch_add(1, Ordering::Release);
}
