//! On-chip analog converter behind the start/poll/read contract.
//!
//! The converter pins (PA0..PA7 map to channels 0..7) reset to analog mode,
//! so only the converter itself needs bring-up: regulator, calibration,
//! enable. Conversions are software-started one at a time; completion is a
//! flag poll, never a wait.

use avionics_core::convert::{AnalogConverter, Channel};
use embassy_stm32::pac;

/// Regulator start-up time at 16 MHz, with margin (datasheet: 20 µs).
const REGULATOR_STARTUP_CYCLES: u32 = 640;

/// Owner of ADC1; there is exactly one, which keeps the one-conversion rule
/// easy to honour.
pub struct OnboardAdc {
    _private: (),
}

impl OnboardAdc {
    pub fn start() -> Self {
        pac::RCC.apbenr2().modify(|w| w.set_adcen(true));

        let adc = pac::ADC1;
        adc.cr().modify(|w| w.set_advregen(true));
        cortex_m::asm::delay(REGULATOR_STARTUP_CYCLES);

        adc.cr().modify(|w| w.set_adcal(true));
        while adc.cr().read().adcal() {}

        adc.isr().modify(|w| w.set_adrdy(true));
        adc.cr().modify(|w| w.set_aden(true));
        while !adc.isr().read().adrdy() {}

        Self { _private: () }
    }
}

impl AnalogConverter for OnboardAdc {
    fn start(&mut self, channel: Channel) {
        let adc = pac::ADC1;
        adc.chselr().write(|w| w.0 = 1u32 << channel.index());
        adc.isr().modify(|w| w.set_eoc(true));
        adc.cr().modify(|w| w.set_adstart(true));
    }

    fn done(&self) -> bool {
        pac::ADC1.isr().read().eoc()
    }

    fn read(&mut self) -> u16 {
        pac::ADC1.dr().read().data()
    }
}
