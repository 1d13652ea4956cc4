//! USART1 radio transport.
//!
//! The modem hangs off USART1 (PB6 TX, PB7 RX, alternate function 0) with an
//! optional clear-to-send line the modem drives low when it can accept data.
//! Every wait is a bounded flag poll; a stuck modem turns into a
//! [`LinkError`] instead of a stuck loop.

use avionics_core::link::{LinkError, SerialLink};
use embassy_stm32::gpio::Input;
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::Moder;

/// Polls of the clear-to-send line before a send is abandoned.
const CTS_RETRIES: u32 = 20_000;

/// Polls of the transmit-empty flag before a send is abandoned.
const TX_RETRIES: u32 = 20_000;

/// 9600 baud from the 16 MHz boot clock.
const BAUD_DIVISOR: u16 = 1_667;

pub struct RadioUart {
    cts: Option<Input<'static>>,
}

impl RadioUart {
    /// Brings up USART1. Pass `None` for `cts` on boards without the flow
    /// control line wired; sends then rely on the transmit flag alone.
    pub fn start(cts: Option<Input<'static>>) -> Self {
        pac::RCC.iopenr().modify(|w| w.set_gpioben(true));
        pac::RCC.apbenr2().modify(|w| w.set_usart1en(true));

        let gpio = pac::GPIOB;
        gpio.afr(0).modify(|w| {
            w.set_afr(6, 0);
            w.set_afr(7, 0);
        });
        gpio.moder().modify(|w| {
            w.set_moder(6, Moder::ALTERNATE);
            w.set_moder(7, Moder::ALTERNATE);
        });

        let uart = pac::USART1;
        uart.brr().write(|w| w.set_brr(BAUD_DIVISOR));
        uart.cr1().modify(|w| {
            w.set_te(true);
            w.set_re(true);
            w.set_ue(true);
        });

        Self { cts }
    }
}

impl SerialLink for RadioUart {
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        if let Some(cts) = &self.cts {
            let mut tries = 0;
            // The modem holds the line high while its buffer is full.
            while cts.is_high() {
                tries += 1;
                if tries > CTS_RETRIES {
                    return Err(LinkError::CtsTimeout);
                }
            }
        }

        let uart = pac::USART1;
        let mut tries = 0;
        while !uart.isr().read().txe() {
            tries += 1;
            if tries > TX_RETRIES {
                return Err(LinkError::TransmitTimeout);
            }
        }
        uart.tdr().write(|w| w.set_dr(u16::from(byte)));
        Ok(())
    }

    fn recv(&mut self) -> Option<u8> {
        let uart = pac::USART1;
        if uart.isr().read().rxne() {
            Some((uart.rdr().read().dr() & 0xFF) as u8)
        } else {
            None
        }
    }
}
