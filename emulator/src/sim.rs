//! Simulated hardware for the bench: a hand-advanced microsecond counter, a
//! scripted analog converter, and an in-memory radio link. All of it drives
//! the real core types; nothing in the core knows it is being simulated.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use avionics_core::clock::{ClockDriver, CounterSample};
use avionics_core::convert::{AnalogConverter, CHANNEL_COUNT, Channel};
use avionics_core::link::{LinkError, SerialLink};

/// Shared simulated time, advanced by the session between passes.
#[derive(Clone)]
pub struct SimTime {
    micros: Rc<Cell<u64>>,
}

impl SimTime {
    pub fn starting_at(micros: u64) -> Self {
        Self {
            micros: Rc::new(Cell::new(micros)),
        }
    }

    pub fn advance(&self, micros: u64) {
        self.micros.set(self.micros.get() + micros);
    }

    pub fn micros(&self) -> u64 {
        self.micros.get()
    }
}

/// Clock driver view of [`SimTime`], including the 16-bit counter split.
pub struct SimCounter {
    time: SimTime,
}

impl SimCounter {
    pub fn new(time: SimTime) -> Self {
        Self { time }
    }
}

impl ClockDriver for SimCounter {
    fn sample(&mut self) -> CounterSample {
        let total = self.time.micros();
        CounterSample {
            ticks: (total & 0xFFFF) as u16,
            overflows: ((total >> 16) & 0xFFFF) as u16,
        }
    }
}

struct ConverterState {
    values: [u16; CHANNEL_COUNT],
    wedged: [bool; CHANNEL_COUNT],
    pending: Option<Channel>,
}

/// Converter whose per-channel values the session can edit, and whose
/// channels can be "wedged" to demonstrate the timeout path.
#[derive(Clone)]
pub struct SimConverter {
    state: Rc<RefCell<ConverterState>>,
}

impl SimConverter {
    pub fn new() -> Self {
        let mut values = [0_u16; CHANNEL_COUNT];
        for (index, value) in values.iter_mut().enumerate() {
            *value = 512 + 8 * u16::try_from(index).unwrap();
        }
        Self {
            state: Rc::new(RefCell::new(ConverterState {
                values,
                wedged: [false; CHANNEL_COUNT],
                pending: None,
            })),
        }
    }

    pub fn set_value(&self, channel: Channel, value: u16) {
        self.state.borrow_mut().values[usize::from(channel.index())] = value;
    }

    pub fn wedge(&self, channel: Channel) {
        self.state.borrow_mut().wedged[usize::from(channel.index())] = true;
    }

    pub fn unwedge(&self, channel: Channel) {
        self.state.borrow_mut().wedged[usize::from(channel.index())] = false;
    }
}

impl Default for SimConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogConverter for SimConverter {
    fn start(&mut self, channel: Channel) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.pending.is_none(),
            "simulated converter started while a conversion was outstanding"
        );
        state.pending = Some(channel);
    }

    fn done(&self) -> bool {
        let state = self.state.borrow();
        state
            .pending
            .is_some_and(|c| !state.wedged[usize::from(c.index())])
    }

    fn read(&mut self) -> u16 {
        let mut state = self.state.borrow_mut();
        let channel = state
            .pending
            .take()
            .expect("simulated converter read without a conversion");
        state.values[usize::from(channel.index())]
    }
}

/// In-memory radio link: the session scripts the incoming bytes and collects
/// whatever the console transmits.
pub struct SimLink {
    incoming: VecDeque<u8>,
    outgoing: Vec<u8>,
}

impl SimLink {
    pub fn new() -> Self {
        Self {
            incoming: VecDeque::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn feed(&mut self, text: &str) {
        self.incoming.extend(text.bytes());
    }

    pub fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.outgoing)).expect("console output is ASCII")
    }
}

impl Default for SimLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for SimLink {
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        self.outgoing.push(byte);
        Ok(())
    }

    fn recv(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }
}
