//! Board configuration: which sensor hangs off which analog input, and which
//! reporting slot it publishes to.
//!
//! This is wiring data, not scheduling logic. The airframe carries more
//! analog sensors than the converter has inputs (two six-axis blocks alone
//! would need twelve); the flight table below carries the eight channels
//! wired on the current board. Boards with an external mux substitute their
//! own table.

use crate::convert::Channel;

/// One entry of the sensor wiring table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorChannel {
    /// Logical sensor name, for status output.
    pub name: &'static str,
    /// Analog input the sensor is wired to.
    pub channel: Channel,
    /// Reporting-table slot the sensor publishes to.
    pub slot: usize,
}

impl SensorChannel {
    /// Builds a wiring entry.
    #[must_use]
    pub const fn new(name: &'static str, channel: Channel, slot: usize) -> Self {
        Self {
            name,
            channel,
            slot,
        }
    }
}

const fn channel(index: u8) -> Channel {
    match Channel::new(index) {
        Some(channel) => channel,
        None => panic!("analog channel index out of range"),
    }
}

/// Sensor wiring for the flight board, in sweep order.
pub const FLIGHT_CHANNELS: [SensorChannel; 8] = [
    SensorChannel::new("actuator-a", channel(0), 0),
    SensorChannel::new("actuator-b", channel(1), 1),
    SensorChannel::new("accel-x", channel(2), 2),
    SensorChannel::new("accel-y", channel(3), 3),
    SensorChannel::new("accel-z", channel(4), 4),
    SensorChannel::new("load-cell", channel(5), 5),
    SensorChannel::new("pitot", channel(6), 6),
    SensorChannel::new("static-port", channel(7), 7),
];

/// Reporting slot holding the commanded position derived from the RC pulse.
pub const RC_COMMAND_SLOT: usize = FLIGHT_CHANNELS.len();

/// Total reporting-table slots: one per sensor plus the RC command.
pub const REPORT_SLOTS: usize = FLIGHT_CHANNELS.len() + 1;
