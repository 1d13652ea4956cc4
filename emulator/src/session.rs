//! Interactive bench session.
//!
//! The session owns the real scheduler, both flight tasks, and the console,
//! all driven by the simulated hardware in [`crate::sim`]. Commands step the
//! loop deterministically, inject RC pulses and converter faults, and talk to
//! the console exactly the way the ground station would.

use std::io::{self, BufRead, Write};

use avionics_core::capture::{Edge, EdgeEvent, PulseCapture};
use avionics_core::capture::PulseCell;
use avionics_core::clock::{SystemClock, TimeStamp};
use avionics_core::config::{FLIGHT_CHANNELS, RC_COMMAND_SLOT, REPORT_SLOTS};
use avionics_core::console::{Console, StatusSnapshot};
use avionics_core::convert::Channel;
use avionics_core::sched::Scheduler;
use avionics_core::table::ReportTable;
use avionics_core::tasks::sensors::DEFAULT_POLL_BUDGET;
use avionics_core::tasks::{ActuatorTracker, SensorPoller};

use crate::sim::{SimConverter, SimCounter, SimLink, SimTime};

/// Simulated main-loop latency per pass.
const PASS_LATENCY_US: u64 = 250;

/// Initial conditions for a bench run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BenchProfile {
    /// Counter starts at power-on zero.
    Flight,
    /// Counter starts just shy of the 32-bit wrap, so a short run crosses it.
    Wraparound,
}

impl BenchProfile {
    pub fn from_tag(tag: &str) -> Result<Self, String> {
        match tag.to_ascii_lowercase().as_str() {
            "flight" => Ok(BenchProfile::Flight),
            "wraparound" => Ok(BenchProfile::Wraparound),
            other => Err(format!("Unknown profile `{other}`")),
        }
    }

    fn start_micros(self) -> u64 {
        match self {
            BenchProfile::Flight => 0,
            BenchProfile::Wraparound => u64::from(u32::MAX) - 5_000,
        }
    }
}

const HELP: &str = "\
commands:
  step [n]        run n scheduler passes (default 1)
  pulse <us>      inject one RC pulse of the given width
  value <ch> <v>  set a converter channel's sample value
  wedge <ch>      make a channel's conversions never complete
  unwedge <ch>    heal a wedged channel
  radio <line>    send a command line over the simulated radio
  report          shorthand for `radio report`
  status          shorthand for `radio status`
  help            this text
  exit            quit";

pub struct Session {
    profile: BenchProfile,
}

impl Session {
    pub fn new(profile: BenchProfile) -> Self {
        Self { profile }
    }

    /// Runs the command loop until `exit` or end of input.
    pub fn run(self, mut reader: impl BufRead, mut writer: impl Write) -> io::Result<()> {
        let time = SimTime::starting_at(self.profile.start_micros());
        let mut clock = SystemClock::new(SimCounter::new(time.clone()));

        let table: ReportTable<REPORT_SLOTS> = ReportTable::new();
        let pulses = PulseCell::new();
        let mut capture = PulseCapture::new(&pulses);
        let converter = SimConverter::new();

        let mut sensors = SensorPoller::new(
            converter.clone(),
            &table,
            &FLIGHT_CHANNELS,
            20_000,
            DEFAULT_POLL_BUDGET,
        );
        let mut tracker = ActuatorTracker::new(&pulses, &table, RC_COMMAND_SLOT, 50_000);

        let boot = clock.now();
        let mut scheduler: Scheduler<'_, 2> = Scheduler::new();
        scheduler
            .register(&mut sensors, boot)
            .expect("task list sized for both tasks");
        scheduler
            .register(&mut tracker, boot)
            .expect("task list sized for both tasks");

        let mut console = Console::new();
        let mut link = SimLink::new();
        let mut line = String::new();

        loop {
            line.clear();
            write!(writer, "> ")?;
            writer.flush()?;

            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                writeln!(writer)?;
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                writeln!(writer, "Session closed.")?;
                break;
            }

            let mut words = trimmed.split_whitespace();
            let keyword = words.next().unwrap_or_default().to_ascii_lowercase();
            match keyword.as_str() {
                "step" => {
                    let passes = match parse_count(words.next()) {
                        Ok(passes) => passes,
                        Err(message) => {
                            writeln!(writer, "{message}")?;
                            continue;
                        }
                    };
                    let mut steps = 0;
                    for _ in 0..passes {
                        time.advance(PASS_LATENCY_US);
                        let now = clock.now();
                        let report = scheduler.pass(now);
                        steps += report.steps;
                        for fault in &report.faults {
                            writeln!(
                                writer,
                                "task {} fault {} reset to safe state",
                                fault.task, fault.code
                            )?;
                        }
                    }
                    writeln!(
                        writer,
                        "ran {passes} passes ({steps} task steps), now {}",
                        current(&time)
                    )?;
                }
                "pulse" => match parse_width(words.next()) {
                    Ok(width) => {
                        capture.record_edge(EdgeEvent {
                            at: current(&time),
                            edge: Edge::Rising,
                        });
                        time.advance(u64::from(width));
                        capture.record_edge(EdgeEvent {
                            at: current(&time),
                            edge: Edge::Falling,
                        });
                        writeln!(writer, "pulse of {width} us captured")?;
                    }
                    Err(message) => writeln!(writer, "{message}")?,
                },
                "value" => match parse_channel_value(words.next(), words.next()) {
                    Ok((channel, value)) => {
                        converter.set_value(channel, value);
                        writeln!(writer, "{channel} now reads {value}")?;
                    }
                    Err(message) => writeln!(writer, "{message}")?,
                },
                "wedge" => match parse_channel(words.next()) {
                    Ok(channel) => {
                        converter.wedge(channel);
                        writeln!(writer, "{channel} wedged")?;
                    }
                    Err(message) => writeln!(writer, "{message}")?,
                },
                "unwedge" => match parse_channel(words.next()) {
                    Ok(channel) => {
                        converter.unwedge(channel);
                        writeln!(writer, "{channel} healed")?;
                    }
                    Err(message) => writeln!(writer, "{message}")?,
                },
                "radio" | "report" | "status" => {
                    let command = if keyword == "radio" {
                        words.collect::<Vec<_>>().join(" ")
                    } else {
                        keyword.clone()
                    };
                    link.feed(&command);
                    link.feed("\r");

                    let status = StatusSnapshot {
                        uptime: current(&time),
                        passes: scheduler.passes(),
                        task_faults: scheduler.fault_count(),
                        conversion_timeouts: table.timeout_count(),
                    };
                    console
                        .poll(&mut link, &table, status)
                        .expect("simulated link cannot fail");

                    let output = link.take_output();
                    for response in output.lines() {
                        writeln!(writer, "{response}")?;
                    }
                }
                "help" => writeln!(writer, "{HELP}")?,
                _ => writeln!(writer, "Unknown command; type `help`.")?,
            }
        }

        Ok(())
    }
}

fn current(time: &SimTime) -> TimeStamp {
    TimeStamp::from_micros((time.micros() & 0xFFFF_FFFF) as u32)
}

fn parse_count(word: Option<&str>) -> Result<u32, String> {
    match word {
        None => Ok(1),
        Some(word) => word
            .parse::<u32>()
            .map_err(|_| format!("`{word}` is not a pass count")),
    }
}

fn parse_width(word: Option<&str>) -> Result<u32, String> {
    word.ok_or_else(|| "pulse needs a width in microseconds".to_string())?
        .parse::<u32>()
        .map_err(|_| "pulse width must be a number of microseconds".to_string())
}

fn parse_channel(word: Option<&str>) -> Result<Channel, String> {
    let word = word.ok_or_else(|| "expected a channel index 0-7".to_string())?;
    let index = word
        .parse::<u8>()
        .map_err(|_| format!("`{word}` is not a channel index"))?;
    Channel::new(index).ok_or_else(|| format!("channel {index} is out of range"))
}

fn parse_channel_value(
    channel: Option<&str>,
    value: Option<&str>,
) -> Result<(Channel, u16), String> {
    let channel = parse_channel(channel)?;
    let value = value
        .ok_or_else(|| "expected a sample value".to_string())?
        .parse::<u16>()
        .map_err(|_| "sample values are 0-65535".to_string())?;
    Ok((channel, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_script(profile: BenchProfile, script: &str) -> String {
        let mut output = Vec::new();
        Session::new(profile)
            .run(Cursor::new(script), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn a_sweep_and_a_report_round_trip() {
        // 18 passes finish the 8-channel sweep and the RC step; the report
        // then carries one line per occupied slot.
        let output = run_script(
            BenchProfile::Flight,
            "pulse 1500\nstep 18\nreport\nexit\n",
        );

        assert!(output.contains("pulse of 1500 us captured"));
        assert!(output.contains("ran 18 passes"));

        let report_lines: Vec<&str> = output
            .lines()
            .filter(|l| {
                l.strip_prefix("> ")
                    .unwrap_or(l)
                    .split_once(' ')
                    .is_some_and(|(stamp, value)| {
                        stamp.contains('.') && value.parse::<u16>().is_ok()
                    })
            })
            .collect();
        assert_eq!(report_lines.len(), REPORT_SLOTS);
    }

    #[test]
    fn wedged_channels_surface_as_timeouts_in_status() {
        // Wedge channel 0, burn through its poll budget, and ask for status.
        let output = run_script(
            BenchProfile::Wraparound,
            "wedge 0\nstep 1100\nstatus\nexit\n",
        );

        assert!(output.contains("ch0 wedged"));
        assert!(output.contains("timeouts 1"));
    }

    #[test]
    fn unknown_commands_do_not_kill_the_session() {
        let output = run_script(BenchProfile::Flight, "frobnicate\nhelp\nexit\n");
        assert!(output.contains("Unknown command"));
        assert!(output.contains("commands:"));
        assert!(output.contains("Session closed."));
    }
}
