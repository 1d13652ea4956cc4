//! Ground-station console drained over the radio link.
//!
//! The ground side sends one-keyword command lines; the console accumulates
//! received bytes, parses complete lines, and answers over the same link.
//! Report lines are produced on demand straight out of the shared table; the
//! console is the table's single reader.

use core::fmt::Write as _;

use heapless::String;

use crate::link::{LinkError, SerialLink, render_report_line};
use crate::table::ReportTable;

pub mod grammar;
pub mod status;

pub use grammar::{Command, ParseError, parse_line};
pub use status::StatusSnapshot;

/// Longest accepted command line, including nothing but the keyword.
pub const MAX_LINE: usize = 32;

const USAGE: &str = "commands: report status help\r\n";

/// Writes one reporting line per occupied table slot.
///
/// Slots that have never been written are skipped; a slot holding the timeout
/// sentinel is reported like any other value, the sentinel *is* the reading.
pub fn write_report<L: SerialLink, const SLOTS: usize>(
    link: &mut L,
    table: &ReportTable<SLOTS>,
) -> Result<(), LinkError> {
    for reading in table.iter().flatten() {
        link.send_str(&render_report_line(reading.stamp, reading.value))?;
    }
    Ok(())
}

/// Line-buffered command processor.
pub struct Console {
    line: String<MAX_LINE>,
    overlong: bool,
}

impl Console {
    /// Creates a console with an empty line buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: String::new(),
            overlong: false,
        }
    }

    /// Drains pending input and answers any completed command lines.
    ///
    /// Called once per main-loop iteration, after the scheduler pass. The
    /// work is bounded by the bytes the link has buffered plus one command's
    /// worth of output.
    pub fn poll<L: SerialLink, const SLOTS: usize>(
        &mut self,
        link: &mut L,
        table: &ReportTable<SLOTS>,
        status: StatusSnapshot,
    ) -> Result<(), LinkError> {
        while let Some(byte) = link.recv() {
            match byte {
                b'\r' | b'\n' => {
                    let overflowed = self.overlong;
                    self.overlong = false;
                    if overflowed {
                        self.line.clear();
                        link.send_str(USAGE)?;
                    } else if !self.line.is_empty() {
                        let parsed = parse_line(&self.line);
                        self.line.clear();
                        self.execute(parsed, link, table, status)?;
                    }
                }
                // The modem is 8-bit clean but commands are plain ASCII;
                // anything else just poisons the current line.
                byte if byte.is_ascii() => {
                    if self.line.push(byte as char).is_err() {
                        self.overlong = true;
                    }
                }
                _ => self.overlong = true,
            }
        }
        Ok(())
    }

    fn execute<L: SerialLink, const SLOTS: usize>(
        &mut self,
        parsed: Result<Command, ParseError>,
        link: &mut L,
        table: &ReportTable<SLOTS>,
        status: StatusSnapshot,
    ) -> Result<(), LinkError> {
        match parsed {
            Ok(Command::Report) => write_report(link, table),
            Ok(Command::Status) => {
                let mut rendered = String::<64>::new();
                let _ = write!(rendered, "{status}\r\n");
                link.send_str(&rendered)
            }
            Ok(Command::Help) | Err(ParseError) => link.send_str(USAGE),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
