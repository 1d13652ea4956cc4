//! Parser for the ground-console command language.
//!
//! The console speaks a deliberately tiny grammar, one keyword per line,
//! parsed with `winnow` combinators over the received line. Parsing stays
//! `no_std` so the firmware and the bench emulator share it byte for byte.

use winnow::ModalResult;
use winnow::ascii::Caseless;
use winnow::combinator::alt;
use winnow::prelude::*;

/// A parsed console command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Emit one reporting line per table slot.
    Report,
    /// Emit the status summary.
    Status,
    /// Emit the usage text.
    Help,
}

/// Error returned when a line is not a known command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseError;

fn command(input: &mut &str) -> ModalResult<Command> {
    alt((
        Caseless("report").value(Command::Report),
        Caseless("status").value(Command::Status),
        Caseless("help").value(Command::Help),
    ))
    .parse_next(input)
}

/// Parses one full console line into a [`Command`].
///
/// Surrounding whitespace is ignored; anything else trailing the keyword is
/// rejected rather than silently dropped.
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    command.parse(line.trim()).map_err(|_| ParseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_known_keywords() {
        assert_eq!(parse_line("report"), Ok(Command::Report));
        assert_eq!(parse_line("status"), Ok(Command::Status));
        assert_eq!(parse_line("help"), Ok(Command::Help));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse_line("REPORT"), Ok(Command::Report));
        assert_eq!(parse_line("Status"), Ok(Command::Status));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_line("  report  "), Ok(Command::Report));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert_eq!(parse_line("report now"), Err(ParseError));
        assert_eq!(parse_line("reportx"), Err(ParseError));
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert_eq!(parse_line(""), Err(ParseError));
        assert_eq!(parse_line("launch"), Err(ParseError));
    }
}
