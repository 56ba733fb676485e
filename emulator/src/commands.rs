//! Command grammar for the emulator REPL.
//!
//! Keywords are case-insensitive; numbers are plain decimal. Range checks on
//! dates, times and bit indices happen in the session, not here.

use dcf77_core::pulse::{PulseEvent, PulseLevel};
use winnow::ascii::{Caseless, alphanumeric1, dec_uint, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::literal;

/// Frames sent when `send` omits the count.
pub const DEFAULT_SEND_MINUTES: u16 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateArg {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeArg {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    Send {
        date: DateArg,
        time: TimeArg,
        minutes: u16,
    },
    Flip {
        bit: u16,
    },
    Pulse {
        level: PulseLevel,
        duration_ms: u16,
    },
    Screen,
    Status,
    Help(Option<&'a str>),
}

/// Parses one trimmed input line.
pub fn parse(line: &str) -> Result<Command<'_>, String> {
    command.parse(line.trim()).map_err(|err| err.to_string())
}

/// Parses one `H <ms>` / `L <ms>` line of a captured trace.
pub fn parse_trace_line(line: &str) -> Result<PulseEvent, String> {
    (level, space1, dec_uint::<_, u16, _>)
        .map(|(level, _, duration_ms)| PulseEvent::new(level, duration_ms))
        .parse(line.trim())
        .map_err(|err| err.to_string())
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    alt((send, flip, pulse, screen, status, help)).parse_next(input)
}

fn send<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        (literal(Caseless("send")), space1),
        (
            date,
            preceded(space1, time),
            opt(preceded(space1, dec_uint::<_, u16, _>)),
        ),
    )
    .map(|(date, time, minutes)| Command::Send {
        date,
        time,
        minutes: minutes.unwrap_or(DEFAULT_SEND_MINUTES),
    })
    .parse_next(input)
}

fn date(input: &mut &str) -> ModalResult<DateArg> {
    (
        dec_uint::<_, u16, _>,
        '-',
        dec_uint::<_, u8, _>,
        '-',
        dec_uint::<_, u8, _>,
    )
        .map(|(year, _, month, _, day)| DateArg { year, month, day })
        .parse_next(input)
}

fn time(input: &mut &str) -> ModalResult<TimeArg> {
    (dec_uint::<_, u8, _>, ':', dec_uint::<_, u8, _>)
        .map(|(hour, _, minute)| TimeArg { hour, minute })
        .parse_next(input)
}

fn flip<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        (literal(Caseless("flip")), space1),
        dec_uint::<_, u16, _>,
    )
    .map(|bit| Command::Flip { bit })
    .parse_next(input)
}

fn pulse<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        (literal(Caseless("pulse")), space1),
        (level, preceded(space1, dec_uint::<_, u16, _>)),
    )
    .map(|(level, duration_ms)| Command::Pulse { level, duration_ms })
    .parse_next(input)
}

fn level(input: &mut &str) -> ModalResult<PulseLevel> {
    alt((
        alt((literal(Caseless("high")), literal(Caseless("h")))).value(PulseLevel::High),
        alt((literal(Caseless("low")), literal(Caseless("l")))).value(PulseLevel::Low),
    ))
    .parse_next(input)
}

fn screen<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    literal(Caseless("screen"))
        .value(Command::Screen)
        .parse_next(input)
}

fn status<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    literal(Caseless("status"))
        .value(Command::Status)
        .parse_next(input)
}

fn help<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        literal(Caseless("help")),
        opt(preceded(space1, alphanumeric1)),
    )
    .map(Command::Help)
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_and_without_count() {
        assert_eq!(
            parse("send 2027-01-01 00:00 3"),
            Ok(Command::Send {
                date: DateArg {
                    year: 2027,
                    month: 1,
                    day: 1
                },
                time: TimeArg { hour: 0, minute: 0 },
                minutes: 3,
            })
        );
        assert_eq!(
            parse("SEND 2026-10-19 14:05"),
            Ok(Command::Send {
                date: DateArg {
                    year: 2026,
                    month: 10,
                    day: 19
                },
                time: TimeArg {
                    hour: 14,
                    minute: 5
                },
                minutes: DEFAULT_SEND_MINUTES,
            })
        );
    }

    #[test]
    fn parses_pulse_levels() {
        assert_eq!(
            parse("pulse high 100"),
            Ok(Command::Pulse {
                level: PulseLevel::High,
                duration_ms: 100
            })
        );
        assert_eq!(
            parse("pulse L 1850"),
            Ok(Command::Pulse {
                level: PulseLevel::Low,
                duration_ms: 1850
            })
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("  screen "), Ok(Command::Screen));
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("flip 28"), Ok(Command::Flip { bit: 28 }));
        assert_eq!(parse("help"), Ok(Command::Help(None)));
        assert_eq!(parse("help send"), Ok(Command::Help(Some("send"))));
    }

    #[test]
    fn parses_trace_lines() {
        assert_eq!(parse_trace_line("H 188"), Ok(PulseEvent::high(188)));
        assert_eq!(parse_trace_line(" l 1850 "), Ok(PulseEvent::low(1850)));
        assert!(parse_trace_line("H").is_err());
        assert!(parse_trace_line("X 100").is_err());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse("send 2027-01-01").is_err());
        assert!(parse("pulse sideways 100").is_err());
        assert!(parse("flip").is_err());
        assert!(parse("screens").is_err());
        assert!(parse("launch").is_err());
    }
}
