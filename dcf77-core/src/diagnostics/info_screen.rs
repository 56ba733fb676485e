//! Text rendering of the receiver state for a 21x8 character display.
//!
//! ```text
//!      DCF77 Info
//!
//!  Now:    14:07:36
//!  Status: read
//!  Last:   12s ago
//!
//! Z098    S1843    O201
//! 1000100100S0001011010
//! ```

use core::fmt::{self, Write as _};

use super::DiagnosticsSink;
use crate::clock::TimeOfDay;
use crate::pulse::PulseSymbol;

pub const SCREEN_COLUMNS: usize = 21;
pub const SCREEN_LINES: usize = 8;

/// Counter value meaning no signal was ever committed (or too long ago).
const NEVER: u16 = u16::MAX;

pub type ScreenLine = heapless::String<SCREEN_COLUMNS>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadStatus {
    Waiting,
    Reading,
    Failed,
}

impl ReadStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReadStatus::Waiting => "wait",
            ReadStatus::Reading => "read",
            ReadStatus::Failed => "fail",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display model fed by decoder notifications and a one-second tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InfoScreen {
    status: ReadStatus,
    zero_ms: u16,
    one_ms: u16,
    // only one of these is non-zero; a start pulse clears the invalid one and vice versa
    start_ms: u16,
    invalid_ms: u16,
    symbols: [u8; SCREEN_COLUMNS],
    since_signal_s: u16,
}

impl InfoScreen {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: ReadStatus::Waiting,
            zero_ms: 0,
            one_ms: 0,
            start_ms: 0,
            invalid_ms: 0,
            symbols: [b' '; SCREEN_COLUMNS],
            since_signal_s: NEVER,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ReadStatus {
        self.status
    }

    /// Seconds since the last committed signal, `None` if never.
    #[must_use]
    pub const fn seconds_since_signal(&self) -> Option<u16> {
        if self.since_signal_s == NEVER {
            None
        } else {
            Some(self.since_signal_s)
        }
    }

    /// Advances the last-signal counter; it saturates into "never".
    pub fn tick_second(&mut self) {
        if self.since_signal_s != NEVER {
            self.since_signal_s = self.since_signal_s.saturating_add(1);
        }
    }

    /// The most recent symbols, oldest on the left.
    #[must_use]
    pub fn symbol_line(&self) -> ScreenLine {
        self.symbols.iter().map(|byte| char::from(*byte)).collect()
    }

    /// Renders all lines for the given wall-clock time.
    #[must_use]
    pub fn render(&self, now: TimeOfDay) -> [ScreenLine; SCREEN_LINES] {
        let mut lines: [ScreenLine; SCREEN_LINES] = core::array::from_fn(|_| ScreenLine::new());
        fill(&mut lines[0], format_args!("     DCF77 Info"));
        fill(
            &mut lines[2],
            format_args!(
                " Now:    {:02}:{:02}:{:02}",
                now.hour, now.minute, now.second
            ),
        );
        fill(&mut lines[3], format_args!(" Status: {}", self.status));
        fill(&mut lines[4], format_args!(" Last:   "));
        self.write_last_signal(&mut lines[4]);
        let (marker, marker_ms) = if self.invalid_ms == 0 {
            ('S', self.start_ms)
        } else {
            ('F', self.invalid_ms)
        };
        fill(
            &mut lines[6],
            format_args!(
                "Z{:03}    {marker}{:04}    O{:03}",
                self.zero_ms % 1_000,
                marker_ms % 10_000,
                self.one_ms % 1_000
            ),
        );
        lines[7] = self.symbol_line();
        lines
    }

    fn write_last_signal(&self, line: &mut ScreenLine) {
        match self.seconds_since_signal() {
            None => fill(line, format_args!("never")),
            Some(seconds) if seconds < 60 => fill(line, format_args!("{seconds}s ago")),
            Some(seconds) if seconds < 3_600 => fill(line, format_args!("{}m ago", seconds / 60)),
            Some(seconds) => fill(line, format_args!("{}h ago", seconds / 3_600)),
        }
    }

    fn push_symbol(&mut self, symbol: PulseSymbol) {
        self.symbols.copy_within(1.., 0);
        self.symbols[SCREEN_COLUMNS - 1] = u8::try_from(symbol.as_char()).unwrap_or(b'?');
    }
}

impl Default for InfoScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for InfoScreen {
    fn on_zero(&mut self, duration_ms: u16) {
        self.zero_ms = duration_ms;
        self.push_symbol(PulseSymbol::Zero);
    }

    fn on_one(&mut self, duration_ms: u16) {
        self.one_ms = duration_ms;
        self.push_symbol(PulseSymbol::One);
    }

    fn on_start(&mut self, duration_ms: u16) {
        self.start_ms = duration_ms;
        self.invalid_ms = 0;
        self.push_symbol(PulseSymbol::Start);
    }

    fn on_invalid(&mut self, duration_ms: u16) {
        self.invalid_ms = duration_ms;
        self.start_ms = 0;
        self.push_symbol(PulseSymbol::Invalid);
    }

    fn on_read_started(&mut self) {
        self.status = ReadStatus::Reading;
    }

    fn on_read_failed(&mut self) {
        self.status = ReadStatus::Failed;
    }

    fn on_signal_committed(&mut self) {
        self.since_signal_s = 0;
    }
}

// Lines are sized for the display; text past the last column is dropped.
fn fill(line: &mut ScreenLine, args: fmt::Arguments<'_>) {
    let _ = line.write_fmt(args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_screen_waits_and_never_saw_a_signal() {
        let screen = InfoScreen::new();
        let lines = screen.render(TimeOfDay::new(7, 5, 9));
        assert_eq!(lines[0].as_str(), "     DCF77 Info");
        assert!(lines[1].is_empty());
        assert_eq!(lines[2].as_str(), " Now:    07:05:09");
        assert_eq!(lines[3].as_str(), " Status: wait");
        assert_eq!(lines[4].as_str(), " Last:   never");
        assert_eq!(lines[6].as_str(), "Z000    S0000    O000");
        assert_eq!(lines[7].as_str(), "                     ");
    }

    #[test]
    fn symbols_shift_in_from_the_right() {
        let mut screen = InfoScreen::new();
        screen.on_start(1_850);
        screen.on_zero(97);
        screen.on_one(192);
        screen.on_invalid(512);
        assert_eq!(screen.symbol_line().as_str(), "                 S01F");

        for _ in 0..30 {
            screen.on_zero(100);
        }
        assert_eq!(screen.symbol_line().len(), SCREEN_COLUMNS);
        assert!(screen.symbol_line().chars().all(|c| c == '0'));
    }

    #[test]
    fn start_and_invalid_durations_replace_each_other() {
        let mut screen = InfoScreen::new();
        screen.on_zero(97);
        screen.on_one(192);
        screen.on_start(1_843);
        assert_eq!(
            screen.render(TimeOfDay::MIDNIGHT)[6].as_str(),
            "Z097    S1843    O192"
        );

        screen.on_invalid(12_345);
        assert_eq!(
            screen.render(TimeOfDay::MIDNIGHT)[6].as_str(),
            "Z097    F2345    O192"
        );

        screen.on_start(1_790);
        assert_eq!(
            screen.render(TimeOfDay::MIDNIGHT)[6].as_str(),
            "Z097    S1790    O192"
        );
    }

    #[test]
    fn status_follows_read_events() {
        let mut screen = InfoScreen::new();
        screen.on_read_started();
        assert_eq!(screen.status(), ReadStatus::Reading);
        screen.on_read_failed();
        assert_eq!(screen.render(TimeOfDay::MIDNIGHT)[3].as_str(), " Status: fail");
    }

    #[test]
    fn last_signal_counter_scales_units() {
        let mut screen = InfoScreen::new();
        screen.tick_second();
        assert_eq!(screen.seconds_since_signal(), None);

        screen.on_signal_committed();
        for _ in 0..59 {
            screen.tick_second();
        }
        assert_eq!(screen.render(TimeOfDay::MIDNIGHT)[4].as_str(), " Last:   59s ago");

        screen.tick_second();
        assert_eq!(screen.render(TimeOfDay::MIDNIGHT)[4].as_str(), " Last:   1m ago");

        for _ in 60..7_200 {
            screen.tick_second();
        }
        assert_eq!(screen.render(TimeOfDay::MIDNIGHT)[4].as_str(), " Last:   2h ago");
    }

    #[test]
    fn last_signal_counter_saturates_into_never() {
        let mut screen = InfoScreen::new();
        screen.on_signal_committed();
        for _ in 0..u32::from(u16::MAX) {
            screen.tick_second();
        }
        assert_eq!(screen.seconds_since_signal(), None);
        screen.on_signal_committed();
        assert_eq!(screen.seconds_since_signal(), Some(0));
    }
}
