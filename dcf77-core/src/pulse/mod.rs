//! Pulse classification for the DCF77 amplitude-modulated carrier.
//!
//! The capture collaborator hands the decoder the duration of each level the
//! receiver pin held between two edges. High pulses carry the data bits
//! (100 ms for a logical 0, 200 ms for a logical 1); a low phase of roughly
//! two seconds marks the missing 59th second and therefore the start of a new
//! minute frame. Every window here is exclusive on both ends.

use core::fmt;

/// Exclusive lower bound of a logical-0 high pulse.
pub const ZERO_MIN_MS: u16 = 40;
/// Exclusive upper bound of a logical-0 high pulse.
pub const ZERO_MAX_MS: u16 = 130;
/// Exclusive lower bound of a logical-1 high pulse.
pub const ONE_MIN_MS: u16 = 140;
/// Exclusive upper bound of a logical-1 high pulse.
pub const ONE_MAX_MS: u16 = 230;
/// Exclusive lower bound of the minute-marker low phase.
pub const START_MIN_MS: u16 = 1_600;
/// Exclusive upper bound of the minute-marker low phase.
pub const START_MAX_MS: u16 = 2_000;

/// Signal level the receiver pin held for the measured duration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PulseLevel {
    High,
    Low,
}

/// One measured pulse handed over by the capture collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseEvent {
    pub level: PulseLevel,
    pub duration_ms: u16,
}

impl PulseEvent {
    #[must_use]
    pub const fn new(level: PulseLevel, duration_ms: u16) -> Self {
        Self { level, duration_ms }
    }

    #[must_use]
    pub const fn high(duration_ms: u16) -> Self {
        Self::new(PulseLevel::High, duration_ms)
    }

    #[must_use]
    pub const fn low(duration_ms: u16) -> Self {
        Self::new(PulseLevel::Low, duration_ms)
    }
}

/// Open millisecond interval `(lower, upper)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseWindow {
    lower: u16,
    upper: u16,
}

impl PulseWindow {
    /// Creates a window that excludes both bounds.
    #[must_use]
    pub const fn exclusive(lower: u16, upper: u16) -> Self {
        Self { lower, upper }
    }

    /// Returns `true` when `duration_ms` lies strictly between the bounds.
    #[must_use]
    pub const fn contains(&self, duration_ms: u16) -> bool {
        duration_ms > self.lower && duration_ms < self.upper
    }

    #[must_use]
    pub const fn lower(&self) -> u16 {
        self.lower
    }

    #[must_use]
    pub const fn upper(&self) -> u16 {
        self.upper
    }
}

/// Classification of a high pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HighPulse {
    Zero,
    One,
    Invalid,
}

impl HighPulse {
    /// Returns the carried bit, or `None` for an invalid pulse.
    #[must_use]
    pub const fn bit(self) -> Option<bool> {
        match self {
            HighPulse::Zero => Some(false),
            HighPulse::One => Some(true),
            HighPulse::Invalid => None,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> PulseSymbol {
        match self {
            HighPulse::Zero => PulseSymbol::Zero,
            HighPulse::One => PulseSymbol::One,
            HighPulse::Invalid => PulseSymbol::Invalid,
        }
    }
}

/// Classification of a low pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LowPulse {
    /// The skipped 59th second: a new minute frame begins.
    StartMarker,
    /// Any other gap between two second pulses; no bit implied.
    Ordinary,
}

/// Single-character symbol reported to the diagnostics display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PulseSymbol {
    Zero,
    One,
    Start,
    Invalid,
}

impl PulseSymbol {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PulseSymbol::Zero => '0',
            PulseSymbol::One => '1',
            PulseSymbol::Start => 'S',
            PulseSymbol::Invalid => 'F',
        }
    }
}

impl fmt::Display for PulseSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Timing windows used to classify pulses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseTiming {
    pub zero: PulseWindow,
    pub one: PulseWindow,
    pub start: PulseWindow,
}

impl PulseTiming {
    /// Windows matching the DCF77 broadcast with generous receiver jitter.
    #[must_use]
    pub const fn dcf77() -> Self {
        Self {
            zero: PulseWindow::exclusive(ZERO_MIN_MS, ZERO_MAX_MS),
            one: PulseWindow::exclusive(ONE_MIN_MS, ONE_MAX_MS),
            start: PulseWindow::exclusive(START_MIN_MS, START_MAX_MS),
        }
    }

    /// Maps a high duration to a logical bit or a protocol failure.
    #[must_use]
    pub const fn classify_high(&self, duration_ms: u16) -> HighPulse {
        if self.zero.contains(duration_ms) {
            HighPulse::Zero
        } else if self.one.contains(duration_ms) {
            HighPulse::One
        } else {
            HighPulse::Invalid
        }
    }

    /// Detects the minute marker among low durations.
    #[must_use]
    pub const fn classify_low(&self, duration_ms: u16) -> LowPulse {
        if self.start.contains(duration_ms) {
            LowPulse::StartMarker
        } else {
            LowPulse::Ordinary
        }
    }
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self::dcf77()
    }
}

/// Classifies a high duration with the default DCF77 windows.
#[must_use]
pub const fn classify_high(duration_ms: u16) -> HighPulse {
    PulseTiming::dcf77().classify_high(duration_ms)
}

/// Classifies a low duration with the default DCF77 windows.
#[must_use]
pub const fn classify_low(duration_ms: u16) -> LowPulse {
    PulseTiming::dcf77().classify_low(duration_ms)
}
