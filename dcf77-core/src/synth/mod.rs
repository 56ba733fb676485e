//! Transmitter-side frame synthesis for tests and the host emulator.
//!
//! Produces the 59-bit frame for a given minute and expands it into the
//! `(level, duration)` pulses a receiver would measure.

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::frame::layout::{
    BCD_WEIGHTS, DATE_PARITY_BIT, DAY_BITS, FRAME_BITS, FieldSpan, HOUR_BITS, HOUR_PARITY_BIT,
    MINUTE_BITS, MINUTE_PARITY_BIT, MONTH_BITS, START_BIT, WEEKDAY_BITS, YEAR_BITS,
};
use crate::pulse::PulseEvent;

/// Low phase preceding bit 0 (the missing 59th second).
pub const MARKER_LOW_MS: u16 = 1_850;
pub const ZERO_HIGH_MS: u16 = 100;
pub const ONE_HIGH_MS: u16 = 200;
/// Nominal spacing between the starts of two second pulses.
pub const SECOND_MS: u16 = 1_000;
/// Pulses in one minute: the marker, 59 highs and the 58 lows between them.
pub const PULSES_PER_MINUTE: usize = 2 * FRAME_BITS;

pub type MinutePulses = [PulseEvent; PULSES_PER_MINUTE];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SynthError {
    InvalidDate { year: u16, month: u8, day: u8 },
    InvalidTime { hour: u8, minute: u8 },
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::InvalidDate { year, month, day } => {
                write!(f, "invalid date {year:04}-{month:02}-{day:02}")
            }
            SynthError::InvalidTime { hour, minute } => {
                write!(f, "invalid time {hour:02}:{minute:02}")
            }
        }
    }
}

/// First and last year a frame can carry.
pub const YEARS: core::ops::RangeInclusive<i32> = 2000..=2099;

/// Calendar minute encoded by one frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FrameTime(NaiveDateTime);

impl FrameTime {
    /// Validates the calendar fields; the year must lie in 2000..=2099.
    pub fn from_calendar(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    ) -> Result<Self, SynthError> {
        let date = Some(i32::from(year))
            .filter(|year| YEARS.contains(year))
            .and_then(|year| NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)))
            .ok_or(SynthError::InvalidDate { year, month, day })?;
        let at = date
            .and_hms_opt(u32::from(hour), u32::from(minute), 0)
            .ok_or(SynthError::InvalidTime { hour, minute })?;
        Ok(Self(at))
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        narrow(self.0.minute())
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        narrow(self.0.hour())
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        narrow(self.0.day())
    }

    /// ISO weekday, 1 = Monday ... 7 = Sunday.
    #[must_use]
    pub fn weekday(&self) -> u8 {
        narrow(self.0.weekday().number_from_monday())
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        narrow(self.0.month())
    }

    /// Two-digit year as transmitted.
    #[must_use]
    pub fn short_year(&self) -> u8 {
        narrow(self.0.year().rem_euclid(100).unsigned_abs())
    }

    /// The following minute, or `None` past the end of 2099.
    #[must_use]
    pub fn next_minute(self) -> Option<Self> {
        self.0
            .checked_add_signed(TimeDelta::minutes(1))
            .filter(|next| YEARS.contains(&next.year()))
            .map(Self)
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.0.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute()
        )
    }
}

// chrono reports calendar fields as u32; every one of them fits a byte
fn narrow(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// The 59 transmitted bits of one minute.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameBits([bool; FRAME_BITS]);

impl FrameBits {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([false; FRAME_BITS])
    }

    #[must_use]
    pub fn get(&self, bit: usize) -> Option<bool> {
        self.0.get(bit).copied()
    }

    pub fn set(&mut self, bit: usize, value: bool) {
        if let Some(slot) = self.0.get_mut(bit) {
            *slot = value;
        }
    }

    /// Inverts one bit; returns `false` if `bit` is outside the frame.
    pub fn flip(&mut self, bit: usize) -> bool {
        match self.0.get_mut(bit) {
            Some(slot) => {
                *slot = !*slot;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    fn write_bcd(&mut self, span: FieldSpan, value: u8) {
        let mut remaining = value;
        let first = usize::from(span.first_bit);
        for offset in (0..usize::from(span.width)).rev() {
            let weight = BCD_WEIGHTS[offset];
            let set = remaining >= weight;
            if set {
                remaining -= weight;
            }
            self.set(first + offset, set);
        }
    }

    fn parity(&self, from_bit: u8, to_bit: u8) -> bool {
        self.0[usize::from(from_bit)..usize::from(to_bit)]
            .iter()
            .fold(false, |parity, bit| parity ^ bit)
    }
}

impl fmt::Display for FrameBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Encodes `time` with BCD fields, even parity and the start bit set.
#[must_use]
pub fn encode_frame(time: &FrameTime) -> FrameBits {
    let mut bits = FrameBits::zeroed();
    bits.set(usize::from(START_BIT), true);

    bits.write_bcd(MINUTE_BITS, time.minute());
    bits.set(
        usize::from(MINUTE_PARITY_BIT),
        bits.parity(MINUTE_BITS.first_bit, MINUTE_PARITY_BIT),
    );

    bits.write_bcd(HOUR_BITS, time.hour());
    bits.set(
        usize::from(HOUR_PARITY_BIT),
        bits.parity(HOUR_BITS.first_bit, HOUR_PARITY_BIT),
    );

    bits.write_bcd(DAY_BITS, time.day());
    bits.write_bcd(WEEKDAY_BITS, time.weekday());
    bits.write_bcd(MONTH_BITS, time.month());
    bits.write_bcd(YEAR_BITS, time.short_year());
    bits.set(
        usize::from(DATE_PARITY_BIT),
        bits.parity(DAY_BITS.first_bit, DATE_PARITY_BIT),
    );

    bits
}

/// Expands a frame into the pulses measured during its minute.
///
/// The sequence opens with the minute-marker low and ends with the high pulse
/// of bit 58; the next minute's marker closes it.
#[must_use]
pub fn minute_pulses(bits: &FrameBits) -> MinutePulses {
    let high = |bit: bool| if bit { ONE_HIGH_MS } else { ZERO_HIGH_MS };
    core::array::from_fn(|index| match index.checked_sub(1) {
        None => PulseEvent::low(MARKER_LOW_MS),
        Some(offset) if offset % 2 == 0 => PulseEvent::high(high(bits.0[offset / 2])),
        Some(offset) => PulseEvent::low(SECOND_MS - high(bits.0[offset / 2])),
    })
}
