//! Deferred, offset-corrected commit of a decoded frame.
//!
//! A frame transmitted during minute N-1 describes minute N, and the commit
//! happens on the first low pulse after the hour parity validated, still
//! inside minute N-1. The applied time is therefore one minute earlier than
//! the decoded one, stamped with a fixed second that matches the position in
//! the broadcast where the commit lands.

use core::fmt;

use crate::clock::{CalendarDate, ClockSnapshot, SharedClock, TimeOfDay};
use crate::frame::PendingFrame;

/// Second written alongside every committed time.
pub const COMMIT_SECOND: u8 = 36;
/// Weekday written to the RTC; the day-of-week bits are parity-only.
pub const UNKNOWN_WEEKDAY: u8 = 0;

/// Register-level time handed to the RTC collaborator.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RtcTimestamp {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl RtcTimestamp {
    #[must_use]
    pub const fn time(&self) -> TimeOfDay {
        TimeOfDay::new(self.hour, self.minute, self.second)
    }

    #[must_use]
    pub const fn date(&self) -> CalendarDate {
        CalendarDate::new(self.day, self.month, self.year)
    }
}

impl fmt::Display for RtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02} {:02}.{:02}.{:02}",
            self.hour, self.minute, self.second, self.day, self.month, self.year
        )
    }
}

/// Outbound write to the real-time-clock peripheral.
pub trait RtcWriter {
    type Error;

    fn write_time(&mut self, timestamp: &RtcTimestamp) -> Result<(), Self::Error>;
}

impl<T> RtcWriter for &mut T
where
    T: RtcWriter + ?Sized,
{
    type Error = T::Error;

    fn write_time(&mut self, timestamp: &RtcTimestamp) -> Result<(), Self::Error> {
        (**self).write_time(timestamp)
    }
}

/// Read-back of the real-time-clock peripheral, used once at start-up.
pub trait RtcReader {
    type Error;

    fn read_time(&mut self) -> Result<RtcTimestamp, Self::Error>;
}

/// Seeds `clock` from the RTC so the first commit has a date to fall back on.
///
/// Fields the RTC reports out of range are not trusted: an invalid time leaves
/// the clock's time alone and an invalid date leaves it unknown.
pub fn restore_clock<R>(rtc: &mut R, clock: &SharedClock) -> Result<ClockSnapshot, R::Error>
where
    R: RtcReader + ?Sized,
{
    let stored = rtc.read_time()?;
    let current = clock.load();
    let time = stored.time();
    let date = stored.date();
    let snapshot = ClockSnapshot::new(
        if time.is_valid() { time } else { current.time },
        if date.is_valid() {
            date
        } else {
            CalendarDate::UNKNOWN
        },
    );
    clock.store(snapshot);
    Ok(snapshot)
}

/// Returns `(minute, hour)` one minute earlier; the day is not adjusted.
#[must_use]
pub const fn previous_minute(minute: u8, hour: u8) -> (u8, u8) {
    if minute > 0 {
        (minute - 1, hour)
    } else if hour > 0 {
        (59, hour - 1)
    } else {
        (59, 23)
    }
}

/// Where the date of a commit came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DateSource {
    /// Decoded from the previous frame.
    Decoded,
    /// The date already held by the shared clock.
    Kept,
    /// No date is known yet; the RTC is left untouched.
    Unknown,
}

impl DateSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DateSource::Decoded => "decoded",
            DateSource::Kept => "kept",
            DateSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a commit writes, and where its date came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommitPlan {
    pub timestamp: RtcTimestamp,
    pub date: DateSource,
}

impl CommitPlan {
    /// Whether the timestamp is written to the RTC at all.
    #[must_use]
    pub const fn writes_rtc(&self) -> bool {
        !matches!(self.date, DateSource::Unknown)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommitError<E> {
    /// The RTC rejected the write; the shared clock was still updated.
    RtcWrite(E),
}

impl<E: fmt::Display> fmt::Display for CommitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::RtcWrite(error) => write!(f, "rtc write failed: {error}"),
        }
    }
}

/// Turns a validated frame into an RTC write and a shared-clock update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommitScheduler {
    commit_second: u8,
}

impl CommitScheduler {
    #[must_use]
    pub const fn new(commit_second: u8) -> Self {
        Self { commit_second }
    }

    #[must_use]
    pub const fn commit_second(&self) -> u8 {
        self.commit_second
    }

    /// Computes the corrected timestamp without side effects.
    ///
    /// The decoded date is used only when one was received and the commit does
    /// not straddle midnight (either the decoded or the corrected time reads
    /// 00:00); otherwise `fallback` is used, provided it is known.
    #[must_use]
    pub const fn plan(&self, frame: &PendingFrame, fallback: CalendarDate) -> CommitPlan {
        let (minute, hour) = previous_minute(frame.minute, frame.hour);
        let straddles_midnight =
            (minute == 0 && hour == 0) || (frame.minute == 0 && frame.hour == 0);
        let (date, source) = if frame.has_date() && !straddles_midnight {
            (
                CalendarDate::new(frame.day, frame.month, frame.year),
                DateSource::Decoded,
            )
        } else if fallback.is_known() {
            (fallback, DateSource::Kept)
        } else {
            (CalendarDate::UNKNOWN, DateSource::Unknown)
        };

        CommitPlan {
            timestamp: RtcTimestamp {
                second: self.commit_second,
                minute,
                hour,
                weekday: UNKNOWN_WEEKDAY,
                day: date.day,
                month: date.month,
                year: date.year,
            },
            date: source,
        }
    }

    /// Writes the corrected time to `rtc` and mirrors it into `clock`.
    ///
    /// The clock is updated even when the RTC write fails. While no date is
    /// known the RTC is not written, so its date registers never receive zeros.
    pub fn commit<R>(
        &self,
        frame: &PendingFrame,
        rtc: &mut R,
        clock: &SharedClock,
    ) -> Result<CommitPlan, CommitError<R::Error>>
    where
        R: RtcWriter + ?Sized,
    {
        let plan = self.plan(frame, clock.load().date);
        let written = if plan.writes_rtc() {
            rtc.write_time(&plan.timestamp)
        } else {
            Ok(())
        };
        clock.set_time(
            plan.timestamp.time(),
            matches!(plan.date, DateSource::Decoded).then_some(plan.timestamp.date()),
        );
        written.map_err(CommitError::RtcWrite)?;
        Ok(plan)
    }
}

impl Default for CommitScheduler {
    fn default() -> Self {
        Self::new(COMMIT_SECOND)
    }
}
