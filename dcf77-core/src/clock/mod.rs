//! Canonical time/date shared between the decoder and the rest of the system.
//!
//! The decoder writes a freshly committed time; displays and other subsystems
//! read it from a different execution context. The whole snapshot is packed
//! into one 64-bit atomic so readers always observe a consistent set of
//! fields. `portable-atomic` backs the atomic with a critical section on cores
//! that lack native 64-bit atomics.

use portable_atomic::{AtomicU64, Ordering};

/// Hour, minute and second of the day.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Advances by one second, wrapping at the end of the day.
    #[must_use]
    pub const fn next_second(self) -> Self {
        if self.second < 59 {
            return Self::new(self.hour, self.minute, self.second + 1);
        }
        if self.minute < 59 {
            return Self::new(self.hour, self.minute + 1, 0);
        }
        if self.hour < 23 {
            return Self::new(self.hour + 1, 0, 0);
        }
        Self::MIDNIGHT
    }

    /// Whether every field lies within a 24-hour clock.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60 && self.second < 60
    }
}

/// Day, month and two-digit year; all zero while unknown.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CalendarDate {
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl CalendarDate {
    pub const UNKNOWN: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(day: u8, month: u8, year: u8) -> Self {
        Self { day, month, year }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.day != 0 && self.month != 0
    }

    /// Whether the fields fit a calendar date; day-of-month limits are not checked.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.day >= 1 && self.day <= 31 && self.month >= 1 && self.month <= 12 && self.year <= 99
    }
}

/// Consistent view of the shared clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ClockSnapshot {
    pub time: TimeOfDay,
    pub date: CalendarDate,
}

impl ClockSnapshot {
    #[must_use]
    pub const fn new(time: TimeOfDay, date: CalendarDate) -> Self {
        Self { time, date }
    }

    const fn pack(self) -> u64 {
        u64::from_le_bytes([
            self.time.second,
            self.time.minute,
            self.time.hour,
            self.date.day,
            self.date.month,
            self.date.year,
            0,
            0,
        ])
    }

    const fn unpack(raw: u64) -> Self {
        let bytes = raw.to_le_bytes();
        Self {
            time: TimeOfDay::new(bytes[2], bytes[1], bytes[0]),
            date: CalendarDate::new(bytes[3], bytes[4], bytes[5]),
        }
    }
}

/// Shared clock handle; place it in a `static` or pass it by reference.
#[derive(Debug)]
pub struct SharedClock {
    raw: AtomicU64,
}

impl SharedClock {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_snapshot(ClockSnapshot::new(TimeOfDay::MIDNIGHT, CalendarDate::UNKNOWN))
    }

    #[must_use]
    pub const fn with_snapshot(snapshot: ClockSnapshot) -> Self {
        Self {
            raw: AtomicU64::new(snapshot.pack()),
        }
    }

    /// Reads every field at once.
    #[must_use]
    pub fn load(&self) -> ClockSnapshot {
        ClockSnapshot::unpack(self.raw.load(Ordering::Acquire))
    }

    /// Replaces every field at once.
    pub fn store(&self, snapshot: ClockSnapshot) {
        self.raw.store(snapshot.pack(), Ordering::Release);
    }

    /// Updates the time and, when provided, the date in one atomic step.
    pub fn set_time(&self, time: TimeOfDay, date: Option<CalendarDate>) -> ClockSnapshot {
        self.update(|current| ClockSnapshot {
            time,
            date: date.unwrap_or(current.date),
        })
    }

    /// Advances the time of day by one second; the date is left to the next commit.
    pub fn tick_second(&self) -> ClockSnapshot {
        self.update(|current| ClockSnapshot {
            time: current.time.next_second(),
            date: current.date,
        })
    }

    fn update<F>(&self, mut apply: F) -> ClockSnapshot
    where
        F: FnMut(ClockSnapshot) -> ClockSnapshot,
    {
        let result = self
            .raw
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(apply(ClockSnapshot::unpack(raw)).pack())
            });
        let previous = match result {
            Ok(raw) | Err(raw) => raw,
        };
        apply(ClockSnapshot::unpack(previous))
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_packing() {
        let snapshot = ClockSnapshot::new(TimeOfDay::new(23, 59, 36), CalendarDate::new(31, 12, 99));
        let clock = SharedClock::with_snapshot(snapshot);
        assert_eq!(clock.load(), snapshot);
    }

    #[test]
    fn set_time_keeps_date_unless_provided() {
        let clock = SharedClock::with_snapshot(ClockSnapshot::new(
            TimeOfDay::MIDNIGHT,
            CalendarDate::new(14, 7, 24),
        ));

        let updated = clock.set_time(TimeOfDay::new(8, 15, 36), None);
        assert_eq!(updated.date, CalendarDate::new(14, 7, 24));
        assert_eq!(clock.load().time, TimeOfDay::new(8, 15, 36));

        clock.set_time(TimeOfDay::new(8, 16, 36), Some(CalendarDate::new(15, 7, 24)));
        assert_eq!(clock.load().date, CalendarDate::new(15, 7, 24));
    }

    #[test]
    fn tick_carries_through_minute_and_hour() {
        let clock = SharedClock::with_snapshot(ClockSnapshot::new(
            TimeOfDay::new(9, 59, 59),
            CalendarDate::new(1, 1, 25),
        ));
        assert_eq!(clock.tick_second().time, TimeOfDay::new(10, 0, 0));

        clock.set_time(TimeOfDay::new(23, 59, 59), None);
        let wrapped = clock.tick_second();
        assert_eq!(wrapped.time, TimeOfDay::MIDNIGHT);
        assert_eq!(wrapped.date, CalendarDate::new(1, 1, 25));
    }

    #[test]
    fn unknown_date_is_reported() {
        assert!(!CalendarDate::UNKNOWN.is_known());
        assert!(CalendarDate::new(3, 4, 0).is_known());
    }
}
