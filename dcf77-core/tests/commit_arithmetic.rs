use dcf77_core::clock::{CalendarDate, ClockSnapshot, SharedClock, TimeOfDay};
use dcf77_core::commit::{
    COMMIT_SECOND, CommitScheduler, DateSource, RtcTimestamp, RtcWriter, UNKNOWN_WEEKDAY, previous_minute,
};
use dcf77_core::frame::PendingFrame;

#[derive(Default)]
struct RecordingRtc {
    writes: Vec<RtcTimestamp>,
}

impl RtcWriter for RecordingRtc {
    type Error = ();

    fn write_time(&mut self, timestamp: &RtcTimestamp) -> Result<(), Self::Error> {
        self.writes.push(*timestamp);
        Ok(())
    }
}

fn decoded(minute: u8, hour: u8) -> PendingFrame {
    PendingFrame {
        minute,
        hour,
        day: 24,
        month: 12,
        year: 26,
    }
}

#[test]
fn minute_underflow_borrows_from_the_hour() {
    assert_eq!(previous_minute(0, 5), (59, 4));
    let plan = CommitScheduler::default().plan(&decoded(0, 5), CalendarDate::UNKNOWN);
    assert_eq!((plan.timestamp.minute, plan.timestamp.hour), (59, 4));
    assert_eq!(plan.date, DateSource::Decoded);
}

#[test]
fn midnight_wraps_to_previous_day_time_without_date() {
    let fallback = CalendarDate::new(23, 12, 26);
    let plan = CommitScheduler::default().plan(&decoded(0, 0), fallback);
    assert_eq!((plan.timestamp.minute, plan.timestamp.hour), (59, 23));
    assert_eq!(plan.date, DateSource::Kept);
    assert_eq!(plan.timestamp.date(), fallback);
}

#[test]
fn every_decoded_minute_commits_one_minute_earlier() {
    let scheduler = CommitScheduler::default();
    for hour in 0..24 {
        for minute in 0..60 {
            let plan = scheduler.plan(&decoded(minute, hour), CalendarDate::UNKNOWN);
            let decoded_total = u16::from(hour) * 60 + u16::from(minute);
            let committed_total =
                u16::from(plan.timestamp.hour) * 60 + u16::from(plan.timestamp.minute);
            assert_eq!((committed_total + 1) % 1_440, decoded_total);
            assert_eq!(plan.timestamp.second, COMMIT_SECOND);
            assert_eq!(plan.timestamp.weekday, UNKNOWN_WEEKDAY);
        }
    }
}

#[test]
fn commit_without_date_keeps_clock_date() {
    let clock = SharedClock::with_snapshot(ClockSnapshot::new(
        TimeOfDay::new(9, 0, 0),
        CalendarDate::new(7, 8, 26),
    ));
    let mut rtc = RecordingRtc::default();
    let frame = PendingFrame {
        minute: 12,
        hour: 9,
        ..PendingFrame::empty()
    };

    let plan = CommitScheduler::default()
        .commit(&frame, &mut rtc, &clock)
        .unwrap();

    assert_eq!(plan.date, DateSource::Kept);
    assert_eq!(
        rtc.writes,
        vec![RtcTimestamp {
            second: 36,
            minute: 11,
            hour: 9,
            weekday: 0,
            day: 7,
            month: 8,
            year: 26,
        }]
    );
    assert_eq!(
        clock.load(),
        ClockSnapshot::new(TimeOfDay::new(9, 11, 36), CalendarDate::new(7, 8, 26))
    );
}

#[test]
fn any_nonzero_date_field_counts_as_received() {
    let scheduler = CommitScheduler::default();
    let only_year = PendingFrame {
        minute: 30,
        hour: 10,
        year: 27,
        ..PendingFrame::empty()
    };
    let plan = scheduler.plan(&only_year, CalendarDate::new(1, 1, 26));
    assert_eq!(plan.date, DateSource::Decoded);
    assert_eq!(plan.timestamp.date(), CalendarDate::new(0, 0, 27));
}
