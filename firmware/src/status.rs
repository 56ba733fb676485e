#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared state for the firmware target.
//!
//! The pulse mailbox and the shared clock are the two cross-context
//! handoffs of the receiver. Decoder counters are mirrored into lightweight
//! atomics so any task can surface a [`StatusSnapshot`] without reaching into
//! the decoder task.

use dcf77_core::clock::{ClockSnapshot, SharedClock};
use dcf77_core::decoder::DecoderStats;
use dcf77_core::mailbox::PulseMailbox;
use portable_atomic::{AtomicU32, Ordering};

/// Written by the capture task, drained by the decoder task.
pub static PULSES: PulseMailbox = PulseMailbox::new();
/// Canonical time of day, updated by commits and the one-second tick.
pub static CLOCK: SharedClock = SharedClock::new();

static FRAMES_STARTED: AtomicU32 = AtomicU32::new(0);
static FAILURES: AtomicU32 = AtomicU32::new(0);
static COMMITS: AtomicU32 = AtomicU32::new(0);
static RTC_ERRORS: AtomicU32 = AtomicU32::new(0);
/// Uptime (s, +1) of the last commit.
static LAST_COMMIT_SECS: AtomicU32 = AtomicU32::new(0);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub clock: ClockSnapshot,
    pub frames_started: u32,
    pub failures: u32,
    pub commits: u32,
    pub rtc_errors: u32,
    pub overruns: u32,
    pub last_commit_secs: Option<u32>,
}

fn encode_secs(secs: u32) -> u32 {
    secs.min(u32::MAX - 1).wrapping_add(1)
}

fn decode_secs(raw: u32) -> Option<u32> {
    if raw == 0 {
        None
    } else {
        Some(raw.wrapping_sub(1))
    }
}

/// Mirrors the decoder counters.
pub fn record_stats(stats: DecoderStats) {
    FRAMES_STARTED.store(stats.frames_started, Ordering::Relaxed);
    FAILURES.store(stats.failures, Ordering::Relaxed);
    COMMITS.store(stats.commits, Ordering::Relaxed);
    RTC_ERRORS.store(stats.rtc_errors, Ordering::Relaxed);
}

/// Remembers when the last commit happened.
pub fn record_commit(uptime_secs: u32) {
    LAST_COMMIT_SECS.store(encode_secs(uptime_secs), Ordering::Relaxed);
}

/// Builds a [`StatusSnapshot`] from `clock` and `mailbox` plus the mirrored counters.
pub fn snapshot_of(clock: &SharedClock, mailbox: &PulseMailbox) -> StatusSnapshot {
    StatusSnapshot {
        clock: clock.load(),
        frames_started: FRAMES_STARTED.load(Ordering::Relaxed),
        failures: FAILURES.load(Ordering::Relaxed),
        commits: COMMITS.load(Ordering::Relaxed),
        rtc_errors: RTC_ERRORS.load(Ordering::Relaxed),
        overruns: mailbox.overruns(),
        last_commit_secs: decode_secs(LAST_COMMIT_SECS.load(Ordering::Relaxed)),
    }
}

/// Snapshot of the firmware's shared statics.
pub fn snapshot() -> StatusSnapshot {
    snapshot_of(&CLOCK, &PULSES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcf77_core::pulse::PulseEvent;

    #[test]
    fn commit_uptime_round_trips_through_the_offset_encoding() {
        assert_eq!(decode_secs(0), None);
        assert_eq!(decode_secs(encode_secs(0)), Some(0));
        assert_eq!(decode_secs(encode_secs(86_400)), Some(86_400));
        assert_eq!(decode_secs(encode_secs(u32::MAX)), Some(u32::MAX - 1));
    }

    #[test]
    fn snapshot_reports_counters_and_overruns() {
        let clock = SharedClock::new();
        let mailbox = PulseMailbox::new();
        mailbox.post(PulseEvent::high(100));
        mailbox.post(PulseEvent::low(900));

        record_stats(DecoderStats {
            frames_started: 3,
            failures: 1,
            commits: 2,
            ..DecoderStats::default()
        });
        record_commit(125);

        let snapshot = snapshot_of(&clock, &mailbox);
        assert_eq!(snapshot.frames_started, 3);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.commits, 2);
        assert_eq!(snapshot.overruns, 1);
        assert_eq!(snapshot.last_commit_secs, Some(125));
        assert_eq!(snapshot.clock, clock.load());
    }
}
