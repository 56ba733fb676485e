#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Edge-to-pulse conversion for the receiver pin.
//!
//! The capture task timestamps every pin edge; [`EdgeTracker`] turns two
//! consecutive edges into the `(level, duration)` pair the decoder consumes.

use dcf77_core::pulse::{PulseEvent, PulseLevel};
use embassy_time::{Duration, Instant};

/// Remembers the level the pin entered at the last edge and when.
#[derive(Copy, Clone, Debug)]
pub struct EdgeTracker {
    current: Option<(PulseLevel, Instant)>,
}

impl EdgeTracker {
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Records that the pin reads `high` at `at`.
    ///
    /// Returns the pulse that just ended. The first call only primes the
    /// tracker; a repeated level (an edge lost to bounce) extends the running
    /// pulse instead of ending it.
    pub fn edge(&mut self, high: bool, at: Instant) -> Option<PulseEvent> {
        let level = if high {
            PulseLevel::High
        } else {
            PulseLevel::Low
        };

        match self.current {
            Some((previous, _)) if previous == level => None,
            Some((previous, since)) => {
                self.current = Some((level, at));
                Some(PulseEvent::new(
                    previous,
                    saturating_ms(at.saturating_duration_since(since)),
                ))
            }
            None => {
                self.current = Some((level, at));
                None
            }
        }
    }
}

impl Default for EdgeTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(u16::MAX)
}
