//! Single-slot handoff between the edge-capture context and the decoder.
//!
//! The capture side posts the latest `(level, duration)` pair; the polling
//! decoder swaps it out. The slot is one packed `AtomicU32`, so a read can
//! never observe a level from one edge combined with the duration of another.
//!
//! This is a mailbox, not a queue: posting over an unconsumed pulse replaces
//! it. [`PulseMailbox::post`] reports the overwrite and the mailbox counts
//! them, which is the only way the decoder learns that it fell behind.

use portable_atomic::{AtomicU32, Ordering};

use crate::pulse::{PulseEvent, PulseLevel};

const FILLED: u32 = 1 << 31;
const HIGH: u32 = 1 << 16;
const DURATION_MASK: u32 = 0xFFFF;

fn encode(event: PulseEvent) -> u32 {
    let level = match event.level {
        PulseLevel::High => HIGH,
        PulseLevel::Low => 0,
    };
    FILLED | level | u32::from(event.duration_ms)
}

const fn decode(raw: u32) -> Option<PulseEvent> {
    if raw & FILLED == 0 {
        return None;
    }
    let level = if raw & HIGH == 0 {
        PulseLevel::Low
    } else {
        PulseLevel::High
    };
    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = (raw & DURATION_MASK) as u16;
    Some(PulseEvent::new(level, duration_ms))
}

#[derive(Debug)]
pub struct PulseMailbox {
    slot: AtomicU32,
    overruns: AtomicU32,
}

impl PulseMailbox {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Stores `event`, returning `true` if an unconsumed pulse was overwritten.
    pub fn post(&self, event: PulseEvent) -> bool {
        let previous = self.slot.swap(encode(event), Ordering::AcqRel);
        let overwritten = previous & FILLED != 0;
        if overwritten {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
        overwritten
    }

    /// Removes the pending pulse, leaving the slot empty.
    pub fn take(&self) -> Option<PulseEvent> {
        decode(self.slot.swap(0, Ordering::AcqRel))
    }

    /// Returns the pending pulse without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<PulseEvent> {
        decode(self.slot.load(Ordering::Acquire))
    }

    /// Number of pulses lost to overwrites since creation.
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl Default for PulseMailbox {
    fn default() -> Self {
        Self::new()
    }
}
