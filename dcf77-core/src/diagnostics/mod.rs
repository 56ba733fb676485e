//! Fire-and-forget notifications emitted while decoding.
//!
//! Sinks observe the decoder; they never influence it. Every callback has a
//! no-op default so a sink only implements what it displays.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::pulse::PulseSymbol;

pub mod info_screen;

pub use info_screen::{InfoScreen, ReadStatus};

/// Observer of decoder progress.
pub trait DiagnosticsSink {
    fn on_zero(&mut self, _duration_ms: u16) {}
    fn on_one(&mut self, _duration_ms: u16) {}
    fn on_start(&mut self, _duration_ms: u16) {}
    fn on_invalid(&mut self, _duration_ms: u16) {}
    fn on_read_started(&mut self) {}
    fn on_read_failed(&mut self) {}
    fn on_signal_committed(&mut self) {}

    /// Dispatches a classified pulse to the matching callback.
    fn on_pulse(&mut self, symbol: PulseSymbol, duration_ms: u16) {
        match symbol {
            PulseSymbol::Zero => self.on_zero(duration_ms),
            PulseSymbol::One => self.on_one(duration_ms),
            PulseSymbol::Start => self.on_start(duration_ms),
            PulseSymbol::Invalid => self.on_invalid(duration_ms),
        }
    }
}

/// Sink that discards every notification.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {}

impl<T> DiagnosticsSink for &mut T
where
    T: DiagnosticsSink + ?Sized,
{
    fn on_zero(&mut self, duration_ms: u16) {
        (**self).on_zero(duration_ms);
    }

    fn on_one(&mut self, duration_ms: u16) {
        (**self).on_one(duration_ms);
    }

    fn on_start(&mut self, duration_ms: u16) {
        (**self).on_start(duration_ms);
    }

    fn on_invalid(&mut self, duration_ms: u16) {
        (**self).on_invalid(duration_ms);
    }

    fn on_read_started(&mut self) {
        (**self).on_read_started();
    }

    fn on_read_failed(&mut self) {
        (**self).on_read_failed();
    }

    fn on_signal_committed(&mut self) {
        (**self).on_signal_committed();
    }
}

/// Fans every notification out to two sinks, first `A` then `B`.
impl<A, B> DiagnosticsSink for (A, B)
where
    A: DiagnosticsSink,
    B: DiagnosticsSink,
{
    fn on_zero(&mut self, duration_ms: u16) {
        self.0.on_zero(duration_ms);
        self.1.on_zero(duration_ms);
    }

    fn on_one(&mut self, duration_ms: u16) {
        self.0.on_one(duration_ms);
        self.1.on_one(duration_ms);
    }

    fn on_start(&mut self, duration_ms: u16) {
        self.0.on_start(duration_ms);
        self.1.on_start(duration_ms);
    }

    fn on_invalid(&mut self, duration_ms: u16) {
        self.0.on_invalid(duration_ms);
        self.1.on_invalid(duration_ms);
    }

    fn on_read_started(&mut self) {
        self.0.on_read_started();
        self.1.on_read_started();
    }

    fn on_read_failed(&mut self) {
        self.0.on_read_failed();
        self.1.on_read_failed();
    }

    fn on_signal_committed(&mut self) {
        self.0.on_signal_committed();
        self.1.on_signal_committed();
    }
}

/// Notification as stored by [`DiagnosticsRecorder`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DiagnosticEvent {
    Pulse { symbol: PulseSymbol, duration_ms: u16 },
    ReadStarted,
    ReadFailed,
    SignalCommitted,
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::Pulse {
                symbol,
                duration_ms,
            } => write!(f, "pulse {symbol} {duration_ms}ms"),
            DiagnosticEvent::ReadStarted => f.write_str("read-started"),
            DiagnosticEvent::ReadFailed => f.write_str("read-failed"),
            DiagnosticEvent::SignalCommitted => f.write_str("signal-committed"),
        }
    }
}

/// Default number of notifications retained by a recorder.
pub const DIAGNOSTICS_RING_CAPACITY: usize = 64;

/// Numbered notification stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticRecord {
    pub id: u32,
    pub event: DiagnosticEvent,
}

/// Sink that keeps the most recent notifications in a fixed-size ring.
pub struct DiagnosticsRecorder<const CAPACITY: usize = DIAGNOSTICS_RING_CAPACITY> {
    ring: HistoryBuf<DiagnosticRecord, CAPACITY>,
    next_id: u32,
}

impl<const CAPACITY: usize> DiagnosticsRecorder<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 0,
        }
    }

    /// Iterates the retained notifications in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, DiagnosticRecord> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&DiagnosticRecord> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total notifications seen, including those evicted from the ring.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.next_id
    }

    pub fn record(&mut self, event: DiagnosticEvent) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.ring.write(DiagnosticRecord { id, event });
        id
    }
}

impl<const CAPACITY: usize> Default for DiagnosticsRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> DiagnosticsSink for DiagnosticsRecorder<CAPACITY> {
    fn on_zero(&mut self, duration_ms: u16) {
        self.on_pulse(PulseSymbol::Zero, duration_ms);
    }

    fn on_one(&mut self, duration_ms: u16) {
        self.on_pulse(PulseSymbol::One, duration_ms);
    }

    fn on_start(&mut self, duration_ms: u16) {
        self.on_pulse(PulseSymbol::Start, duration_ms);
    }

    fn on_invalid(&mut self, duration_ms: u16) {
        self.on_pulse(PulseSymbol::Invalid, duration_ms);
    }

    fn on_read_started(&mut self) {
        self.record(DiagnosticEvent::ReadStarted);
    }

    fn on_read_failed(&mut self) {
        self.record(DiagnosticEvent::ReadFailed);
    }

    fn on_signal_committed(&mut self) {
        self.record(DiagnosticEvent::SignalCommitted);
    }

    fn on_pulse(&mut self, symbol: PulseSymbol, duration_ms: u16) {
        self.record(DiagnosticEvent::Pulse {
            symbol,
            duration_ms,
        });
    }
}
