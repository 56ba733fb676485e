//! Pulse-to-RTC pipeline.
//!
//! [`Dcf77Decoder`] ties classification, the frame state machine and the
//! commit scheduler together. It is driven by cooperative polling: each call
//! to [`Dcf77Decoder::poll`] drains at most one pulse from the mailbox. High
//! pulses carry bits; every low pulse gives a pending commit its chance to
//! run, independent of whether it was a minute marker.

use crate::clock::SharedClock;
use crate::commit::{COMMIT_SECOND, CommitError, CommitPlan, CommitScheduler, RtcWriter};
use crate::diagnostics::{DiagnosticsSink, NoopDiagnostics};
use crate::frame::{BitOutcome, DecodeError, FrameDecoder, MarkerOutcome};
use crate::mailbox::PulseMailbox;
use crate::pulse::{HighPulse, LowPulse, PulseEvent, PulseLevel, PulseSymbol, PulseTiming};

/// Tunables for the decoding pipeline.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecoderConfig {
    pub timing: PulseTiming,
    pub commit_second: u8,
}

impl DecoderConfig {
    #[must_use]
    pub const fn new(timing: PulseTiming, commit_second: u8) -> Self {
        Self {
            timing,
            commit_second,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new(PulseTiming::dcf77(), COMMIT_SECOND)
    }
}

/// Running counters kept by the decoder.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DecoderStats {
    pub pulses: u32,
    pub frames_started: u32,
    /// Markers that cut an unfinished frame short.
    pub frames_restarted: u32,
    pub failures: u32,
    pub commits: u32,
    pub rtc_errors: u32,
}

/// What a single pulse did to the frame decoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PulseOutcome {
    Bit(BitOutcome),
    Marker(MarkerOutcome),
    /// Ordinary gap between two second pulses.
    Gap,
    /// The pulse or frame was rejected; the decoder is waiting again.
    Failed(DecodeError),
}

/// Result of processing one pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StepReport<E> {
    pub outcome: PulseOutcome,
    /// Present when this pulse triggered a commit.
    pub commit: Option<Result<CommitPlan, CommitError<E>>>,
}

impl<E> StepReport<E> {
    const fn without_commit(outcome: PulseOutcome) -> Self {
        Self {
            outcome,
            commit: None,
        }
    }
}

/// Decoder pipeline owning the RTC collaborator and a diagnostics sink.
pub struct Dcf77Decoder<R, D = NoopDiagnostics> {
    frame: FrameDecoder,
    scheduler: CommitScheduler,
    timing: PulseTiming,
    rtc: R,
    diagnostics: D,
    stats: DecoderStats,
}

impl<R, D> Dcf77Decoder<R, D>
where
    R: RtcWriter,
    D: DiagnosticsSink,
{
    pub fn new(rtc: R, diagnostics: D) -> Self {
        Self::with_config(DecoderConfig::default(), rtc, diagnostics)
    }

    pub fn with_config(config: DecoderConfig, rtc: R, diagnostics: D) -> Self {
        Self {
            frame: FrameDecoder::new(),
            scheduler: CommitScheduler::new(config.commit_second),
            timing: config.timing,
            rtc,
            diagnostics,
            stats: DecoderStats::default(),
        }
    }

    /// Processes the pending pulse, if any.
    pub fn poll(
        &mut self,
        mailbox: &PulseMailbox,
        clock: &SharedClock,
    ) -> Option<StepReport<R::Error>> {
        let event = mailbox.take()?;
        Some(self.handle_pulse(event, clock))
    }

    pub fn handle_pulse(&mut self, event: PulseEvent, clock: &SharedClock) -> StepReport<R::Error> {
        self.stats.pulses = self.stats.pulses.wrapping_add(1);
        match event.level {
            PulseLevel::High => StepReport::without_commit(self.handle_high(event.duration_ms)),
            PulseLevel::Low => {
                let outcome = self.handle_low(event.duration_ms);
                StepReport {
                    outcome,
                    commit: self.commit_pending(clock),
                }
            }
        }
    }

    #[must_use]
    pub fn frame(&self) -> &FrameDecoder {
        &self.frame
    }

    #[must_use]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    #[must_use]
    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    #[must_use]
    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }

    fn handle_high(&mut self, duration_ms: u16) -> PulseOutcome {
        let class = self.timing.classify_high(duration_ms);
        let outcome = match class {
            HighPulse::Zero | HighPulse::One => {
                let bit = matches!(class, HighPulse::One);
                match self.frame.accept_bit(bit) {
                    Ok(progress) => PulseOutcome::Bit(progress),
                    Err(error) => self.fail(error),
                }
            }
            HighPulse::Invalid => {
                self.frame.reset();
                self.fail(DecodeError::PulseTiming { duration_ms })
            }
        };
        self.diagnostics.on_pulse(class.symbol(), duration_ms);
        outcome
    }

    fn handle_low(&mut self, duration_ms: u16) -> PulseOutcome {
        match self.timing.classify_low(duration_ms) {
            LowPulse::StartMarker => {
                let marker = self.frame.accept_start_marker();
                self.stats.frames_started = self.stats.frames_started.wrapping_add(1);
                if marker == MarkerOutcome::Restarted {
                    self.stats.frames_restarted = self.stats.frames_restarted.wrapping_add(1);
                }
                self.diagnostics.on_read_started();
                self.diagnostics.on_pulse(PulseSymbol::Start, duration_ms);
                PulseOutcome::Marker(marker)
            }
            LowPulse::Ordinary => PulseOutcome::Gap,
        }
    }

    fn commit_pending(
        &mut self,
        clock: &SharedClock,
    ) -> Option<Result<CommitPlan, CommitError<R::Error>>> {
        let pending = self.frame.take_commit()?;
        let result = self.scheduler.commit(&pending, &mut self.rtc, clock);
        self.stats.commits = self.stats.commits.wrapping_add(1);
        if result.is_err() {
            self.stats.rtc_errors = self.stats.rtc_errors.wrapping_add(1);
        }
        self.diagnostics.on_signal_committed();
        Some(result)
    }

    fn fail(&mut self, error: DecodeError) -> PulseOutcome {
        self.stats.failures = self.stats.failures.wrapping_add(1);
        self.diagnostics.on_read_failed();
        PulseOutcome::Failed(error)
    }
}
