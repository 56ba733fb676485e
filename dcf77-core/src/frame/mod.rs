//! Sequential minute-frame decoder.
//!
//! [`FrameDecoder`] consumes one bit per second, walking the
//! [`layout::FRAME_LAYOUT`] table. BCD fields accumulate into a
//! [`PendingFrame`], a single rolling parity flag is reused for the minute,
//! hour and date checks, and any violation resets the decoder so the next
//! minute marker starts from a clean slate.

use core::fmt;

pub mod layout;

pub use layout::{Field, ParityDomain, Slot};

use layout::{FRAME_LAYOUT, POSITION_COUNT};

/// Position of the decoder inside the minute frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DecodeState(u8);

impl DecodeState {
    /// Waiting for a minute marker; bits are dropped.
    pub const WAIT_START: Self = Self(0);
    /// Ready to consume frame bit 0.
    pub const FIRST_BIT: Self = Self(1);

    /// Raw table index.
    #[must_use]
    pub const fn position(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_waiting(self) -> bool {
        self.0 == Self::WAIT_START.0
    }

    /// Frame bit consumed next, or `None` while waiting.
    #[must_use]
    pub const fn frame_bit(self) -> Option<u8> {
        if self.is_waiting() || self.0 as usize >= POSITION_COUNT {
            None
        } else {
            Some(self.0 - 1)
        }
    }

    /// Transition rule for this position; `None` outside the layout.
    #[must_use]
    pub fn slot(self) -> Option<Slot> {
        FRAME_LAYOUT.get(usize::from(self.0)).copied()
    }

    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl Default for DecodeState {
    fn default() -> Self {
        Self::WAIT_START
    }
}

/// Calendar fields decoded so far.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PendingFrame {
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl PendingFrame {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            minute: 0,
            hour: 0,
            day: 0,
            month: 0,
            year: 0,
        }
    }

    /// Returns `true` when any date field accumulated a value.
    #[must_use]
    pub const fn has_date(&self) -> bool {
        self.day != 0 || self.month != 0 || self.year != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.minute == 0 && self.hour == 0 && !self.has_date()
    }

    fn add(&mut self, field: Field, weight: u8) {
        let slot = match field {
            Field::Minute => &mut self.minute,
            Field::Hour => &mut self.hour,
            Field::Day => &mut self.day,
            Field::Month => &mut self.month,
            Field::Year => &mut self.year,
        };
        *slot = slot.saturating_add(weight);
    }
}

/// Reasons a pulse or frame is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// High pulse outside both bit windows.
    PulseTiming { duration_ms: u16 },
    /// The start-of-time bit read as 0.
    StartBit,
    /// Accumulated parity disagreed with the transmitted parity bit.
    Parity(ParityDomain),
    /// Decoder position outside the frame layout.
    InvalidState { position: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::PulseTiming { duration_ms } => {
                write!(f, "pulse of {duration_ms} ms outside every bit window")
            }
            DecodeError::StartBit => f.write_str("start-of-time bit read as 0"),
            DecodeError::Parity(domain) => write!(f, "{domain} parity mismatch"),
            DecodeError::InvalidState { position } => {
                write!(f, "decoder position {position} outside the frame layout")
            }
        }
    }
}

/// Progress reported for an accepted bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitOutcome {
    /// No frame in progress; the bit was dropped.
    Waiting,
    /// The bit was consumed and the decoder moved one position.
    Advanced,
    /// Hour parity matched: a complete time is ready to commit.
    TimeDecoded,
    /// Date parity matched: the frame is complete, back to waiting.
    FrameComplete,
}

/// Result of a minute marker.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MarkerOutcome {
    /// A new frame starts after a completed frame or while idle.
    Started,
    /// The marker cut an unfinished frame short; its fields were discarded.
    Restarted,
}

/// State machine over the 59-bit frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameDecoder {
    state: DecodeState,
    pending: PendingFrame,
    parity: bool,
    commit_intent: bool,
}

impl FrameDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DecodeState::WAIT_START,
            pending: PendingFrame::empty(),
            parity: false,
            commit_intent: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> DecodeState {
        self.state
    }

    #[must_use]
    pub const fn pending(&self) -> &PendingFrame {
        &self.pending
    }

    /// Rolling parity of the group currently being received.
    #[must_use]
    pub const fn parity(&self) -> bool {
        self.parity
    }

    /// `true` between a matching hour parity and the next commit.
    #[must_use]
    pub const fn commit_intent(&self) -> bool {
        self.commit_intent
    }

    /// Enters frame bit 0 after a minute marker.
    pub fn accept_start_marker(&mut self) -> MarkerOutcome {
        let outcome = if self.state.is_waiting() {
            MarkerOutcome::Started
        } else {
            self.reset();
            MarkerOutcome::Restarted
        };
        self.state = DecodeState::FIRST_BIT;
        outcome
    }

    /// Consumes one bit and advances exactly one position.
    ///
    /// On error the decoder has already been reset and waits for the next
    /// minute marker.
    pub fn accept_bit(&mut self, bit: bool) -> Result<BitOutcome, DecodeError> {
        let Some(slot) = self.state.slot() else {
            let position = self.state.position();
            return Err(self.fail(DecodeError::InvalidState { position }));
        };

        match slot {
            Slot::WaitStart => Ok(BitOutcome::Waiting),
            Slot::Ignored => Ok(self.advance()),
            Slot::StartBit => {
                if bit {
                    Ok(self.advance())
                } else {
                    Err(self.fail(DecodeError::StartBit))
                }
            }
            Slot::Weighted { field, weight } => {
                if bit {
                    self.pending.add(field, weight);
                }
                self.parity ^= bit;
                Ok(self.advance())
            }
            Slot::Discarded => {
                self.parity ^= bit;
                Ok(self.advance())
            }
            Slot::Parity(domain) => self.check_parity(domain, bit),
        }
    }

    /// Returns to the wait-for-start position and clears every field and flag.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Consumes the commit intent, handing out the decoded fields and clearing them.
    pub fn take_commit(&mut self) -> Option<PendingFrame> {
        if !self.commit_intent {
            return None;
        }
        self.commit_intent = false;
        Some(core::mem::take(&mut self.pending))
    }

    fn check_parity(&mut self, domain: ParityDomain, bit: bool) -> Result<BitOutcome, DecodeError> {
        if self.parity != bit {
            return Err(self.fail(DecodeError::Parity(domain)));
        }

        self.parity = false;
        match domain {
            ParityDomain::Minute => Ok(self.advance()),
            ParityDomain::Hour => {
                self.commit_intent = true;
                self.advance();
                Ok(BitOutcome::TimeDecoded)
            }
            ParityDomain::Date => {
                self.state = DecodeState::WAIT_START;
                Ok(BitOutcome::FrameComplete)
            }
        }
    }

    fn advance(&mut self) -> BitOutcome {
        self.state = self.state.next();
        BitOutcome::Advanced
    }

    fn fail(&mut self, error: DecodeError) -> DecodeError {
        self.reset();
        error
    }
}

#[cfg(test)]
mod tests {
    use super::layout::{HOUR_BITS, MINUTE_BITS, START_BIT};
    use super::*;

    fn decoder_at_minute_bits() -> FrameDecoder {
        let mut decoder = FrameDecoder::new();
        decoder.accept_start_marker();
        for _ in 0..START_BIT {
            decoder.accept_bit(false).unwrap();
        }
        decoder.accept_bit(true).unwrap();
        assert_eq!(decoder.state().frame_bit(), Some(MINUTE_BITS.first_bit));
        decoder
    }

    #[test]
    fn bits_are_dropped_until_a_marker_arrives() {
        let mut decoder = FrameDecoder::new();
        for index in 0..200 {
            let outcome = decoder.accept_bit(index % 3 == 0).unwrap();
            assert_eq!(outcome, BitOutcome::Waiting);
        }
        assert_eq!(decoder.state(), DecodeState::WAIT_START);
        assert!(decoder.pending().is_empty());
        assert!(!decoder.parity());
    }

    #[test]
    fn ignored_bits_advance_regardless_of_value() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.accept_start_marker(), MarkerOutcome::Started);
        assert_eq!(decoder.accept_bit(true), Ok(BitOutcome::Advanced));
        assert_eq!(decoder.accept_bit(false), Ok(BitOutcome::Advanced));
        assert_eq!(decoder.state().frame_bit(), Some(2));
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn cleared_start_bit_fails_and_resets() {
        let mut decoder = FrameDecoder::new();
        decoder.accept_start_marker();
        for _ in 0..START_BIT {
            decoder.accept_bit(true).unwrap();
        }
        assert_eq!(decoder.accept_bit(false), Err(DecodeError::StartBit));
        assert_eq!(decoder.state(), DecodeState::WAIT_START);
    }

    #[test]
    fn minute_bits_accumulate_bcd_and_parity() {
        let mut decoder = decoder_at_minute_bits();
        // 37 = 1 + 2 + 4 + 10 + 20 -> bits 1,1,1,0,1,1,0
        for bit in [true, true, true, false, true, true, false] {
            decoder.accept_bit(bit).unwrap();
        }
        assert_eq!(decoder.pending().minute, 37);
        assert!(decoder.parity());
        assert_eq!(decoder.accept_bit(true), Ok(BitOutcome::Advanced));
        assert!(!decoder.parity());
        assert_eq!(decoder.state().frame_bit(), Some(HOUR_BITS.first_bit));
    }

    #[test]
    fn minute_parity_mismatch_clears_everything() {
        let mut decoder = decoder_at_minute_bits();
        for bit in [true, false, false, false, false, false, false] {
            decoder.accept_bit(bit).unwrap();
        }
        assert_eq!(
            decoder.accept_bit(false),
            Err(DecodeError::Parity(ParityDomain::Minute))
        );
        assert_eq!(decoder, FrameDecoder::new());
    }

    #[test]
    fn hour_parity_sets_commit_intent() {
        let mut decoder = decoder_at_minute_bits();
        for _ in 0..MINUTE_BITS.width {
            decoder.accept_bit(false).unwrap();
        }
        decoder.accept_bit(false).unwrap();
        // hour 12 = 2 + 10 -> bits 0,1,0,0,1,0
        for bit in [false, true, false, false, true, false] {
            decoder.accept_bit(bit).unwrap();
        }
        assert!(!decoder.commit_intent());
        assert_eq!(decoder.accept_bit(false), Ok(BitOutcome::TimeDecoded));
        assert!(decoder.commit_intent());
        assert_eq!(decoder.pending().hour, 12);

        let taken = decoder.take_commit().expect("intent should be pending");
        assert_eq!(taken.hour, 12);
        assert!(!decoder.commit_intent());
        assert!(decoder.pending().is_empty());
        assert_eq!(decoder.take_commit(), None);
    }

    #[test]
    fn marker_mid_frame_discards_partial_fields() {
        let mut decoder = decoder_at_minute_bits();
        decoder.accept_bit(true).unwrap();
        decoder.accept_bit(true).unwrap();
        assert_eq!(decoder.pending().minute, 3);

        assert_eq!(decoder.accept_start_marker(), MarkerOutcome::Restarted);
        assert_eq!(decoder.state(), DecodeState::FIRST_BIT);
        assert!(decoder.pending().is_empty());
        assert!(!decoder.parity());
    }

    #[test]
    fn out_of_layout_position_is_rejected() {
        let mut decoder = FrameDecoder::new();
        decoder.state = DecodeState(200);
        assert_eq!(
            decoder.accept_bit(true),
            Err(DecodeError::InvalidState { position: 200 })
        );
        assert_eq!(decoder.state(), DecodeState::WAIT_START);
    }

    #[test]
    fn errors_render_human_readable_text() {
        let mut text: heapless::String<64> = heapless::String::new();
        core::fmt::write(&mut text, format_args!("{}", DecodeError::Parity(ParityDomain::Date)))
            .unwrap();
        assert_eq!(text.as_str(), "date parity mismatch");
    }
}
