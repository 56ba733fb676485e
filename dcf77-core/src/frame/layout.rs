//! Compile-time description of the 59-bit DCF77 minute frame.
//!
//! Each decoder position maps to one tagged [`Slot`]. Position 0 waits for the
//! minute marker; positions 1..=59 correspond to frame bits 0..=58. The table
//! is generated from the field spans below so every weight and width lives in
//! exactly one place.

use core::fmt;

/// Number of bits transmitted per minute (bit 59 is the marker gap).
pub const FRAME_BITS: usize = 59;
/// Decoder positions: one wait-for-start position plus one per frame bit.
pub const POSITION_COUNT: usize = FRAME_BITS + 1;
/// Leading bits whose values the decoder never inspects.
pub const IGNORED_BITS: u8 = 20;

/// Decimal weights of consecutive bits inside a BCD field.
pub const BCD_WEIGHTS: [u8; 8] = [1, 2, 4, 8, 10, 20, 40, 80];

/// Frame bit that must always read as 1 ("start of encoded time").
pub const START_BIT: u8 = IGNORED_BITS;
pub const MINUTE_BITS: FieldSpan = FieldSpan::new(21, 7);
pub const MINUTE_PARITY_BIT: u8 = 28;
pub const HOUR_BITS: FieldSpan = FieldSpan::new(29, 6);
pub const HOUR_PARITY_BIT: u8 = 35;
pub const DAY_BITS: FieldSpan = FieldSpan::new(36, 6);
pub const WEEKDAY_BITS: FieldSpan = FieldSpan::new(42, 3);
pub const MONTH_BITS: FieldSpan = FieldSpan::new(45, 5);
pub const YEAR_BITS: FieldSpan = FieldSpan::new(50, 8);
pub const DATE_PARITY_BIT: u8 = 58;

/// Calendar fields accumulated from weighted bits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

/// The three independent even-parity groups of a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParityDomain {
    Minute,
    Hour,
    /// Day, day-of-week, month and year together.
    Date,
}

impl fmt::Display for ParityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParityDomain::Minute => f.write_str("minute"),
            ParityDomain::Hour => f.write_str("hour"),
            ParityDomain::Date => f.write_str("date"),
        }
    }
}

/// Transition rule applied at one decoder position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    /// Bits are dropped until a minute marker arrives.
    WaitStart,
    /// Value discarded, position advances unconditionally.
    Ignored,
    /// Must read as 1.
    StartBit,
    /// Adds `weight` to `field` when set and feeds the rolling parity.
    Weighted { field: Field, weight: u8 },
    /// Feeds the rolling parity only (day of week).
    Discarded,
    /// Compares the rolling parity with the transmitted bit.
    Parity(ParityDomain),
}

/// Consecutive run of frame bits holding one field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldSpan {
    pub first_bit: u8,
    pub width: u8,
}

impl FieldSpan {
    #[must_use]
    pub const fn new(first_bit: u8, width: u8) -> Self {
        Self { first_bit, width }
    }

    /// Returns `true` when `frame_bit` belongs to this span.
    #[must_use]
    pub const fn contains(&self, frame_bit: u8) -> bool {
        frame_bit >= self.first_bit && frame_bit < self.first_bit + self.width
    }
}

/// Transition table indexed by decoder position.
pub const FRAME_LAYOUT: [Slot; POSITION_COUNT] = build_layout();

/// Decoder position that consumes `frame_bit`.
#[must_use]
pub const fn position_of(frame_bit: u8) -> usize {
    frame_bit as usize + 1
}

/// Looks up the slot that consumes `frame_bit`, if it is part of the frame.
#[must_use]
pub const fn slot_for_bit(frame_bit: u8) -> Option<Slot> {
    let position = position_of(frame_bit);
    if position < POSITION_COUNT {
        Some(FRAME_LAYOUT[position])
    } else {
        None
    }
}

const fn build_layout() -> [Slot; POSITION_COUNT] {
    let mut slots = [Slot::Ignored; POSITION_COUNT];
    slots[0] = Slot::WaitStart;
    slots[position_of(START_BIT)] = Slot::StartBit;

    weighted(&mut slots, MINUTE_BITS, Field::Minute);
    slots[position_of(MINUTE_PARITY_BIT)] = Slot::Parity(ParityDomain::Minute);

    weighted(&mut slots, HOUR_BITS, Field::Hour);
    slots[position_of(HOUR_PARITY_BIT)] = Slot::Parity(ParityDomain::Hour);

    weighted(&mut slots, DAY_BITS, Field::Day);
    discarded(&mut slots, WEEKDAY_BITS);
    weighted(&mut slots, MONTH_BITS, Field::Month);
    weighted(&mut slots, YEAR_BITS, Field::Year);
    slots[position_of(DATE_PARITY_BIT)] = Slot::Parity(ParityDomain::Date);

    slots
}

const fn weighted(slots: &mut [Slot; POSITION_COUNT], span: FieldSpan, field: Field) {
    let mut offset = 0;
    while offset < span.width as usize {
        slots[position_of(span.first_bit) + offset] = Slot::Weighted {
            field,
            weight: BCD_WEIGHTS[offset],
        };
        offset += 1;
    }
}

const fn discarded(slots: &mut [Slot; POSITION_COUNT], span: FieldSpan) {
    let mut offset = 0;
    while offset < span.width as usize {
        slots[position_of(span.first_bit) + offset] = Slot::Discarded;
        offset += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights_of(field: Field) -> heapless::Vec<u8, 8> {
        FRAME_LAYOUT
            .iter()
            .filter_map(|slot| match slot {
                Slot::Weighted { field: f, weight } if *f == field => Some(*weight),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn layout_has_twenty_ignored_bits_then_start_bit() {
        assert_eq!(FRAME_LAYOUT[0], Slot::WaitStart);
        for bit in 0..IGNORED_BITS {
            assert_eq!(slot_for_bit(bit), Some(Slot::Ignored), "bit {bit}");
        }
        assert_eq!(slot_for_bit(START_BIT), Some(Slot::StartBit));
        let ignored = FRAME_LAYOUT
            .iter()
            .filter(|slot| **slot == Slot::Ignored)
            .count();
        assert_eq!(ignored, usize::from(IGNORED_BITS));
    }

    #[test]
    fn field_weights_are_truncated_bcd_sequences() {
        assert_eq!(weights_of(Field::Minute).as_slice(), &[1, 2, 4, 8, 10, 20, 40]);
        assert_eq!(weights_of(Field::Hour).as_slice(), &[1, 2, 4, 8, 10, 20]);
        assert_eq!(weights_of(Field::Day).as_slice(), &[1, 2, 4, 8, 10, 20]);
        assert_eq!(weights_of(Field::Month).as_slice(), &[1, 2, 4, 8, 10]);
        assert_eq!(
            weights_of(Field::Year).as_slice(),
            &[1, 2, 4, 8, 10, 20, 40, 80]
        );
    }

    #[test]
    fn parity_and_weekday_slots_sit_at_expected_bits() {
        assert_eq!(
            slot_for_bit(MINUTE_PARITY_BIT),
            Some(Slot::Parity(ParityDomain::Minute))
        );
        assert_eq!(
            slot_for_bit(HOUR_PARITY_BIT),
            Some(Slot::Parity(ParityDomain::Hour))
        );
        assert_eq!(
            slot_for_bit(DATE_PARITY_BIT),
            Some(Slot::Parity(ParityDomain::Date))
        );
        for bit in 42..45 {
            assert_eq!(slot_for_bit(bit), Some(Slot::Discarded));
        }
        assert_eq!(slot_for_bit(59), None);
    }

    #[test]
    fn spans_tile_the_frame_without_gaps() {
        assert_eq!(MINUTE_BITS.first_bit, START_BIT + 1);
        assert_eq!(MINUTE_PARITY_BIT, MINUTE_BITS.first_bit + MINUTE_BITS.width);
        assert_eq!(HOUR_BITS.first_bit, MINUTE_PARITY_BIT + 1);
        assert_eq!(HOUR_PARITY_BIT, HOUR_BITS.first_bit + HOUR_BITS.width);
        assert_eq!(DAY_BITS.first_bit, HOUR_PARITY_BIT + 1);
        assert_eq!(WEEKDAY_BITS.first_bit, DAY_BITS.first_bit + DAY_BITS.width);
        assert_eq!(MONTH_BITS.first_bit, WEEKDAY_BITS.first_bit + WEEKDAY_BITS.width);
        assert_eq!(YEAR_BITS.first_bit, MONTH_BITS.first_bit + MONTH_BITS.width);
        assert_eq!(DATE_PARITY_BIT, YEAR_BITS.first_bit + YEAR_BITS.width);
        assert_eq!(usize::from(DATE_PARITY_BIT) + 1, FRAME_BITS);
    }
}
