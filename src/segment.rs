//! 7-segment character table and glyph lookup.
//!
//! ```text
//!        a
//!      -----
//!    f|     |b
//!     |  g  |
//!      -----
//!    e|     |c
//!     |     |
//!      -----  o dp
//!        d
//!
//! bit:  7   6  5  4  3  2  1  0
//!       dp  g  f  e  d  c  b  a
//! ```

/// Number of entries in [`CHAR_TABLE`].
pub const CHAR_TABLE_SIZE: usize = 47;

/// Table index of the blank glyph, all segments off.
pub const BLANK: u8 = 0x20;

/// Mask of the segment bits a..g in a digit byte.
pub const SEGMENT_MASK: u8 = 0x7f;

/// Segment patterns, indexed by [`Glyph`].
pub const CHAR_TABLE: [u8; CHAR_TABLE_SIZE] = [
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x67, // 0-9
    0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, // A b C d E F
    0x58, 0x6f, 0x74, 0x76, 0x10, 0x30, 0x1e, 0x38, // c g h H i I J L
    0x54, 0x37, 0x73, 0x50, 0x78, 0x1c, 0x3e, 0x6e, // n N P r t u U y
    0x00, // blank
    0x01, 0x40, 0x08, 0x63, 0x5c, 0x46, 0x70, // dashes, boxes, borders
    0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, // single segments a..g
];

/// Named entries of the character table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Glyph {
    Zero = 0,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    UpperA,
    LowerB,
    UpperC,
    LowerD,
    UpperE,
    UpperF,
    LowerC,
    LowerG,
    LowerH,
    UpperH,
    LowerI,
    UpperI,
    UpperJ,
    UpperL,
    LowerN,
    UpperN,
    UpperP,
    LowerR,
    LowerT,
    LowerU,
    UpperU,
    LowerY,
    Space,
    UpperDash,
    MiddleDash,
    LowerDash,
    UpperBox,
    LowerBox,
    LeftBorder,
    RightBorder,
    SegA,
    SegB,
    SegC,
    SegD,
    SegE,
    SegF,
    SegG,
}

impl From<Glyph> for u8 {
    fn from(glyph: Glyph) -> u8 {
        glyph as u8
    }
}

/// Looks up the segment pattern for a table index.
///
/// Indices past the end of the table render as [`BLANK`].
pub fn encode(index: u8) -> u8 {
    match CHAR_TABLE.get(usize::from(index)) {
        Some(pattern) => *pattern,
        None => CHAR_TABLE[BLANK as usize],
    }
}

/// Keeps only the segment bits of a caller supplied pattern.
pub const fn raw_encode(bits: u8) -> u8 {
    bits & SEGMENT_MASK
}

/// Translates a printable ASCII byte into a table index.
///
/// Characters without a usable 7-segment shape map to [`BLANK`].
pub fn glyph_for_ascii(b: u8) -> u8 {
    let glyph = match b as char {
        c @ '0'..='9' => return c as u8 - b'0',
        'a' | 'A' => Glyph::UpperA,
        'b' | 'B' => Glyph::LowerB,
        'C' | '[' | '(' => Glyph::UpperC,
        'c' => Glyph::LowerC,
        'd' | 'D' => Glyph::LowerD,
        'e' | 'E' => Glyph::UpperE,
        'f' | 'F' => Glyph::UpperF,
        'g' | 'G' => Glyph::LowerG,
        'h' => Glyph::LowerH,
        'H' => Glyph::UpperH,
        'i' => Glyph::LowerI,
        'I' => Glyph::UpperI,
        'j' | 'J' => Glyph::UpperJ,
        'l' | 'L' => Glyph::UpperL,
        'n' => Glyph::LowerN,
        'N' => Glyph::UpperN,
        'o' => Glyph::LowerBox,
        'O' => Glyph::Zero,
        'p' | 'P' => Glyph::UpperP,
        'r' | 'R' => Glyph::LowerR,
        's' | 'S' => Glyph::Five,
        't' | 'T' => Glyph::LowerT,
        'u' => Glyph::LowerU,
        'U' => Glyph::UpperU,
        'y' | 'Y' => Glyph::LowerY,
        '-' => Glyph::MiddleDash,
        '_' => Glyph::LowerDash,
        ']' | ')' => Glyph::RightBorder,
        // K, M, V, W, X, Z undoable
        _ => Glyph::Space,
    };

    glyph.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_documented_patterns() {
        assert_eq!(CHAR_TABLE.len(), 47);
        assert_eq!(encode(0), 0x3f);
        assert_eq!(encode(8), 0x7f);
        assert_eq!(encode(Glyph::UpperF.into()), 0x71);
        assert_eq!(encode(Glyph::LowerY.into()), 0x6e);
        assert_eq!(encode(Glyph::MiddleDash.into()), 0x40);
        assert_eq!(encode(Glyph::RightBorder.into()), 0x70);
        assert_eq!(encode(Glyph::SegG.into()), 0x40);
        assert_eq!(Glyph::SegG as usize, CHAR_TABLE_SIZE - 1);
    }

    #[test]
    fn every_pattern_fits_in_seven_bits() {
        for index in 0..CHAR_TABLE_SIZE as u8 {
            assert_eq!(encode(index) & !SEGMENT_MASK, 0, "index {index}");
        }
    }

    #[test]
    fn blank_is_all_segments_off() {
        assert_eq!(encode(BLANK), 0x00);
        assert_eq!(u8::from(Glyph::Space), BLANK);
    }

    #[test]
    fn out_of_range_renders_blank() {
        for index in CHAR_TABLE_SIZE as u8..=u8::MAX {
            assert_eq!(encode(index), encode(BLANK));
        }
    }

    #[test]
    fn single_segments_walk_the_bits() {
        let first = u8::from(Glyph::SegA);
        for bit in 0..7 {
            assert_eq!(encode(first + bit), 1 << bit);
        }
    }

    #[test]
    fn raw_encode_drops_decimal_point() {
        assert_eq!(raw_encode(0xff), 0x7f);
        assert_eq!(raw_encode(0x80), 0x00);
        assert_eq!(raw_encode(0x49), 0x49);
    }

    #[test]
    fn ascii_lookup() {
        assert_eq!(glyph_for_ascii(b'7'), 7);
        assert_eq!(glyph_for_ascii(b'A'), Glyph::UpperA as u8);
        assert_eq!(glyph_for_ascii(b'h'), Glyph::LowerH as u8);
        assert_eq!(glyph_for_ascii(b'H'), Glyph::UpperH as u8);
        assert_eq!(glyph_for_ascii(b'-'), Glyph::MiddleDash as u8);
        assert_eq!(glyph_for_ascii(b' '), BLANK);
        assert_eq!(glyph_for_ascii(b'W'), BLANK);
        assert_eq!(glyph_for_ascii(0xe9), BLANK);
    }
}
