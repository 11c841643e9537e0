//! Shadow copy of the display memory and logical to physical digit mapping.

use crate::segment::SEGMENT_MASK;
use crate::MAX_DIGITS;

/// The decimal points are controlled via bit 7 of each digit byte.
pub const DP_BIT: u8 = 0x80;

/// Last written value of every digit and LED.
///
/// Digit bytes hold segments a..g in bits 0-6 and the decimal point in bit 7. The LED mask holds
/// one bit per LED position. Nothing here talks to the chip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RegisterFile {
    digits: [u8; MAX_DIGITS],
    leds: u8,
}

impl RegisterFile {
    pub const fn new() -> Self {
        Self {
            digits: [0; MAX_DIGITS],
            leds: 0,
        }
    }

    pub fn set_digit(&mut self, digit: u8, value: u8) {
        self.digits[usize::from(digit)] = value;
    }

    pub fn digit(&self, digit: u8) -> u8 {
        self.digits[usize::from(digit)]
    }

    /// Replaces the segment bits of a digit, keeping its decimal point.
    pub fn set_segments(&mut self, digit: u8, pattern: u8) {
        let value = (self.digit(digit) & DP_BIT) | (pattern & SEGMENT_MASK);
        self.set_digit(digit, value);
    }

    /// Sets or clears bit 7 of a digit without touching its segments.
    pub fn set_decimal_point(&mut self, digit: u8, on: bool) {
        let value = if on {
            self.digit(digit) | DP_BIT
        } else {
            self.digit(digit) & !DP_BIT
        };
        self.set_digit(digit, value);
    }

    pub fn decimal_point(&self, digit: u8) -> bool {
        self.digit(digit) & DP_BIT != 0
    }

    pub fn set_led(&mut self, led: u8, on: bool) {
        if on {
            self.leds |= 1 << led;
        } else {
            self.leds &= !(1 << led);
        }
    }

    /// Status bit of one LED, as written to the chip (`0x00` or `0x01`).
    pub fn led(&self, led: u8) -> u8 {
        (self.leds >> led) & 0x01
    }

    pub fn led_mask(&self) -> u8 {
        self.leds
    }

    /// Raw digit bytes, logical order.
    pub fn digits(&self) -> &[u8; MAX_DIGITS] {
        &self.digits
    }
}

/// Physical slot of each logical digit.
///
/// Boards are not always wired so that GRID1 is the leftmost digit; the map lets the logical
/// digit numbering follow the front panel. It is always a permutation of `0..MAX_DIGITS`, so
/// every physical slot belongs to exactly one logical digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DigitMap([u8; MAX_DIGITS]);

impl DigitMap {
    /// Logical digits addressed in the same order as they are physically built.
    pub const IDENTITY: Self = Self([0, 1, 2, 3, 4, 5, 6, 7]);

    /// Builds a map from a full set of physical slots.
    ///
    /// Returns `None` unless every slot is below [`MAX_DIGITS`] and appears once.
    pub fn new(slots: [u8; MAX_DIGITS]) -> Option<Self> {
        Self::from_slice(&slots)
    }

    /// Builds a map for the first `slots.len()` logical digits.
    ///
    /// Logical digits past the end of `slots` take the unused physical slots in ascending order.
    /// Returns `None` for more than [`MAX_DIGITS`] entries, a slot out of range, or a repeated
    /// slot.
    pub fn from_slice(slots: &[u8]) -> Option<Self> {
        if slots.len() > MAX_DIGITS {
            return None;
        }

        let mut map = [0u8; MAX_DIGITS];
        let mut used = 0u8;
        for (logical, &slot) in slots.iter().enumerate() {
            if usize::from(slot) >= MAX_DIGITS || used & (1 << slot) != 0 {
                return None;
            }
            used |= 1 << slot;
            map[logical] = slot;
        }

        let mut free = (0..MAX_DIGITS as u8).filter(|&slot| used & (1 << slot) == 0);
        for entry in map.iter_mut().skip(slots.len()) {
            *entry = free.next()?;
        }

        Some(Self(map))
    }

    /// Physical slot of a logical digit.
    ///
    /// # Panics
    ///
    /// If `digit` is not below [`MAX_DIGITS`]; the driver bounds it before calling.
    pub fn physical(&self, digit: u8) -> u8 {
        self.0[usize::from(digit)]
    }

    /// Logical digit wired to a physical slot.
    pub fn logical(&self, slot: u8) -> u8 {
        self.0
            .iter()
            .position(|&physical| physical == slot)
            .map_or(slot, |logical| logical as u8)
    }

    /// Display memory address of a digit's segment byte.
    pub fn segment_address(&self, digit: u8) -> u8 {
        self.physical(digit) << 1
    }

    /// Display memory address of a digit's LED byte.
    pub fn led_address(&self, digit: u8) -> u8 {
        self.segment_address(digit) + 1
    }

    pub fn slots(&self) -> &[u8; MAX_DIGITS] {
        &self.0
    }
}

impl Default for DigitMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}
