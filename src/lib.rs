//! A platform agnostic driver to interface with the TM1638 (LED display and key scan driver)
//!
//! The TM1638 drives up to 8 digits of 7 segments plus decimal point, one discrete LED per digit,
//! and scans a key matrix. This driver was built using [`embedded-hal`] traits and talks to the
//! chip over its three wire bus (strobe, clock, data), see [`Bus`] and [`BitBang`].
//!
//! Every value written to the chip is also kept in a [`RegisterFile`], so decimal points survive
//! character writes and [`Tm1638::test`] can restore the display afterwards.
//!
//! Out of range digits, LEDs or values are clipped or ignored, never reported. The chip does not
//! acknowledge anything it receives, so the only errors are the GPIO errors of the bus.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/~1.0

#![deny(unsafe_code)]
#![deny(warnings)]
#![no_std]

mod bus;
mod error;
pub mod registers;
pub mod segment;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

pub use bus::{BitBang, Bus, DataPin, OpenDrain, BIT_DELAY_US};
pub use error::Error;
pub use registers::{DigitMap, RegisterFile, DP_BIT};
pub use segment::{Glyph, BLANK, CHAR_TABLE_SIZE};

/// Digits supported by the chip.
pub const MAX_DIGITS: usize = 8;

/// LEDs supported by the chip, one next to each digit.
pub const MAX_LEDS: usize = 8;

/// Buttons reported by [`Tm1638::read_buttons`].
pub const MAX_BUTTONS: usize = 8;

pub const INTENSITY_MIN: u8 = 0x00;
pub const INTENSITY_TYP: u8 = 0x02;
pub const INTENSITY_MAX: u8 = 0x07;

/// Command bytes understood by the chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Command {
    /// Write data, address incremented after each byte.
    AddrAuto = 0x40,
    /// Read key scan data.
    ReadKeys = 0x42,
    /// Write data to a fixed address.
    AddrFixed = 0x44,
    DisplayOff = 0x80,
    /// Display on, OR-ed with the brightness.
    DisplayOn = 0x88,
    /// Address of the first byte of display memory.
    StartAddr = 0xC0,
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command as u8
    }
}

/// Board layout and initial brightness, applied by [`Tm1638::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    pub buttons: u8,
    pub leds: u8,
    pub digits: u8,
    pub brightness: u8,
    pub digit_map: DigitMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buttons: MAX_BUTTONS as u8,
            leds: MAX_LEDS as u8,
            digits: MAX_DIGITS as u8,
            brightness: INTENSITY_TYP,
            digit_map: DigitMap::IDENTITY,
        }
    }
}

impl Config {
    pub fn with_buttons(mut self, buttons: u8) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_leds(mut self, leds: u8) -> Self {
        self.leds = leds;
        self
    }

    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn with_digit_map(mut self, digit_map: DigitMap) -> Self {
        self.digit_map = digit_map;
        self
    }

    /// Brings every count into what the chip supports.
    ///
    /// There is always at least one digit and never more than [`MAX_DIGITS`]. LED and button
    /// counts above 8 disable the feature. Brightness keeps its low 3 bits.
    pub fn clamped(self) -> Self {
        let limit = |count: u8, max: usize| if usize::from(count) <= max { count } else { 0 };

        Self {
            buttons: limit(self.buttons, MAX_BUTTONS),
            leds: limit(self.leds, MAX_LEDS),
            digits: self.digits.clamp(1, MAX_DIGITS as u8),
            brightness: self.brightness & INTENSITY_MAX,
            digit_map: self.digit_map,
        }
    }
}

/// TM1638 driver.
///
/// Keeps a shadow copy of everything it writes and only talks to the chip through `BUS`.
pub struct Tm1638<BUS> {
    bus: BUS,
    config: Config,
    registers: RegisterFile,
    display_control: u8,
}

impl<STB, CLK, DIO, D> Tm1638<BitBang<STB, CLK, DIO, D>>
where
    STB: OutputPin,
    CLK: OutputPin,
    DIO: DataPin,
    D: DelayNs,
{
    /// Driver bit banging the strobe, clock and data pins.
    pub fn from_pins(strobe: STB, clock: CLK, data: DIO, delay: D) -> Self {
        Self::new(BitBang::new(strobe, clock, data, delay))
    }
}

impl<BUS> Tm1638<BUS>
where
    BUS: Bus,
{
    /// Wraps a bus. Nothing is sent until [`Self::begin`].
    pub fn new(bus: BUS) -> Self {
        Self {
            bus,
            config: Config::default(),
            registers: RegisterFile::new(),
            display_control: Command::DisplayOff.into(),
        }
    }

    /// Sets up the bus, clears every LED, digit and decimal point, then turns the display on.
    ///
    /// Can be called again to reconfigure.
    ///
    /// # Arguments
    ///
    /// * `config` - board layout, clipped with [`Config::clamped`]
    pub fn begin(&mut self, config: Config) -> Result<(), BUS::Error> {
        self.config = config.clamped();

        #[cfg(feature = "defmt-03")]
        defmt::debug!("tm1638: begin {}", self.config);

        self.registers = RegisterFile::new();
        self.bus.configure()?;
        self.clear()?;
        self.set_brightness(self.config.brightness)
    }

    /// Turns the display off. Display memory is kept.
    pub fn display_off(&mut self) -> Result<(), BUS::Error> {
        self.display_control = Command::DisplayOff.into();
        self.command(Command::DisplayOff)
    }

    /// Turns off every configured digit, its decimal point and its LED.
    pub fn clear(&mut self) -> Result<(), BUS::Error> {
        for digit in 0..self.config.digits {
            self.set_led(digit, false)?;
            self.show_char(digit, 0x00, true)?;
            self.set_decimal_point(digit, false)?;
        }
        Ok(())
    }

    /// Sets the brightness and turns the display on.
    ///
    /// # Arguments
    ///
    /// * `brightness` - `INTENSITY_MIN` to `INTENSITY_MAX`, higher bits are ignored
    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), BUS::Error> {
        self.config.brightness = brightness & INTENSITY_MAX;
        self.display_control = u8::from(Command::DisplayOn) | self.config.brightness;

        #[cfg(feature = "defmt-03")]
        defmt::trace!("tm1638: command {=u8:#x}", self.display_control);

        self.bus.write_command(self.display_control)
    }

    /// Lights every segment, decimal point and LED, or puts back what was shown before.
    ///
    /// Both directions are a single auto increment transaction. The shadow registers are never
    /// touched, so `test(false)` restores exactly what `test(true)` covered.
    pub fn test(&mut self, enable: bool) -> Result<(), BUS::Error> {
        let slots = self.test_span();

        self.command(Command::AddrAuto)?;
        self.bus.start()?;
        self.bus.write_byte(Command::StartAddr.into())?;
        for slot in 0..slots {
            let (segments, led) = if enable {
                (0xff, 0x01)
            } else {
                let digit = self.config.digit_map.logical(slot);
                (self.registers.digit(digit), self.registers.led(digit))
            };
            self.bus.write_byte(segments)?;
            self.bus.write_byte(led)?;
        }
        self.bus.stop()
    }

    /// Shows `value` as eight `0`/`1` digits. Needs 8 digits.
    ///
    /// # Arguments
    ///
    /// * `value` - the byte to show
    /// * `lsb_first` - put bit 0 on digit 0 instead of bit 7
    pub fn show_byte_binary(&mut self, value: u8, lsb_first: bool) -> Result<(), BUS::Error> {
        if usize::from(self.config.digits) < MAX_DIGITS {
            return Ok(());
        }

        for digit in 0..MAX_DIGITS as u8 {
            let shift = if lsb_first { digit } else { 7 - digit };
            let bit = (value >> shift) & 0x01;
            self.registers.set_segments(digit, segment::encode(bit));
            self.command(Command::AddrFixed)?;
            self.write_digit(digit)?;
        }
        Ok(())
    }

    /// Shows a character on one digit, keeping its decimal point.
    ///
    /// # Arguments
    ///
    /// * `digit` - logical digit, leftmost is 0
    /// * `value` - index into the character table (see [`Glyph`]), or a segment pattern when
    ///   `raw` is set. Indices past the table show a blank.
    /// * `raw` - write the low 7 bits of `value` as segments a..g
    pub fn show_char(&mut self, digit: u8, value: u8, raw: bool) -> Result<(), BUS::Error> {
        if digit >= self.config.digits {
            return Ok(());
        }

        let pattern = if raw {
            segment::raw_encode(value)
        } else {
            segment::encode(value)
        };
        self.registers.set_segments(digit, pattern);
        self.command(Command::AddrFixed)?;
        self.write_digit(digit)
    }

    /// Shows 0-99, or 0x00-0xff in hex, on two digits starting at `digit`.
    ///
    /// Decimal values above 99 show as 99.
    pub fn show_int8(&mut self, digit: u8, value: u8, decimal: bool) -> Result<(), BUS::Error> {
        self.show_number(digit, value.into(), 2, decimal)
    }

    /// Shows 0-999, or 0x000-0xfff in hex, on three digits starting at `digit`.
    ///
    /// Larger values are clipped to the largest that fits.
    pub fn show_int12(&mut self, digit: u8, value: u16, decimal: bool) -> Result<(), BUS::Error> {
        self.show_number(digit, value, 3, decimal)
    }

    /// Shows 0-9999, or 0x0000-0xffff in hex, on four digits starting at `digit`.
    ///
    /// Decimal values above 9999 show as 9999.
    pub fn show_int16(&mut self, digit: u8, value: u16, decimal: bool) -> Result<(), BUS::Error> {
        self.show_number(digit, value, 4, decimal)
    }

    /// Writes ASCII text from `digit` onwards.
    ///
    /// A '.' lights the decimal point of the character before it instead of taking a digit.
    /// Characters without a glyph show as blanks, text past the last digit is dropped.
    pub fn show_text(&mut self, digit: u8, text: &[u8]) -> Result<(), BUS::Error> {
        if digit >= self.config.digits || text.is_empty() {
            return Ok(());
        }

        let mut next = digit;
        let mut chars = text.iter().peekable();

        self.command(Command::AddrFixed)?;
        while let Some(&c) = chars.next() {
            if next >= self.config.digits {
                break;
            }

            let dot = c == b'.' || chars.next_if_eq(&&b'.').is_some();
            let glyph = if c == b'.' {
                BLANK
            } else {
                segment::glyph_for_ascii(c)
            };
            self.registers.set_segments(next, segment::encode(glyph));
            self.registers.set_decimal_point(next, dot);
            self.write_digit(next)?;
            next += 1;
        }
        Ok(())
    }

    /// Shows `value` on the 8 LEDs. Needs 8 LEDs.
    ///
    /// # Arguments
    ///
    /// * `value` - one bit per LED
    /// * `lsb_first` - put bit 0 on LED 0 instead of bit 7
    pub fn show_leds_binary(&mut self, value: u8, lsb_first: bool) -> Result<(), BUS::Error> {
        if usize::from(self.config.leds) < MAX_LEDS {
            return Ok(());
        }

        for led in 0..MAX_LEDS as u8 {
            let shift = if lsb_first { led } else { 7 - led };
            self.set_led(led, (value >> shift) & 0x01 != 0)?;
        }
        Ok(())
    }

    /// Turns one LED on or off.
    pub fn set_led(&mut self, led: u8, on: bool) -> Result<(), BUS::Error> {
        if self.config.leds == 0 || led >= self.config.leds {
            return Ok(());
        }

        self.registers.set_led(led, on);
        self.command(Command::AddrFixed)?;
        self.bus.start()?;
        self.bus
            .write_byte(u8::from(Command::StartAddr) | self.config.digit_map.led_address(led))?;
        self.bus.write_byte(self.registers.led(led))?;
        self.bus.stop()
    }

    /// Turns the decimal point of one digit on or off, keeping its segments.
    pub fn set_decimal_point(&mut self, digit: u8, on: bool) -> Result<(), BUS::Error> {
        if digit >= self.config.digits {
            return Ok(());
        }

        self.registers.set_decimal_point(digit, on);
        self.command(Command::AddrFixed)?;
        self.write_digit(digit)
    }

    /// Reads the 8 buttons, bit 0 is S1. Always 0 when no buttons are configured.
    pub fn read_buttons(&mut self) -> Result<u8, BUS::Error> {
        if self.config.buttons == 0 {
            return Ok(0);
        }

        // The chip answers with four scan bytes; shifting byte k left by k packs them into one.
        let mut buttons = 0;
        self.bus.start()?;
        self.bus.write_byte(Command::ReadKeys.into())?;
        self.bus.release_data()?;
        for k in 0..4 {
            buttons |= self.bus.read_byte()? << k;
        }
        self.bus.drive_data()?;
        self.bus.stop()?;

        #[cfg(feature = "defmt-03")]
        defmt::trace!("tm1638: buttons {=u8:b}", buttons);

        Ok(buttons)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn digit_map(&self) -> &DigitMap {
        &self.config.digit_map
    }

    /// What the driver last wrote to each digit and LED.
    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn brightness(&self) -> u8 {
        self.config.brightness
    }

    /// The last display control command sent: off, or on with the brightness.
    pub fn display_control(&self) -> u8 {
        self.display_control
    }

    /// Gives the bus back.
    pub fn release(self) -> BUS {
        self.bus
    }

    fn command(&mut self, command: Command) -> Result<(), BUS::Error> {
        #[cfg(feature = "defmt-03")]
        defmt::trace!("tm1638: command {}", command);

        self.bus.write_command(command.into())
    }

    /// Writes the shadow value of a logical digit to its physical address.
    fn write_digit(&mut self, digit: u8) -> Result<(), BUS::Error> {
        self.bus.start()?;
        self.bus.write_byte(
            u8::from(Command::StartAddr) | self.config.digit_map.segment_address(digit),
        )?;
        self.bus.write_byte(self.registers.digit(digit))?;
        self.bus.stop()
    }

    fn show_number(
        &mut self,
        digit: u8,
        value: u16,
        width: u8,
        decimal: bool,
    ) -> Result<(), BUS::Error> {
        if self.config.digits < width || digit > self.config.digits - width {
            return Ok(());
        }

        let base: u32 = if decimal { 10 } else { 16 };
        let mut value = u32::from(value).min(base.pow(width.into()) - 1);
        for offset in (0..width).rev() {
            self.registers
                .set_segments(digit + offset, segment::encode((value % base) as u8));
            value /= base;
        }

        self.command(Command::AddrFixed)?;
        for offset in 0..width {
            self.write_digit(digit + offset)?;
        }
        Ok(())
    }

    /// Physical slots covered by [`Self::test`]: up to the highest one used by a configured
    /// digit or LED.
    fn test_span(&self) -> u8 {
        let count = self.config.digits.max(self.config.leds);
        (0..count)
            .map(|digit| self.config.digit_map.physical(digit) + 1)
            .max()
            .unwrap_or(0)
    }
}
