//! The TM1638 three wire serial bus.
//!
//! A transaction starts when strobe goes low and ends when it goes high again. Bytes travel
//! least significant bit first; the chip samples the data line on the rising clock edge and
//! drives it after the falling edge when it answers a key scan.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

use crate::Error;

/// Delay between clock edges, in microseconds. The datasheet asks for at least 400ns of clock
/// pulse width and 1us before reading key data.
pub const BIT_DELAY_US: u32 = 1;

/// Primitives of the serial protocol the driver is built on.
pub trait Bus {
    type Error;

    /// Puts strobe and clock in their idle state and the data line in output mode.
    fn configure(&mut self) -> Result<(), Self::Error>;

    /// Opens a transaction.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Closes a transaction.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Shifts one byte out, LSB first.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Shifts one byte in, LSB first. The data line must have been released first.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Turns the data line into an input so the chip can drive it.
    fn release_data(&mut self) -> Result<(), Self::Error>;

    /// Takes the data line back as an output.
    fn drive_data(&mut self) -> Result<(), Self::Error>;

    /// A single byte transaction.
    fn write_command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.start()?;
        self.write_byte(command)?;
        self.stop()
    }
}

/// A pin that can switch between driving and sensing the data line.
pub trait DataPin: InputPin + OutputPin {
    fn set_as_input(&mut self) -> Result<(), Self::Error>;
    fn set_as_output(&mut self) -> Result<(), Self::Error>;
}

/// Data pin wired open drain with a pull-up.
///
/// Releasing the line high is enough to let the chip pull it down, so "input mode" is just a
/// high level and "output mode" needs nothing.
pub struct OpenDrain<P>(pub P);

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

impl<P: InputPin + OutputPin> DataPin for OpenDrain<P> {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// [`Bus`] implementation toggling three GPIO pins.
pub struct BitBang<STB, CLK, DIO, D> {
    strobe: STB,
    clock: CLK,
    data: DIO,
    delay: D,
}

impl<STB, CLK, DIO, D> BitBang<STB, CLK, DIO, D>
where
    STB: OutputPin,
    CLK: OutputPin,
    DIO: DataPin,
    D: DelayNs,
{
    pub fn new(strobe: STB, clock: CLK, data: DIO, delay: D) -> Self {
        Self {
            strobe,
            clock,
            data,
            delay,
        }
    }

    /// Gives the pins and the delay back.
    pub fn release(self) -> (STB, CLK, DIO, D) {
        (self.strobe, self.clock, self.data, self.delay)
    }

    fn pause(&mut self) {
        self.delay.delay_us(BIT_DELAY_US);
    }
}

impl<STB, CLK, DIO, D> Bus for BitBang<STB, CLK, DIO, D>
where
    STB: OutputPin,
    CLK: OutputPin,
    DIO: DataPin,
    D: DelayNs,
{
    type Error = Error;

    fn configure(&mut self) -> Result<(), Error> {
        self.strobe.set_high().map_err(Error::strobe)?;
        self.clock.set_high().map_err(Error::clock)?;
        self.data.set_as_output().map_err(Error::data)
    }

    fn start(&mut self) -> Result<(), Error> {
        self.strobe.set_low().map_err(Error::strobe)?;
        self.pause();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.strobe.set_high().map_err(Error::strobe)?;
        self.pause();
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        for bit in 0..8 {
            self.clock.set_low().map_err(Error::clock)?;
            let level = PinState::from(byte & (1 << bit) != 0);
            self.data.set_state(level).map_err(Error::data)?;
            self.pause();
            self.clock.set_high().map_err(Error::clock)?;
            self.pause();
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut byte = 0;
        for bit in 0..8 {
            self.clock.set_low().map_err(Error::clock)?;
            self.pause();
            if self.data.is_high().map_err(Error::data)? {
                byte |= 1 << bit;
            }
            self.clock.set_high().map_err(Error::clock)?;
            self.pause();
        }
        Ok(byte)
    }

    fn release_data(&mut self) -> Result<(), Error> {
        self.data.set_as_input().map_err(Error::data)?;
        self.pause();
        Ok(())
    }

    fn drive_data(&mut self) -> Result<(), Error> {
        self.data.set_as_output().map_err(Error::data)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    use super::*;

    fn level(byte: u8, bit: u8) -> State {
        if byte & (1 << bit) != 0 {
            State::High
        } else {
            State::Low
        }
    }

    /// Clock edges for `bytes` whole bytes.
    fn clock_cycles(bytes: usize) -> Vec<PinTransaction> {
        (0..bytes * 8)
            .flat_map(|_| {
                [
                    PinTransaction::set(State::Low),
                    PinTransaction::set(State::High),
                ]
            })
            .collect()
    }

    fn data_bits(bytes: &[u8]) -> Vec<PinTransaction> {
        bytes
            .iter()
            .flat_map(|&byte| (0..8).map(move |bit| PinTransaction::set(level(byte, bit))))
            .collect()
    }

    #[test]
    fn configure_idles_high() {
        let mut stb = PinMock::new(&[PinTransaction::set(State::High)]);
        let mut clk = PinMock::new(&[PinTransaction::set(State::High)]);
        let mut dio = PinMock::new(&[]);

        let mut bus = BitBang::new(
            stb.clone(),
            clk.clone(),
            OpenDrain(dio.clone()),
            NoopDelay::new(),
        );
        bus.configure().unwrap();

        stb.done();
        clk.done();
        dio.done();
    }

    #[test]
    fn command_is_framed_by_strobe() {
        let mut stb = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut clk = PinMock::new(&clock_cycles(1));
        let mut dio = PinMock::new(&data_bits(&[0x44]));

        let mut bus = BitBang::new(
            stb.clone(),
            clk.clone(),
            OpenDrain(dio.clone()),
            NoopDelay::new(),
        );
        bus.write_command(0x44).unwrap();

        stb.done();
        clk.done();
        dio.done();
    }

    #[test]
    fn bytes_go_out_lsb_first() {
        let mut stb = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut clk = PinMock::new(&clock_cycles(2));
        let expected = [
            State::Low,
            State::High,
            State::High,
            State::Low,
            State::Low,
            State::Low,
            State::Low,
            State::Low,
        ];
        let mut dio_expectations: Vec<PinTransaction> =
            expected.iter().map(|&s| PinTransaction::set(s)).collect();
        dio_expectations.extend(data_bits(&[0x80]));
        let mut dio = PinMock::new(&dio_expectations);

        let mut bus = BitBang::new(
            stb.clone(),
            clk.clone(),
            OpenDrain(dio.clone()),
            NoopDelay::new(),
        );
        bus.start().unwrap();
        bus.write_byte(0x06).unwrap();
        bus.write_byte(0x80).unwrap();
        bus.stop().unwrap();

        stb.done();
        clk.done();
        dio.done();
    }

    #[test]
    fn key_scan_reads_lsb_first() {
        let mut stb = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut clk = PinMock::new(&clock_cycles(2));

        let mut dio_expectations = data_bits(&[0x42]);
        // released high for the chip to drive
        dio_expectations.push(PinTransaction::set(State::High));
        let answer = 0b0010_0101u8;
        dio_expectations.extend((0..8).map(|bit| PinTransaction::get(level(answer, bit))));
        let mut dio = PinMock::new(&dio_expectations);

        let mut bus = BitBang::new(
            stb.clone(),
            clk.clone(),
            OpenDrain(dio.clone()),
            NoopDelay::new(),
        );
        bus.start().unwrap();
        bus.write_byte(0x42).unwrap();
        bus.release_data().unwrap();
        assert_eq!(bus.read_byte().unwrap(), answer);
        bus.drive_data().unwrap();
        bus.stop().unwrap();

        stb.done();
        clk.done();
        dio.done();
    }
}
