use core::fmt;

use embedded_hal::digital::{self, ErrorKind};

/// A GPIO failure on one of the three bus lines.
///
/// This is the only failure the bit-banged bus can see. The chip never acknowledges a byte, so a
/// disconnected or miswired module goes unnoticed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    Strobe(ErrorKind),
    Clock(ErrorKind),
    Data(ErrorKind),
}

impl Error {
    pub(crate) fn strobe(err: impl digital::Error) -> Self {
        Self::Strobe(err.kind())
    }

    pub(crate) fn clock(err: impl digital::Error) -> Self {
        Self::Clock(err.kind())
    }

    pub(crate) fn data(err: impl digital::Error) -> Self {
        Self::Data(err.kind())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Strobe(kind) => write!(f, "strobe pin: {kind}"),
            Error::Clock(kind) => write!(f, "clock pin: {kind}"),
            Error::Data(kind) => write!(f, "data pin: {kind}"),
        }
    }
}

impl core::error::Error for Error {}
