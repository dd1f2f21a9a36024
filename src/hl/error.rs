use core::fmt;
use core::fmt::{Display, Formatter};

use embedded_hal::spi::{self, ErrorKind};

#[cfg(feature = "defmt")]
use defmt::Format;

/// An error that can occur when driving the controller
///
/// `E` is the error of the [`Bus`] the controller is reached through.
///
/// [`Bus`]: crate::ll::Bus
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Error<E> {
    /// Error occured while accessing the register block
    Bus(E),

    /// A received word was dropped because the RX FIFO was full
    Overrun,

    /// The slave select input was pulled low while we were the master
    ///
    /// The controller has dropped SPI enable. The driver has acknowledged the
    /// fault and needs to be re-enabled before the next transfer.
    ModeFault,

    /// A word was dropped because the TX FIFO was full
    TxOverflow,

    /// The controller didn't make progress within the poll limit
    Timeout,

    /// The configuration was not valid. Some combinations of settings are not
    /// allowed.
    InvalidConfiguration,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Bus(error)
    }
}

impl<E> Display for Error<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for Error<E> where E: fmt::Debug {}

// Not derived, the bus error only has to be `Debug` when printing.
impl<E> fmt::Debug for Error<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bus(error) => write!(f, "Bus({:?})", error),
            Error::Overrun => write!(f, "Overrun"),
            Error::ModeFault => write!(f, "ModeFault"),
            Error::TxOverflow => write!(f, "TxOverflow"),
            Error::Timeout => write!(f, "Timeout"),
            Error::InvalidConfiguration => write!(f, "InvalidConfiguration"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> Format for Error<E>
where
    E: fmt::Debug,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Bus(error) => defmt::write!(f, "Bus({:?})", defmt::Debug2Format(error)),
            Error::Overrun => defmt::write!(f, "Overrun"),
            Error::ModeFault => defmt::write!(f, "ModeFault"),
            Error::TxOverflow => defmt::write!(f, "TxOverflow"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::InvalidConfiguration => defmt::write!(f, "InvalidConfiguration"),
        }
    }
}

impl<E> spi::Error for Error<E>
where
    E: fmt::Debug,
{
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Overrun => ErrorKind::Overrun,
            Error::ModeFault => ErrorKind::ModeFault,
            Error::Bus(_) | Error::TxOverflow | Error::Timeout | Error::InvalidConfiguration => {
                ErrorKind::Other
            }
        }
    }
}
