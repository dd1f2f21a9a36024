//! AXI4-Lite front end of the controller
//!
//! Turns read and write transactions into register accesses and answers with
//! the 2-bit AXI response code. Every transaction spends one bus clock,
//! whatever its outcome. A transaction answered with an error had no effect;
//! a device failure during the bus clock fails the next transaction.

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{
    device::{Controller, Error, Peer},
    ll::{Register, ADDR_WIDTH, CR, GIER, IER, SSR},
};

/// Width of the RRESP/BRESP fields, in bits
pub const RESP_WIDTH: u32 = 2;

/// AXI response code
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Response {
    /// Normal access success
    Okay = 0b00,
    /// Exclusive access success, never produced by AXI4-Lite slaves
    ExOkay = 0b01,
    /// Slave error: the register exists but refused the access
    SlvErr = 0b10,
    /// Decode error: no register at this address
    DecErr = 0b11,
}

impl Response {
    /// The raw RRESP/BRESP value
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the access succeeded
    pub fn is_ok(self) -> bool {
        matches!(self, Response::Okay | Response::ExOkay)
    }
}

/// Outcome of a read transaction
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct ReadResponse {
    /// RDATA, zero unless the read succeeded
    pub data: u32,
    /// RRESP
    pub resp: Response,
}

impl<E> Error<E> {
    /// The AXI response code this error is reported with
    pub fn response(&self) -> Response {
        match self {
            Error::InvalidAddress(_) => Response::DecErr,
            Error::WriteProtected(_) | Error::Peer(_) | Error::InvalidConfiguration => {
                Response::SlvErr
            }
        }
    }
}

impl<E> From<Error<E>> for Response {
    fn from(error: Error<E>) -> Self {
        error.response()
    }
}

/// Map an AXI address onto a register offset
fn decode(addr: u32) -> Option<u8> {
    if addr >> ADDR_WIDTH != 0 {
        None
    } else {
        Some(addr as u8)
    }
}

/// Bits of the data bus selected by a write strobe
fn lanes(strobe: u8) -> u32 {
    (0..4)
        .filter(|lane| strobe & (1 << lane) != 0)
        .fold(0, |mask, lane| mask | 0xff << (8 * lane))
}

impl<P, const DEPTH: usize> Controller<P, DEPTH>
where
    P: Peer,
{
    /// Run an AXI4-Lite read transaction
    ///
    /// # Example
    ///
    /// ``` rust
    /// use axi_spi::{axi::Response, device::{Controller, Loopback}};
    ///
    /// let mut spi = Controller::new(Loopback).unwrap();
    ///
    /// assert_eq!(spi.axi_read(0x64).data, 0xa5);
    /// assert_eq!(spi.axi_read(0x00).resp, Response::DecErr);
    /// ```
    pub fn axi_read(&mut self, addr: u32) -> ReadResponse {
        let result = self.clocked(|spi| match decode(addr) {
            Some(offset) => spi.read(offset).map_err(Response::from),
            None => Err(Response::DecErr),
        });

        match result {
            Ok(data) => ReadResponse {
                data,
                resp: Response::Okay,
            },
            Err(resp) => ReadResponse { data: 0, resp },
        }
    }

    /// Run an AXI4-Lite write transaction
    ///
    /// `strobe` selects the byte lanes of `data` that are written. Lanes left
    /// out keep their value in storage registers and read as zero for
    /// registers that act on writes.
    pub fn axi_write(&mut self, addr: u32, data: u32, strobe: u8) -> Response {
        let result = self.clocked(|spi| match decode(addr) {
            Some(offset) => spi.strobed_write(offset, data, strobe),
            None => Err(Response::DecErr),
        });

        match result {
            Ok(()) => Response::Okay,
            Err(resp) => resp,
        }
    }

    fn strobed_write(&mut self, offset: u8, data: u32, strobe: u8) -> Result<(), Response> {
        let mask = lanes(strobe);

        if mask == 0 {
            // Nothing to write, but the address still has to decode
            return self.peek(offset).map(|_| ()).map_err(|error| error.response());
        }

        let base = match offset {
            GIER::OFFSET | IER::OFFSET | CR::OFFSET | SSR::OFFSET if mask != u32::MAX => {
                self.peek(offset).map_err(|error| error.response())?
            }
            _ => 0,
        };

        self.write(offset, (base & !mask) | (data & mask))
            .map_err(|error| error.response())
    }
}
