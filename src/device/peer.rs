//! Devices on the far end of the SPI wire

use core::convert::Infallible;

use embedded_hal::spi::{ErrorType, SpiBus};

use crate::configs::BitOrder;

/// The device the controller shifts words with
///
/// The controller calls [`Peer::begin`] when a frame starts,
/// [`Peer::exchange`] once per bit at the sampling edge, and [`Peer::end`] once
/// the eighth bit has been sampled. A frame aborted by a mode fault never sees
/// `end`.
pub trait Peer {
    /// Error raised by the device model
    type Error;

    /// A frame starts, bits will follow in `order`
    fn begin(&mut self, _order: BitOrder) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Shift one bit: the controller drives `mosi`, the device answers MISO
    fn exchange(&mut self, mosi: bool) -> Result<bool, Self::Error>;

    /// The frame is complete
    fn end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<P> Peer for &mut P
where
    P: Peer + ?Sized,
{
    type Error = P::Error;

    fn begin(&mut self, order: BitOrder) -> Result<(), Self::Error> {
        (**self).begin(order)
    }

    fn exchange(&mut self, mosi: bool) -> Result<bool, Self::Error> {
        (**self).exchange(mosi)
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        (**self).end()
    }
}

/// MISO wired to MOSI, every word comes back as sent
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Loopback;

impl Peer for Loopback {
    type Error = Infallible;

    fn exchange(&mut self, mosi: bool) -> Result<bool, Self::Error> {
        Ok(mosi)
    }
}

/// Nothing connected, MISO is pulled high and every word reads as `0xff`
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Floating;

impl Peer for Floating {
    type Error = Infallible;

    fn exchange(&mut self, _mosi: bool) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// A byte-level device model on the wire
///
/// Wraps anything implementing [`SpiBus`], typically a mock, and makes it
/// behave like a shift-register slave: the word clocked out during a frame is
/// the answer the device gave to the previous frame. The first frame clocks
/// out `idle`.
///
/// At the end of every frame the received word is handed to the model with
/// `transfer_in_place`, and the word it leaves in the buffer is the next
/// answer.
#[derive(Debug)]
pub struct Target<SPI> {
    spi: SPI,
    order: BitOrder,
    reply: u8,
    received: u8,
    bits: u32,
}

impl<SPI> Target<SPI> {
    /// Attach a device model whose first answer is `idle`
    pub fn new(spi: SPI, idle: u8) -> Self {
        Target {
            spi,
            order: BitOrder::MsbFirst,
            reply: idle,
            received: 0,
            bits: 0,
        }
    }

    /// Allow access to the device model
    pub fn device(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Detach the device model
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Bit `index` of a word, counted in wire order
    fn wire_bit(&self, index: u32) -> u32 {
        match self.order {
            BitOrder::MsbFirst => 7 - index % 8,
            BitOrder::LsbFirst => index % 8,
        }
    }
}

impl<SPI> Peer for Target<SPI>
where
    SPI: SpiBus<u8>,
{
    type Error = <SPI as ErrorType>::Error;

    fn begin(&mut self, order: BitOrder) -> Result<(), Self::Error> {
        self.order = order;
        self.received = 0;
        self.bits = 0;

        Ok(())
    }

    fn exchange(&mut self, mosi: bool) -> Result<bool, Self::Error> {
        let position = self.wire_bit(self.bits);
        let miso = self.reply & (1 << position) != 0;

        if mosi {
            self.received |= 1 << position;
        }
        self.bits += 1;

        Ok(miso)
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        let mut word = [self.received];
        self.spi.transfer_in_place(&mut word)?;
        self.reply = word[0];

        Ok(())
    }
}
