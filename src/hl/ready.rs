use embedded_hal::spi::Mode;

use crate::{
    configs::{BitOrder, ControlConfig},
    interrupt::{mask_of, Interrupt},
    ll::{self, Bus},
    status::StatusFlags,
    AxiSpi, Config, Error, Ready, Uninitialized,
};

impl<BUS> AxiSpi<BUS, Ready>
where
    BUS: Bus,
{
    /// The configuration the driver was initialized with
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Read and decode the status register
    ///
    /// Note that reading the status register acknowledges a latched mode
    /// fault.
    pub fn status(&mut self) -> Result<StatusFlags, Error<BUS::Error>> {
        let sr = self.ll.sr().read()?;

        Ok(StatusFlags::decode(&sr))
    }

    /// Queue a word for transmission
    ///
    /// This method returns an `nb::Result` that is `WouldBlock` for as long as
    /// the TX FIFO is full. You can use `nb`'s `block!` macro to wait for a
    /// free slot.
    pub fn send(&mut self, word: u8) -> nb::Result<(), Error<BUS::Error>> {
        let sr = self
            .ll
            .sr()
            .read()
            .map_err(|error| nb::Error::Other(Error::Bus(error)))?;

        if sr.tx_full() == 0b1 {
            return Err(nb::Error::WouldBlock);
        }

        self.ll
            .dtr()
            .write(|w| w.data(word))
            .map_err(|error| nb::Error::Other(Error::Bus(error)))?;

        Ok(())
    }

    /// Take a received word
    ///
    /// Returns `WouldBlock` while the RX FIFO is empty. Errors the controller
    /// latched in ISR are reported first, and cleared while doing so.
    pub fn receive(&mut self) -> nb::Result<u8, Error<BUS::Error>> {
        let isr = self
            .ll
            .isr()
            .read()
            .map_err(|error| nb::Error::Other(Error::Bus(error)))?;

        if isr.modf() == 0b1 {
            self.ll
                .isr()
                .write(|w| w.modf(1))
                .map_err(|error| nb::Error::Other(Error::Bus(error)))?;
            // Acknowledge the fault, CR can be rewritten after this
            self.status().map_err(nb::Error::Other)?;

            log::warn!("mode fault, controller disabled");
            return Err(nb::Error::Other(Error::ModeFault));
        }
        if isr.drr_overrun() == 0b1 {
            self.ll
                .isr()
                .write(|w| w.drr_overrun(1))
                .map_err(|error| nb::Error::Other(Error::Bus(error)))?;
            return Err(nb::Error::Other(Error::Overrun));
        }
        if isr.tx_overflow() == 0b1 {
            self.ll
                .isr()
                .write(|w| w.tx_overflow(1))
                .map_err(|error| nb::Error::Other(Error::Bus(error)))?;
            return Err(nb::Error::Other(Error::TxOverflow));
        }

        let sr = self
            .ll
            .sr()
            .read()
            .map_err(|error| nb::Error::Other(Error::Bus(error)))?;

        if sr.rx_empty() == 0b1 {
            return Err(nb::Error::WouldBlock);
        }

        let drr = self
            .ll
            .drr()
            .read()
            .map_err(|error| nb::Error::Other(Error::Bus(error)))?;

        Ok(drr.data())
    }

    /// Enable the given interrupt sources and the interrupt line
    ///
    /// Sources not listed are disabled.
    pub fn enable_interrupts(&mut self, sources: &[Interrupt]) -> Result<(), Error<BUS::Error>> {
        self.ll.ier().write(|w| {
            *w = ll::ier::W(mask_of(sources));
            w
        })?;
        self.ll.gier().write(|w| w.gie(1))?;

        Ok(())
    }

    /// Disable the interrupt line
    pub fn disable_interrupts(&mut self) -> Result<(), Error<BUS::Error>> {
        self.ll.gier().write(|w| w.gie(0))?;

        Ok(())
    }

    /// Interrupt sources that are pending, whether enabled or not
    pub fn pending_interrupts(&mut self) -> Result<u32, Error<BUS::Error>> {
        Ok(self.ll.isr().read()?.bits())
    }

    /// Clear pending interrupt sources
    pub fn clear_interrupts(&mut self, sources: &[Interrupt]) -> Result<(), Error<BUS::Error>> {
        self.ll.isr().write(|w| {
            *w = ll::isr::W(mask_of(sources));
            w
        })?;

        Ok(())
    }

    /// Change the clock polarity and phase
    ///
    /// Takes effect with the next frame.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<BUS::Error>> {
        self.state.config.mode = mode;
        self.apply()
    }

    /// Change the bit order on the wire
    ///
    /// Takes effect with the next frame.
    pub fn set_bit_order(&mut self, bit_order: BitOrder) -> Result<(), Error<BUS::Error>> {
        self.state.config.bit_order = bit_order;
        self.apply()
    }

    /// Enable the controller again
    ///
    /// Needed after a [`Error::ModeFault`], which makes the controller drop
    /// SPI enable.
    pub fn enable(&mut self) -> Result<(), Error<BUS::Error>> {
        self.apply()
    }

    /// Disable the controller
    ///
    /// The frame being shifted finishes, queued words stay in the FIFO.
    pub fn disable(mut self) -> Result<AxiSpi<BUS, Uninitialized>, Error<BUS::Error>> {
        self.ll.cr().modify(|_, w| w.spe(0))?;

        Ok(AxiSpi {
            ll: self.ll,
            state: Uninitialized,
        })
    }

    /// Give back the bus
    pub fn release(self) -> BUS {
        self.ll.release()
    }

    /// Returns the register-level interface
    pub fn ll(&mut self) -> &mut ll::AxiSpi<BUS> {
        &mut self.ll
    }

    fn apply(&mut self) -> Result<(), Error<BUS::Error>> {
        let config = self.state.config;

        self.ll
            .cr()
            .modify(|_, w| ControlConfig::master(config.mode, config.bit_order).encode(w))?;

        Ok(())
    }
}
