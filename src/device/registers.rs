use crate::{
    configs::ControlConfig,
    interrupt::Interrupt,
    ll::{
        self, cr, dtr, gier, Access, Register, CR, CR_MASK, DRR, DTR, GIER, IER, ISR, RFOR,
        SOFT_RESET_KEY, SR, SRR, SSR, TFOR,
    },
    status::InterruptState,
};

use super::{Engine, Error, Peer};

/// The register bank seen by the bus master
///
/// Holds the registers that are plain storage. Everything backed by the FIFOs
/// or the shift engine is computed from the [`Engine`] when accessed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterFile {
    gier: u32,
    isr: u32,
    ier: u32,
    cr: u32,
    ssr: u32,
    // Last word handed out through DRR
    drr: u8,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Registers holding their reset values
    pub fn new() -> Self {
        RegisterFile {
            gier: GIER::RESET,
            isr: ISR::RESET,
            ier: IER::RESET,
            cr: CR::RESET,
            ssr: SSR::RESET,
            drr: DRR::RESET as u8,
        }
    }

    /// Read a register on behalf of the bus master
    ///
    /// Reading DRR takes a word out of the RX FIFO, reading SR acknowledges a
    /// latched mode fault.
    pub fn read<P, const DEPTH: usize>(
        &mut self,
        offset: u8,
        engine: &mut Engine<P, DEPTH>,
    ) -> Result<u32, Error<P::Error>>
    where
        P: Peer,
    {
        let value = self.peek(offset, engine)?;

        match offset {
            SR::OFFSET => engine.acknowledge_fault(),
            DRR::OFFSET => {
                if let Some(word) = engine.pop_rx() {
                    self.drr = word;
                }
            }
            _ => {}
        }

        Ok(value)
    }

    /// Read a register without side effects
    pub fn peek<P, const DEPTH: usize>(
        &self,
        offset: u8,
        engine: &Engine<P, DEPTH>,
    ) -> Result<u32, Error<P::Error>>
    where
        P: Peer,
    {
        let info = ll::lookup(offset).ok_or(Error::InvalidAddress(offset))?;
        if info.access == Access::WriteOnly {
            return Ok(0);
        }

        let value = match offset {
            GIER::OFFSET => self.gier,
            ISR::OFFSET => self.isr,
            IER::OFFSET => self.ier,
            CR::OFFSET => self.cr,
            SR::OFFSET => engine.status().bits(),
            DRR::OFFSET => engine.peek_rx().unwrap_or(self.drr) as u32,
            SSR::OFFSET => self.ssr,
            TFOR::OFFSET => engine.tx_len() as u32,
            RFOR::OFFSET => engine.rx_len() as u32,
            _ => info.reset,
        };

        Ok(value)
    }

    /// Write a register on behalf of the bus master
    pub fn write<P, const DEPTH: usize>(
        &mut self,
        offset: u8,
        value: u32,
        engine: &mut Engine<P, DEPTH>,
    ) -> Result<(), Error<P::Error>>
    where
        P: Peer,
    {
        let info = ll::lookup(offset).ok_or(Error::InvalidAddress(offset))?;
        if info.access == Access::ReadOnly {
            log::debug!("write of {:#010x} to read-only {} dropped", value, info.name);
            return Err(Error::WriteProtected(offset));
        }

        match offset {
            GIER::OFFSET => {
                self.gier = gier::W(0).gie(gier::R(value).gie()).bits();
            }
            ISR::OFFSET => self.isr &= !value,
            IER::OFFSET => self.ier = value,
            SRR::OFFSET => {
                if value == SOFT_RESET_KEY {
                    self.soft_reset(engine);
                } else {
                    log::debug!("soft reset with bad key {:#010x} ignored", value);
                }
            }
            CR::OFFSET => self.write_control(value, engine),
            DTR::OFFSET => engine.push_tx(dtr::R(value).data()),
            SSR::OFFSET => self.ssr = value,
            _ => {}
        }

        Ok(())
    }

    /// Restore every register and the engine to their reset state
    pub fn soft_reset<P, const DEPTH: usize>(&mut self, engine: &mut Engine<P, DEPTH>)
    where
        P: Peer,
    {
        log::debug!("soft reset");

        *self = Self::new();
        engine.soft_reset();
    }

    /// Latch interrupt sources raised by the engine
    pub fn raise(&mut self, events: u32) {
        self.isr |= events;

        // The engine dropped SPE on a mode fault, CR has to show it
        if Interrupt::ModeFault.is_set(events) {
            self.cr = cr::W(self.cr).spe(0).bits();
        }
    }

    /// State of the interrupt controller
    pub fn interrupts(&self) -> InterruptState {
        InterruptState::from_registers(self.gier, self.ier, self.isr)
    }

    fn write_control<P, const DEPTH: usize>(&mut self, value: u32, engine: &mut Engine<P, DEPTH>)
    where
        P: Peer,
    {
        let r = cr::R(value & CR_MASK);
        let config = ControlConfig::decode(&r);

        if config.tx_fifo_reset {
            engine.reset_tx_fifo();
        }
        if config.rx_fifo_reset {
            engine.reset_rx_fifo();
        }

        let config = ControlConfig {
            tx_fifo_reset: false,
            rx_fifo_reset: false,
            ..config
        };
        if config != *engine.config() {
            log::debug!("control: {:?}", config);
        }
        let applied = engine.configure(config);

        self.cr = cr::W(r.bits())
            .txfifo_reset(0)
            .rxfifo_reset(0)
            .spe(applied.spi_enable as u8)
            .bits();
    }
}
