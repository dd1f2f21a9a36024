use crate::{
    configs::{BitOrder, ControlConfig, SPI_DATA_WIDTH},
    interrupt::Interrupt,
    status::StatusFlags,
};

use super::{Fifo, Peer};

#[cfg(feature = "defmt")]
use defmt::Format;

/// SCK edges in one frame
const EDGES_PER_FRAME: u32 = 2 * SPI_DATA_WIDTH;

/// State of the shift engine
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum State {
    /// No frame in flight
    Idle,
    /// A word is being shifted
    Shifting,
    /// All bits shifted, the received word is waiting to be stored
    Done,
}

/// The SPI transaction engine
///
/// Owns both FIFOs, the shift register and the SCK generator. Talks to the
/// register file only through its command methods, [`Engine::status`] and the
/// interrupt events collected by [`Engine::take_events`].
#[derive(Debug)]
pub struct Engine<P, const DEPTH: usize> {
    peer: P,
    config: ControlConfig,
    tx: Fifo<DEPTH>,
    rx: Fifo<DEPTH>,

    state: State,
    // Configuration the frame in flight was started with
    frame: ControlConfig,
    shift: u8,
    sampled: u32,
    edges: u32,
    sck: bool,
    mosi: bool,

    half_period: u32,
    counter: u32,

    mode_fault: bool,
    ss_input: bool,
    events: u32,
}

impl<P, const DEPTH: usize> Engine<P, DEPTH>
where
    P: Peer,
{
    /// A reset engine, advancing SCK every `half_period` bus clocks
    pub fn new(peer: P, half_period: u32) -> Self {
        let config = ControlConfig::reset();

        Engine {
            peer,
            config,
            tx: Fifo::new(),
            rx: Fifo::new(),
            state: State::Idle,
            frame: config,
            shift: 0,
            sampled: 0,
            edges: 0,
            sck: config.cpol,
            mosi: false,
            half_period,
            counter: 0,
            mode_fault: false,
            ss_input: true,
            events: 0,
        }
    }

    /// Apply a newly written control register, returning what was applied
    ///
    /// A frame in flight finishes with the configuration it started with.
    /// While a mode fault is latched SPE can't be set.
    pub fn configure(&mut self, mut config: ControlConfig) -> ControlConfig {
        if self.mode_fault && config.spi_enable {
            log::debug!("SPE ignored until the mode fault is acknowledged");
            config.spi_enable = false;
        }

        self.config = config;
        if self.state == State::Idle {
            self.sck = config.cpol;
        }

        config
    }

    /// Current configuration
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Flush the TX FIFO
    pub fn reset_tx_fifo(&mut self) {
        log::debug!("TX FIFO reset, {} words dropped", self.tx.len());
        self.tx.clear();
    }

    /// Flush the RX FIFO
    pub fn reset_rx_fifo(&mut self) {
        log::debug!("RX FIFO reset, {} words dropped", self.rx.len());
        self.rx.clear();
    }

    /// Return to the reset state
    ///
    /// The frame in flight, both FIFOs, a latched mode fault and undelivered
    /// events are all dropped. The slave select input is external and keeps
    /// its level.
    pub fn soft_reset(&mut self) {
        let config = ControlConfig::reset();

        self.config = config;
        self.frame = config;
        self.tx.clear();
        self.rx.clear();
        self.state = State::Idle;
        self.shift = 0;
        self.sampled = 0;
        self.edges = 0;
        self.sck = config.cpol;
        self.mosi = false;
        self.counter = 0;
        self.mode_fault = false;
        self.events = 0;
    }

    /// Queue a word for transmission
    ///
    /// A full TX FIFO drops the word and raises [`Interrupt::TxOverflow`].
    pub fn push_tx(&mut self, word: u8) {
        if let Err(word) = self.tx.push(word) {
            log::warn!("TX FIFO full, dropping {:#04x}", word);
            self.raise(Interrupt::TxOverflow);
        }
    }

    /// Take the oldest received word
    pub fn pop_rx(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    /// Oldest received word, left in place
    pub fn peek_rx(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Words in the TX FIFO
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    /// Words in the RX FIFO
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Current status flags
    pub fn status(&self) -> StatusFlags {
        StatusFlags {
            rx_empty: self.rx.is_empty(),
            rx_full: self.rx.is_full(),
            tx_empty: self.tx.is_empty(),
            tx_full: self.tx.is_full(),
            mode_fault: self.mode_fault,
            slave_mode_select: self.ss_input,
        }
    }

    /// The mode fault was seen by the bus master
    pub fn acknowledge_fault(&mut self) {
        self.mode_fault = false;
    }

    /// Drive the external slave select input, low means another master
    /// selects us
    pub fn set_slave_select_input(&mut self, level: bool) {
        self.ss_input = level;
    }

    /// Interrupt sources raised since the last call, as ISR bits
    pub fn take_events(&mut self) -> u32 {
        core::mem::take(&mut self.events)
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the engine would do nothing on the next clock
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && !self.can_start()
    }

    /// Level of SCK
    pub fn sck(&self) -> bool {
        self.sck
    }

    /// Level of MOSI
    pub fn mosi(&self) -> bool {
        self.mosi
    }

    /// The device on the wire
    pub fn peer(&self) -> &P {
        &self.peer
    }

    /// The device on the wire
    pub fn peer_mut(&mut self) -> &mut P {
        &mut self.peer
    }

    /// Detach the device on the wire
    pub fn release(self) -> P {
        self.peer
    }

    /// Advance by one bus clock
    ///
    /// A failing peer aborts the frame in flight, its partial word is
    /// discarded.
    pub fn tick(&mut self) -> Result<(), P::Error> {
        if self.contention() {
            self.fault();
            return Ok(());
        }

        let result = match self.state {
            State::Idle if self.can_start() => self.start(),
            State::Idle => Ok(()),
            State::Shifting => {
                self.counter += 1;
                if self.counter >= self.half_period {
                    self.counter = 0;
                    self.edge()
                } else {
                    Ok(())
                }
            }
            State::Done => self.finish(),
        };

        if result.is_err() {
            self.abort();
        }
        result
    }

    fn raise(&mut self, source: Interrupt) {
        self.events |= source.mask();
    }

    fn contention(&self) -> bool {
        self.config.master_mode && self.config.spi_enable && !self.ss_input
    }

    fn can_start(&self) -> bool {
        self.config.spi_enable
            && self.config.master_mode
            && !self.mode_fault
            && !self.tx.is_empty()
    }

    fn fault(&mut self) {
        log::warn!(
            "mode fault: slave select driven low in master mode, {:?} frame aborted",
            self.state
        );

        self.state = State::Idle;
        self.config.spi_enable = false;
        self.sck = self.config.cpol;
        self.mode_fault = true;
        self.raise(Interrupt::ModeFault);
    }

    fn abort(&mut self) {
        log::warn!("device on the wire failed, {:?} frame aborted", self.state);

        self.state = State::Idle;
        self.sck = self.config.cpol;
        self.counter = 0;
    }

    fn start(&mut self) -> Result<(), P::Error> {
        let Some(word) = self.tx.pop() else {
            return Ok(());
        };
        if DEPTH >= 2 && self.tx.len() == DEPTH / 2 {
            self.raise(Interrupt::TxHalfEmpty);
        }

        self.frame = self.config;
        self.peer.begin(self.frame.bit_order())?;

        self.shift = word;
        self.sampled = 0;
        self.edges = 0;
        self.counter = 0;
        self.sck = self.frame.cpol;
        self.state = State::Shifting;

        // With CPHA=0 the first bit must be on the wire before the first edge
        if !self.frame.cpha {
            self.drive();
        }

        Ok(())
    }

    fn edge(&mut self) -> Result<(), P::Error> {
        self.sck = !self.sck;
        self.edges += 1;

        let leading = self.edges % 2 == 1;
        if leading != self.frame.cpha {
            self.sample()?;
        } else if self.sampled < SPI_DATA_WIDTH {
            self.drive();
        }

        if self.edges == EDGES_PER_FRAME {
            self.state = State::Done;
        }

        Ok(())
    }

    fn drive(&mut self) {
        self.mosi = match self.frame.bit_order() {
            BitOrder::MsbFirst => self.shift & 0x80 != 0,
            BitOrder::LsbFirst => self.shift & 0x01 != 0,
        };
    }

    fn sample(&mut self) -> Result<(), P::Error> {
        let miso = self.peer.exchange(self.mosi)? as u8;

        self.shift = match self.frame.bit_order() {
            BitOrder::MsbFirst => (self.shift << 1) | miso,
            BitOrder::LsbFirst => (self.shift >> 1) | (miso << 7),
        };
        self.sampled += 1;

        Ok(())
    }

    fn finish(&mut self) -> Result<(), P::Error> {
        self.peer.end()?;
        self.state = State::Idle;

        let word = self.shift;
        match self.rx.push(word) {
            Ok(()) => {
                log::trace!("frame complete, received {:#04x}", word);

                if self.rx.len() == 1 {
                    self.raise(Interrupt::RxNotEmpty);
                }
                if self.rx.is_full() {
                    self.raise(Interrupt::RxFull);
                }
            }
            Err(word) => {
                log::warn!("RX FIFO full, dropping {:#04x}", word);
                self.raise(Interrupt::RxOverrun);
            }
        }

        if self.can_start() {
            self.start()
        } else {
            if self.tx.is_empty() {
                self.raise(Interrupt::TxEmpty);
            }
            Ok(())
        }
    }
}
