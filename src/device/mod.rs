//! Model of the AXI SPI controller
//!
//! The entry point is [`Controller`], which pairs the bus-facing
//! [`RegisterFile`] with the [`Engine`] that shifts words with a [`Peer`].
//!
//! Time only advances through [`Controller::tick`], one call per bus clock.
//! The plain [`Controller::read`] and [`Controller::write`] accesses take no
//! time; the [`Bus`] implementation and the [AXI front end] spend one bus
//! clock per access, so a driver polling the controller moves the simulation
//! forward the way a real bus master would.
//!
//! [AXI front end]: ../axi/index.html

use core::fmt::{self, Display, Formatter};

#[cfg(feature = "defmt")]
use defmt::Format;

pub use engine::*;
pub use fifo::*;
pub use peer::*;
pub use registers::*;

use crate::{
    configs::{Timing, FIFO_DEPTH},
    ll::{Bus, Register, CR, GIER, IER, ISR, RFOR, SR, SSR, TFOR},
    status::InterruptState,
};

mod engine;
mod fifo;
mod peer;
mod registers;

/// An error reported by the controller model
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error<E> {
    /// No register lives at this offset
    InvalidAddress(u8),

    /// The register at this offset can't be written
    WriteProtected(u8),

    /// The device on the wire failed
    Peer(E),

    /// The FIFO depth or the clocking can't be built
    InvalidConfiguration,
}

impl<E> Display for Error<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddress(offset) => write!(f, "no register at {:#04x}", offset),
            Error::WriteProtected(offset) => write!(f, "register at {:#04x} is read-only", offset),
            Error::Peer(error) => write!(f, "device on the wire failed: {:?}", error),
            Error::InvalidConfiguration => write!(f, "invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for Error<E> where E: fmt::Debug {}

/// All register values at one point in time
///
/// Taken without side effects, see [`Controller::snapshot`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Global Interrupt Enable
    pub gier: u32,
    /// Interrupt Status
    pub isr: u32,
    /// Interrupt Enable
    pub ier: u32,
    /// Control
    pub cr: u32,
    /// Status
    pub sr: u32,
    /// Slave Select
    pub ssr: u32,
    /// TX FIFO Occupancy
    pub tfor: u32,
    /// RX FIFO Occupancy
    pub rfor: u32,
    /// Level of the interrupt line
    pub irq: bool,
}

/// The AXI SPI controller
///
/// `DEPTH` is the capacity of each FIFO.
pub struct Controller<P, const DEPTH: usize = FIFO_DEPTH>
where
    P: Peer,
{
    registers: RegisterFile,
    engine: Engine<P, DEPTH>,
    // Device failure seen on a bus clock, reported by the next access
    peer_error: Option<P::Error>,
}

// Not derived, the latched peer error doesn't have to be `Debug`
impl<P, const DEPTH: usize> fmt::Debug for Controller<P, DEPTH>
where
    P: Peer + fmt::Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("registers", &self.registers)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<P> Controller<P>
where
    P: Peer,
{
    /// Create a controller with the reference FIFO depth and clocking
    ///
    /// # Example
    ///
    /// ``` rust
    /// use axi_spi::device::{Controller, Loopback};
    ///
    /// let mut spi = Controller::new(Loopback).unwrap();
    ///
    /// assert_eq!(spi.read(0x60), Ok(0x180));
    /// assert_eq!(spi.read(0x64), Ok(0xa5));
    /// ```
    pub fn new(peer: P) -> Result<Self, Error<P::Error>> {
        Self::with_timing(peer, Timing::default())
    }
}

impl<P, const DEPTH: usize> Controller<P, DEPTH>
where
    P: Peer,
{
    /// Create a controller with custom clocking
    ///
    /// Fails with [`Error::InvalidConfiguration`] if `DEPTH` is zero or the SPI
    /// clock can't be derived from the bus clock.
    pub fn with_timing(peer: P, timing: Timing) -> Result<Self, Error<P::Error>> {
        if DEPTH == 0 {
            return Err(Error::InvalidConfiguration);
        }
        let half_period = timing.half_period().ok_or(Error::InvalidConfiguration)?;

        Ok(Controller {
            registers: RegisterFile::new(),
            engine: Engine::new(peer, half_period),
            peer_error: None,
        })
    }

    /// Read the register at `offset`, taking no time
    pub fn read(&mut self, offset: u8) -> Result<u32, Error<P::Error>> {
        let value = self.registers.read(offset, &mut self.engine);
        self.sync();
        value
    }

    /// Write the register at `offset`, taking no time
    pub fn write(&mut self, offset: u8, value: u32) -> Result<(), Error<P::Error>> {
        let result = self.registers.write(offset, value, &mut self.engine);
        self.sync();
        result
    }

    /// Read the register at `offset` without side effects
    pub fn peek(&self, offset: u8) -> Result<u32, Error<P::Error>> {
        self.registers.peek(offset, &self.engine)
    }

    /// Advance by one bus clock
    pub fn tick(&mut self) -> Result<(), Error<P::Error>> {
        let result = self.engine.tick().map_err(Error::Peer);
        self.sync();
        result
    }

    /// Advance by `cycles` bus clocks
    pub fn run(&mut self, cycles: u32) -> Result<(), Error<P::Error>> {
        for _ in 0..cycles {
            self.tick()?;
        }

        Ok(())
    }

    /// Advance until the engine has nothing left to do
    ///
    /// Gives up after `limit` bus clocks. Returns the number of clocks spent.
    pub fn run_until_idle(&mut self, limit: u32) -> Result<u32, Error<P::Error>> {
        let mut cycles = 0;
        while !self.engine.is_idle() && cycles < limit {
            self.tick()?;
            cycles += 1;
        }

        Ok(cycles)
    }

    /// Restore the reset state, as a write of the key to SRR does
    ///
    /// A latched device failure is dropped as well.
    pub fn soft_reset(&mut self) {
        self.peer_error = None;
        self.registers.soft_reset(&mut self.engine);
    }

    /// Level of the interrupt line
    pub fn irq(&self) -> bool {
        self.registers.interrupts().asserted()
    }

    /// State of the interrupt controller
    pub fn interrupts(&self) -> InterruptState {
        self.registers.interrupts()
    }

    /// Drive the external slave select input
    ///
    /// The input idles high. Driving it low while the controller is an enabled
    /// master is a mode fault.
    pub fn set_slave_select_input(&mut self, level: bool) {
        self.engine.set_slave_select_input(level);
    }

    /// Whether the engine has nothing left to do
    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }

    /// State of the shift engine
    pub fn state(&self) -> State {
        self.engine.state()
    }

    /// Level of SCK
    pub fn sck(&self) -> bool {
        self.engine.sck()
    }

    /// Level of MOSI
    pub fn mosi(&self) -> bool {
        self.engine.mosi()
    }

    /// The device on the wire
    pub fn peer(&self) -> &P {
        self.engine.peer()
    }

    /// The device on the wire
    pub fn peer_mut(&mut self) -> &mut P {
        self.engine.peer_mut()
    }

    /// Tear down the controller and detach the device on the wire
    pub fn release(self) -> P {
        self.engine.release()
    }

    /// All register values, read without side effects
    pub fn snapshot(&self) -> Snapshot {
        let peek = |offset| self.peek(offset).unwrap_or_default();

        Snapshot {
            gier: peek(GIER::OFFSET),
            isr: peek(ISR::OFFSET),
            ier: peek(IER::OFFSET),
            cr: peek(CR::OFFSET),
            sr: peek(SR::OFFSET),
            ssr: peek(SSR::OFFSET),
            tfor: peek(TFOR::OFFSET),
            rfor: peek(RFOR::OFFSET),
            irq: self.irq(),
        }
    }

    /// Run one bus access, then spend its bus clock
    ///
    /// An access either takes effect and reports its own outcome, or fails
    /// without effect. A device failure during the clock is latched and
    /// reported by the next access, which then doesn't happen.
    pub(crate) fn clocked<T, E>(
        &mut self,
        access: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<Error<P::Error>>,
    {
        let result = match self.peer_error.take() {
            Some(error) => Err(Error::Peer(error).into()),
            None => access(self),
        };

        if let Err(Error::Peer(error)) = self.tick() {
            log::warn!("device on the wire failed, reported on the next access");
            self.peer_error = Some(error);
        }

        result
    }

    fn sync(&mut self) {
        let events = self.engine.take_events();
        if events != 0 {
            self.registers.raise(events);
        }
    }
}

impl<P, const DEPTH: usize> Bus for Controller<P, DEPTH>
where
    P: Peer,
{
    type Error = Error<P::Error>;

    /// Read, then spend one bus clock
    fn read(&mut self, offset: u8) -> Result<u32, Self::Error> {
        self.clocked(|spi| Controller::read(spi, offset))
    }

    /// Write, then spend one bus clock
    fn write(&mut self, offset: u8, value: u32) -> Result<(), Self::Error> {
        self.clocked(|spi| Controller::write(spi, offset, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interrupt::Interrupt,
        ll::{REGISTER_MAP, DRR, DTR, SOFT_RESET_KEY, SRR},
    };

    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    const ENABLED_MASTER: u32 = 0x0000_0186;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn loopback() -> Controller<Loopback> {
        init_logger();
        Controller::new(Loopback).unwrap()
    }

    fn reset_values<P: Peer, const DEPTH: usize>(spi: &mut Controller<P, DEPTH>)
    where
        P::Error: fmt::Debug,
    {
        for info in REGISTER_MAP {
            assert_eq!(spi.read(info.offset).unwrap(), info.reset, "{}", info.name);
        }
    }

    #[test]
    fn reads_reset_values() {
        let mut spi = loopback();

        reset_values(&mut spi);
        assert_eq!(spi.read(0x60), Ok(0x0000_0180));
        assert_eq!(spi.read(0x64), Ok(0x0000_00a5));
        assert_eq!(spi.read(0x70), Ok(0xffff_ffff));
    }

    #[test]
    fn unmapped_offsets_are_rejected() {
        let mut spi = loopback();

        for offset in [0x00, 0x24, 0x41, 0x7c, 0x7f, 0x80, 0xff] {
            assert_eq!(spi.read(offset), Err(Error::InvalidAddress(offset)));
            assert_eq!(spi.write(offset, 0), Err(Error::InvalidAddress(offset)));
        }
    }

    #[test]
    fn soft_reset_restores_everything() {
        let mut spi = loopback();

        spi.write(GIER::OFFSET, 0x8000_0000).unwrap();
        spi.write(IER::OFFSET, 0x1ff).unwrap();
        spi.write(SSR::OFFSET, 0xffff_fffe).unwrap();
        spi.write(CR::OFFSET, 0x0000_0398).unwrap();
        for word in 0..5 {
            spi.write(DTR::OFFSET, word).unwrap();
        }
        assert_eq!(spi.read(TFOR::OFFSET), Ok(5));

        spi.write(SRR::OFFSET, SOFT_RESET_KEY).unwrap();

        reset_values(&mut spi);
        let status = spi.read(SR::OFFSET).unwrap();
        assert_eq!(status & 0b101, 0b101);
    }

    #[test]
    fn soft_reset_needs_the_key() {
        let mut spi = loopback();

        spi.write(SSR::OFFSET, 0).unwrap();
        spi.write(SRR::OFFSET, 0x0000_000b).unwrap();
        spi.write(SRR::OFFSET, 0xffff_ffff).unwrap();

        assert_eq!(spi.read(SSR::OFFSET), Ok(0));
    }

    #[test]
    fn loopback_preserves_order() {
        let mut spi = loopback();
        let words = [0x00, 0xff, 0x41, 0x5a, 0x80, 0x01, 0x3c];

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        for word in words {
            spi.write(DTR::OFFSET, word).unwrap();
        }
        spi.run_until_idle(10_000).unwrap();

        assert_eq!(spi.read(RFOR::OFFSET), Ok(words.len() as u32));
        for word in words {
            assert_eq!(spi.read(DRR::OFFSET), Ok(word));
        }
        assert_eq!(spi.read(RFOR::OFFSET), Ok(0));
    }

    #[test]
    fn tx_overflow_drops_the_33rd_word() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, 0x0000_0184).unwrap();
        for word in 0..33 {
            spi.write(DTR::OFFSET, word).unwrap();
        }

        assert_eq!(spi.read(TFOR::OFFSET), Ok(32));
        assert!(Interrupt::TxOverflow.is_set(spi.read(ISR::OFFSET).unwrap()));
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 0b1100, 0b1000);

        // Enable and check that exactly the first 32 come back
        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.run_until_idle(10_000).unwrap();
        for word in 0..32 {
            assert_eq!(spi.read(DRR::OFFSET), Ok(word));
        }
        assert_eq!(spi.read(RFOR::OFFSET), Ok(0));
    }

    #[test]
    fn status_register_is_read_only() {
        let mut spi = loopback();

        spi.write(DTR::OFFSET, 0x12).unwrap();
        let before = spi.peek(SR::OFFSET).unwrap();

        for value in [0, 0xffff_ffff, 0xa5, 0x5a] {
            assert_eq!(spi.write(SR::OFFSET, value), Err(Error::WriteProtected(0x64)));
            assert_eq!(spi.peek(SR::OFFSET), Ok(before));
        }

        for offset in [DRR::OFFSET, TFOR::OFFSET, RFOR::OFFSET] {
            assert_eq!(spi.write(offset, 1), Err(Error::WriteProtected(offset)));
        }
    }

    #[test]
    fn write_only_registers_read_zero() {
        let mut spi = loopback();

        spi.write(DTR::OFFSET, 0x41).unwrap();
        assert_eq!(spi.read(DTR::OFFSET), Ok(0));
        assert_eq!(spi.read(SRR::OFFSET), Ok(0));
    }

    #[test]
    fn rx_fifo_reset_self_clears() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.write(DTR::OFFSET, 1).unwrap();
        spi.write(DTR::OFFSET, 2).unwrap();
        spi.run_until_idle(10_000).unwrap();
        assert_eq!(spi.read(RFOR::OFFSET), Ok(2));

        spi.write(CR::OFFSET, ENABLED_MASTER | 1 << 6).unwrap();

        assert_eq!(spi.read(RFOR::OFFSET), Ok(0));
        assert_eq!(spi.read(CR::OFFSET), Ok(ENABLED_MASTER));
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 0b1, 0b1);
    }

    #[test]
    fn tx_fifo_reset_self_clears() {
        let mut spi = loopback();

        spi.write(DTR::OFFSET, 1).unwrap();
        spi.write(CR::OFFSET, 0x0000_01a0).unwrap();

        assert_eq!(spi.read(TFOR::OFFSET), Ok(0));
        assert_eq!(spi.read(CR::OFFSET), Ok(0x0000_0180));
    }

    #[test]
    fn single_word_scenario() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.write(DTR::OFFSET, 0x41).unwrap();
        spi.run(34).unwrap();

        let status = spi.read(SR::OFFSET).unwrap();
        assert_eq!(status & 0b100, 0b100, "tx_empty");
        assert_eq!(status & 0b1, 0, "rx_empty");
        assert_eq!(spi.read(DRR::OFFSET), Ok(0x41));
    }

    #[test]
    fn empty_drr_returns_last_word() {
        let mut spi = loopback();

        assert_eq!(spi.read(DRR::OFFSET), Ok(0));

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.write(DTR::OFFSET, 0x99).unwrap();
        spi.run_until_idle(100).unwrap();

        assert_eq!(spi.read(DRR::OFFSET), Ok(0x99));
        assert_eq!(spi.read(DRR::OFFSET), Ok(0x99));
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 0b11, 0b01);
    }

    #[test]
    fn interrupt_line_follows_gier_and_ier() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.write(DTR::OFFSET, 0x41).unwrap();
        spi.run_until_idle(100).unwrap();

        let pending = spi.read(ISR::OFFSET).unwrap();
        assert!(Interrupt::RxNotEmpty.is_set(pending));
        assert!(Interrupt::TxEmpty.is_set(pending));
        assert!(!spi.irq());

        spi.write(IER::OFFSET, Interrupt::RxNotEmpty.mask()).unwrap();
        assert!(!spi.irq());

        spi.write(GIER::OFFSET, 0xffff_ffff).unwrap();
        assert_eq!(spi.read(GIER::OFFSET), Ok(0x8000_0000));
        assert!(spi.irq());

        // Clear on write 1, per bit
        spi.write(ISR::OFFSET, Interrupt::RxNotEmpty.mask()).unwrap();
        assert!(!spi.irq());
        assert_eq!(spi.read(ISR::OFFSET), Ok(Interrupt::TxEmpty.mask()));
    }

    #[test]
    fn mode_fault_halts_until_acknowledged_and_reenabled() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.set_slave_select_input(false);
        spi.write(DTR::OFFSET, 0x41).unwrap();
        spi.tick().unwrap();

        assert_eq!(spi.read(CR::OFFSET), Ok(0x0000_0184));
        assert!(Interrupt::ModeFault.is_set(spi.read(ISR::OFFSET).unwrap()));

        spi.set_slave_select_input(true);

        // Re-enabling before the fault is acknowledged does nothing
        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        assert_eq!(spi.read(CR::OFFSET), Ok(0x0000_0184));
        spi.run(100).unwrap();
        assert_eq!(spi.read(TFOR::OFFSET), Ok(1));

        let status = spi.read(SR::OFFSET).unwrap();
        assert_eq!(status & 1 << 4, 1 << 4);
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 1 << 4, 0);

        // Acknowledged, but still disabled
        spi.run(100).unwrap();
        assert_eq!(spi.read(TFOR::OFFSET), Ok(1));

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.run_until_idle(100).unwrap();
        assert_eq!(spi.read(DRR::OFFSET), Ok(0x41));
    }

    #[test]
    fn slave_select_input_in_status() {
        let mut spi = loopback();

        spi.set_slave_select_input(false);
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 1 << 5, 0);

        spi.set_slave_select_input(true);
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 1 << 5, 1 << 5);
    }

    #[test]
    fn lsb_first_against_target() {
        init_logger();

        let expectations = [
            SpiTransaction::transfer_in_place(vec![0x01], vec![0x80]),
            SpiTransaction::transfer_in_place(vec![0x02], vec![0x40]),
        ];
        let target = Target::new(SpiMock::new(&expectations), 0xa5);
        let mut spi = Controller::new(target).unwrap();

        spi.write(CR::OFFSET, ENABLED_MASTER | 1 << 9).unwrap();
        spi.write(DTR::OFFSET, 0x01).unwrap();
        spi.write(DTR::OFFSET, 0x02).unwrap();
        spi.run_until_idle(1_000).unwrap();

        assert_eq!(spi.read(DRR::OFFSET), Ok(0xa5));
        assert_eq!(spi.read(DRR::OFFSET), Ok(0x80));

        spi.release().release().done();
    }

    #[test]
    fn every_spi_mode_over_loopback() {
        let mut spi = loopback();

        for control in [0x186, 0x18e, 0x196, 0x19e, 0x386, 0x39e] {
            spi.write(CR::OFFSET, control).unwrap();
            spi.write(DTR::OFFSET, 0xc3).unwrap();
            spi.run_until_idle(100).unwrap();

            assert_eq!(spi.read(DRR::OFFSET), Ok(0xc3), "CR {:#x}", control);
            assert_eq!(spi.sck(), control & 1 << 3 != 0);
        }
    }

    #[test]
    fn bus_accesses_spend_a_clock() {
        let mut spi = loopback();

        Bus::write(&mut spi, CR::OFFSET, ENABLED_MASTER).unwrap();
        Bus::write(&mut spi, DTR::OFFSET, 0x41).unwrap();
        assert_eq!(spi.state(), State::Shifting);

        let mut polls = 0;
        while Bus::read(&mut spi, RFOR::OFFSET).unwrap() == 0 {
            polls += 1;
            assert!(polls < 100);
        }
        assert_eq!(Bus::read(&mut spi, DRR::OFFSET), Ok(0x41));
    }

    /// Loops MOSI back, but fails to deselect after the `fail_at`th frame
    struct StuckSelect {
        frames: u32,
        fail_at: u32,
    }

    impl Peer for StuckSelect {
        type Error = ();

        fn exchange(&mut self, mosi: bool) -> Result<bool, ()> {
            Ok(mosi)
        }

        fn end(&mut self) -> Result<(), ()> {
            self.frames += 1;
            if self.frames == self.fail_at {
                Err(())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn device_failure_is_reported_by_the_next_access() {
        init_logger();
        let mut spi = Controller::new(StuckSelect { frames: 0, fail_at: 2 }).unwrap();

        Bus::write(&mut spi, CR::OFFSET, ENABLED_MASTER).unwrap();
        Bus::write(&mut spi, DTR::OFFSET, 0x11).unwrap();
        Bus::write(&mut spi, DTR::OFFSET, 0x22).unwrap();

        // The first frame ends on the clock before the poll that sees it, the
        // second one 33 clocks later
        let mut polls = 0;
        while Bus::read(&mut spi, RFOR::OFFSET).unwrap() == 0 {
            polls += 1;
            assert!(polls < 100);
        }
        spi.run(31).unwrap();

        // The pop happens, the second frame fails on this access' clock
        assert_eq!(Bus::read(&mut spi, DRR::OFFSET), Ok(0x11));
        assert_eq!(spi.state(), State::Idle);

        assert_eq!(Bus::read(&mut spi, RFOR::OFFSET), Err(Error::Peer(())));
        assert_eq!(Bus::read(&mut spi, RFOR::OFFSET), Ok(0));
        assert_eq!(Bus::read(&mut spi, TFOR::OFFSET), Ok(0));
    }

    #[test]
    fn invalid_configuration() {
        let timing = Timing {
            system_clock_hz: 50_000_000,
            spi_clock_hz: 20_000_000,
        };
        assert_eq!(
            Controller::<Loopback>::with_timing(Loopback, timing).err(),
            Some(Error::InvalidConfiguration)
        );
        assert_eq!(
            Controller::<Loopback, 0>::with_timing(Loopback, Timing::default()).err(),
            Some(Error::InvalidConfiguration)
        );
    }

    #[test]
    fn smaller_fifo() {
        init_logger();
        let mut spi = Controller::<Loopback, 4>::with_timing(Loopback, Timing::default()).unwrap();

        for word in 0..5 {
            spi.write(DTR::OFFSET, word).unwrap();
        }

        assert_eq!(spi.read(TFOR::OFFSET), Ok(4));
        assert_eq!(spi.read(SR::OFFSET).unwrap() & 0b1100, 0b1000);
    }

    #[test]
    fn snapshot_has_no_side_effects() {
        let mut spi = loopback();

        spi.write(CR::OFFSET, ENABLED_MASTER).unwrap();
        spi.write(DTR::OFFSET, 0x41).unwrap();
        spi.run_until_idle(100).unwrap();

        let snapshot = spi.snapshot();
        assert_eq!(snapshot.rfor, 1);
        assert_eq!(snapshot.cr, ENABLED_MASTER);
        assert_eq!(snapshot.sr & 0b101, 0b100);
        assert!(!snapshot.irq);
        assert_eq!(spi.snapshot(), snapshot);
        assert_eq!(spi.read(DRR::OFFSET), Ok(0x41));
    }
}
