//! `embedded-hal` SPI bus on top of the controller

use core::{cell::Cell, fmt};

use embedded_hal::spi::{ErrorType, SpiBus};

use crate::{ll::Bus, AxiSpi, Error, Ready};

/// Word shifted out when there is nothing to write
pub const FILL: u8 = 0x00;

/// Polls without progress before a transfer gives up
pub const POLL_LIMIT: u32 = 10_000;

impl<BUS> AxiSpi<BUS, Ready>
where
    BUS: Bus,
{
    /// Shift `len` words, `outgoing(i)` provides word `i`, `incoming(i, word)`
    /// takes the answer
    ///
    /// Never has more than `fifo_depth` words in flight, so the RX FIFO can't
    /// overrun.
    fn exchange(
        &mut self,
        len: usize,
        outgoing: impl Fn(usize) -> u8,
        mut incoming: impl FnMut(usize, u8),
    ) -> Result<(), Error<BUS::Error>> {
        let window = self.state.config.fifo_depth;

        let mut sent = 0;
        let mut received = 0;
        let mut idle = 0;

        while received < len {
            let mut progress = false;

            if sent < len && sent - received < window {
                match self.send(outgoing(sent)) {
                    Ok(()) => {
                        sent += 1;
                        progress = true;
                    }
                    Err(nb::Error::WouldBlock) => {}
                    Err(nb::Error::Other(error)) => return Err(error),
                }
            }

            if received < sent {
                match self.receive() {
                    Ok(word) => {
                        incoming(received, word);
                        received += 1;
                        progress = true;
                    }
                    Err(nb::Error::WouldBlock) => {}
                    Err(nb::Error::Other(error)) => return Err(error),
                }
            }

            if progress {
                idle = 0;
            } else {
                idle += 1;
                if idle > POLL_LIMIT {
                    log::warn!("transfer stalled after {} of {} words", received, len);
                    return Err(Error::Timeout);
                }
            }
        }

        Ok(())
    }
}

impl<BUS> ErrorType for AxiSpi<BUS, Ready>
where
    BUS: Bus,
    BUS::Error: fmt::Debug,
{
    type Error = Error<BUS::Error>;
}

impl<BUS> SpiBus<u8> for AxiSpi<BUS, Ready>
where
    BUS: Bus,
    BUS::Error: fmt::Debug,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.exchange(words.len(), |_| FILL, |i, word| words[i] = word)
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.exchange(words.len(), |i| words[i], |_, _| {})
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());

        self.exchange(
            len,
            |i| write.get(i).copied().unwrap_or(FILL),
            |i, word| {
                if let Some(slot) = read.get_mut(i) {
                    *slot = word;
                }
            },
        )
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let words = Cell::from_mut(words).as_slice_of_cells();

        self.exchange(words.len(), |i| words[i].get(), |i, word| words[i].set(word))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Every call above returns once the last word is back
        Ok(())
    }
}

#[cfg(feature = "async")]
impl<BUS> embedded_hal_async::spi::SpiBus<u8> for AxiSpi<BUS, Ready>
where
    BUS: Bus,
    BUS::Error: fmt::Debug,
{
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::read(self, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        SpiBus::write(self, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        SpiBus::transfer(self, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::transfer_in_place(self, words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        SpiBus::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        configs::BitOrder,
        device::{Controller, Floating, Loopback, Target},
        Config,
    };

    use embedded_hal::spi::MODE_1;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn loopback_transfers() {
        init_logger();

        let mut controller = Controller::new(Loopback).unwrap();
        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();

        let mut words = [0x12, 0x34, 0x56];
        spi.transfer_in_place(&mut words).unwrap();
        assert_eq!(words, [0x12, 0x34, 0x56]);

        let mut read = [0u8; 4];
        spi.transfer(&mut read, &[0xa1, 0xa2]).unwrap();
        assert_eq!(read, [0xa1, 0xa2, FILL, FILL]);

        let mut read = [0xffu8; 2];
        spi.read(&mut read).unwrap();
        assert_eq!(read, [FILL, FILL]);

        spi.write(&[1, 2, 3]).unwrap();
        spi.flush().unwrap();

        // Nothing left behind in the RX FIFO
        assert_eq!(spi.status().map(|status| status.rx_empty), Ok(true));
    }

    #[test]
    fn transfers_longer_than_the_fifo() {
        init_logger();

        let mut controller = Controller::new(Loopback).unwrap();
        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();

        let mut words = [0u8; 100];
        for (i, word) in words.iter_mut().enumerate() {
            *word = i as u8;
        }
        spi.transfer_in_place(&mut words).unwrap();

        assert!(words.iter().enumerate().all(|(i, &word)| word == i as u8));
        assert_eq!(spi.pending_interrupts().map(|bits| bits & 0b10_0000), Ok(0));
    }

    #[test]
    fn floating_reads_ones() {
        let mut controller = Controller::new(Floating).unwrap();
        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();

        let mut read = [0u8; 3];
        spi.read(&mut read).unwrap();
        assert_eq!(read, [0xff; 3]);
    }

    #[test]
    fn talks_to_a_device() {
        init_logger();

        let expectations = [
            SpiTransaction::transfer_in_place(vec![0x9f], vec![0xc2]),
            SpiTransaction::transfer_in_place(vec![0x00], vec![0x20]),
            SpiTransaction::transfer_in_place(vec![0x00], vec![0x00]),
        ];
        let target = Target::new(SpiMock::new(&expectations), 0xff);
        let mut controller = Controller::new(target).unwrap();

        let mut spi = AxiSpi::new(&mut controller)
            .init(Config {
                mode: MODE_1,
                bit_order: BitOrder::LsbFirst,
                ..Config::default()
            })
            .unwrap();

        let mut read = [0u8; 3];
        spi.transfer(&mut read, &[0x9f]).unwrap();
        assert_eq!(read, [0xff, 0xc2, 0x20]);
        drop(spi);

        controller.release().release().done();
    }

    #[test]
    fn mode_fault_fails_the_transfer() {
        let mut controller = Controller::new(Loopback).unwrap();
        controller.set_slave_select_input(false);

        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();

        let mut words = [0x41];
        assert_eq!(
            spi.transfer_in_place(&mut words),
            Err(Error::ModeFault)
        );
    }

    #[test]
    fn disabled_controller_times_out() {
        let mut controller = Controller::new(Loopback).unwrap();
        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();
        spi.ll().cr().modify(|_, w| w.spe(0)).unwrap();

        assert_eq!(spi.write(&[0x41]), Err(Error::Timeout));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn async_transfers() {
        use embedded_hal_async::spi::SpiBus as AsyncSpiBus;

        let mut controller = Controller::new(Loopback).unwrap();
        let mut spi = AxiSpi::new(&mut controller)
            .init(Config::default())
            .unwrap();

        let mut words = [0xde, 0xad];
        AsyncSpiBus::transfer_in_place(&mut spi, &mut words)
            .await
            .unwrap();
        assert_eq!(words, [0xde, 0xad]);

        AsyncSpiBus::write(&mut spi, &[1, 2]).await.unwrap();
        AsyncSpiBus::flush(&mut spi).await.unwrap();
    }
}
