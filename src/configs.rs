//! Configuration structs for the controller and the driver
//!
//! This module houses the datastructures that control how the controller is
//! clocked, how its control register is interpreted, and how the high-level
//! driver sets it up.

use embedded_hal::spi::{Mode, Phase, Polarity, MODE_0};

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::ll::{cr, Register, CR};

/// Default depth of each FIFO, in words
pub const FIFO_DEPTH: usize = 32;

/// Width of one SPI data word, in bits
pub const SPI_DATA_WIDTH: u32 = 8;

/// System (bus) clock of the reference design, in Hz
pub const FREQ_CLK: u32 = 50_000_000;

/// SPI clock of the reference design, in Hz
pub const FREQ_SPI: u32 = 12_500_000;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The order in which the bits of a word go over the wire
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Clocking of the controller model
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timing {
    /// Bus clock, one `Controller::tick` per period
    pub system_clock_hz: u32,
    /// SPI clock, derived from the bus clock
    pub spi_clock_hz: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            system_clock_hz: FREQ_CLK,
            spi_clock_hz: FREQ_SPI,
        }
    }
}

impl Timing {
    /// Bus clocks between two SCK edges
    ///
    /// Returns `None` if the SPI clock can't be derived from the bus clock by
    /// an even integer divider.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use axi_spi::configs::Timing;
    ///
    /// assert_eq!(Timing::default().half_period(), Some(2));
    ///
    /// let odd = Timing { system_clock_hz: 30, spi_clock_hz: 10 };
    /// assert_eq!(odd.half_period(), None);
    /// ```
    pub fn half_period(&self) -> Option<u32> {
        let ratio = self.system_clock_hz.checked_div(self.spi_clock_hz)?;

        if ratio < 2 || ratio % 2 != 0 || ratio * self.spi_clock_hz != self.system_clock_hz {
            return None;
        }

        Some(ratio / 2)
    }
}

/// The control register, decoded
///
/// This is the only place that turns CR bits into behaviour. The FIFO reset
/// bits are commands: they are acted upon when CR is written and never stored.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlConfig {
    /// Shift the least significant bit first
    pub lsb_first: bool,
    /// Flush the RX FIFO
    pub rx_fifo_reset: bool,
    /// Flush the TX FIFO
    pub tx_fifo_reset: bool,
    /// Clock phase
    pub cpha: bool,
    /// Clock polarity, the idle level of SCK
    pub cpol: bool,
    /// Master mode
    pub master_mode: bool,
    /// SPI system enable
    pub spi_enable: bool,
}

impl ControlConfig {
    /// Decode a control register value
    pub fn decode(r: &cr::R) -> Self {
        ControlConfig {
            lsb_first: r.lsb_first() != 0,
            rx_fifo_reset: r.rxfifo_reset() != 0,
            tx_fifo_reset: r.txfifo_reset() != 0,
            cpha: r.cpha() != 0,
            cpol: r.cpol() != 0,
            master_mode: r.master() != 0,
            spi_enable: r.spe() != 0,
        }
    }

    /// The configuration CR holds after reset
    pub fn reset() -> Self {
        Self::decode(&cr::R(CR::RESET))
    }

    /// Encode into a control register value
    ///
    /// Bits that `ControlConfig` doesn't cover are left untouched.
    pub fn encode<'w>(&self, w: &'w mut cr::W) -> &'w mut cr::W {
        w.lsb_first(self.lsb_first as u8)
            .rxfifo_reset(self.rx_fifo_reset as u8)
            .txfifo_reset(self.tx_fifo_reset as u8)
            .cpha(self.cpha as u8)
            .cpol(self.cpol as u8)
            .master(self.master_mode as u8)
            .spe(self.spi_enable as u8)
    }

    /// An enabled master configuration for the given mode and bit order
    pub fn master(mode: Mode, bit_order: BitOrder) -> Self {
        ControlConfig {
            lsb_first: bit_order == BitOrder::LsbFirst,
            cpha: mode.phase == Phase::CaptureOnSecondTransition,
            cpol: mode.polarity == Polarity::IdleHigh,
            master_mode: true,
            spi_enable: true,
            ..Default::default()
        }
    }

    /// The SPI mode selected by CPOL and CPHA
    pub fn mode(&self) -> Mode {
        Mode {
            polarity: if self.cpol {
                Polarity::IdleHigh
            } else {
                Polarity::IdleLow
            },
            phase: if self.cpha {
                Phase::CaptureOnSecondTransition
            } else {
                Phase::CaptureOnFirstTransition
            },
        }
    }

    /// The bit order selected by LSB first
    pub fn bit_order(&self) -> BitOrder {
        if self.lsb_first {
            BitOrder::LsbFirst
        } else {
            BitOrder::MsbFirst
        }
    }
}

/// Driver configuration
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Clock polarity and phase
    pub mode: Mode,
    /// Bit order on the wire
    pub bit_order: BitOrder,
    /// Slave to select, 0 to 31
    pub slave: u8,
    /// Depth of the controller's FIFOs
    ///
    /// The driver never has more words in flight than this, so the RX FIFO
    /// can't overrun during a transfer.
    pub fifo_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: MODE_0,
            bit_order: BitOrder::default(),
            slave: 0,
            fifo_depth: FIFO_DEPTH,
        }
    }
}
