//! Decoded status and interrupt state

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::ll::{gier, sr};

/// Flags reported through the status register
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusFlags {
    /// RX FIFO holds no words
    pub rx_empty: bool,
    /// RX FIFO is at capacity
    pub rx_full: bool,
    /// TX FIFO holds no words
    pub tx_empty: bool,
    /// TX FIFO is at capacity
    pub tx_full: bool,
    /// A mode fault is latched
    pub mode_fault: bool,
    /// Level of the slave select input (high when nobody selects us)
    pub slave_mode_select: bool,
}

impl StatusFlags {
    /// Decode a status register value
    pub fn decode(r: &sr::R) -> Self {
        StatusFlags {
            rx_empty: r.rx_empty() != 0,
            rx_full: r.rx_full() != 0,
            tx_empty: r.tx_empty() != 0,
            tx_full: r.tx_full() != 0,
            mode_fault: r.modf() != 0,
            slave_mode_select: r.slave_mode_select() != 0,
        }
    }

    /// Encode as a status register value
    ///
    /// The reserved bit 7 always reads as 1.
    pub fn bits(&self) -> u32 {
        sr::W(0)
            .rx_empty(self.rx_empty as u8)
            .rx_full(self.rx_full as u8)
            .tx_empty(self.tx_empty as u8)
            .tx_full(self.tx_full as u8)
            .modf(self.mode_fault as u8)
            .slave_mode_select(self.slave_mode_select as u8)
            .reserved(1)
            .bits()
    }
}

/// The interrupt controller's state
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterruptState {
    /// GIER bit 31
    pub global_enable: bool,
    /// IER
    pub enable_mask: u32,
    /// ISR
    pub pending: u32,
}

impl InterruptState {
    /// Build from raw GIER, IER and ISR values
    pub fn from_registers(gier: u32, ier: u32, isr: u32) -> Self {
        InterruptState {
            global_enable: gier::R(gier).gie() != 0,
            enable_mask: ier,
            pending: isr,
        }
    }

    /// Pending sources that are let through by IER
    pub fn active(&self) -> u32 {
        self.enable_mask & self.pending
    }

    /// Level of the external interrupt line
    pub fn asserted(&self) -> bool {
        self.global_enable && self.active() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ll::{Register, SR};

    #[test]
    fn reset_pattern() {
        let flags = StatusFlags {
            rx_empty: true,
            tx_empty: true,
            slave_mode_select: true,
            ..Default::default()
        };

        assert_eq!(flags.bits(), SR::RESET);
        assert_eq!(StatusFlags::decode(&sr::R(SR::RESET)), flags);
    }

    #[test]
    fn interrupt_line() {
        let state = InterruptState::from_registers(0, 0x1, 0x1);
        assert!(!state.asserted());

        let state = InterruptState::from_registers(0x8000_0000, 0x4, 0x1);
        assert!(!state.asserted());
        assert_eq!(state.active(), 0);

        let state = InterruptState::from_registers(0x8000_0000, 0x5, 0x1);
        assert!(state.asserted());
        assert_eq!(state.active(), 0x1);
    }
}
