//! Enumeration of interrupt sources

#[cfg(feature = "defmt")]
use defmt::Format;

/// Interrupt sources, by their bit position in ISR and IER
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Interrupt {
    /// Slave select was driven low by another master while in master mode
    ModeFault = 0,
    /// The TX FIFO drained after a transfer
    TxEmpty = 2,
    /// A DTR write was dropped because the TX FIFO was full
    TxOverflow = 3,
    /// The RX FIFO became full
    RxFull = 4,
    /// A received word was dropped because the RX FIFO was full
    RxOverrun = 5,
    /// The TX FIFO went down to half of its depth
    TxHalfEmpty = 6,
    /// The RX FIFO received a word while empty
    RxNotEmpty = 8,
}

impl Interrupt {
    /// Every interrupt source
    pub const ALL: [Interrupt; 7] = [
        Interrupt::ModeFault,
        Interrupt::TxEmpty,
        Interrupt::TxOverflow,
        Interrupt::RxFull,
        Interrupt::RxOverrun,
        Interrupt::TxHalfEmpty,
        Interrupt::RxNotEmpty,
    ];

    /// The ISR/IER bit of this source
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self as u8
    }

    /// Whether this source is set in an ISR/IER value
    #[inline]
    pub const fn is_set(self, bits: u32) -> bool {
        bits & self.mask() != 0
    }
}

/// Combine interrupt sources into an ISR/IER value
pub fn mask_of(sources: &[Interrupt]) -> u32 {
    sources.iter().fold(0, |bits, source| bits | source.mask())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ll::isr;

    #[test]
    fn masks_match_register_layout() {
        let layout = [
            (Interrupt::ModeFault, *isr::W(0).modf(1)),
            (Interrupt::TxEmpty, *isr::W(0).dtr_empty(1)),
            (Interrupt::TxOverflow, *isr::W(0).tx_overflow(1)),
            (Interrupt::RxFull, *isr::W(0).drr_full(1)),
            (Interrupt::RxOverrun, *isr::W(0).drr_overrun(1)),
            (Interrupt::TxHalfEmpty, *isr::W(0).tx_half_empty(1)),
            (Interrupt::RxNotEmpty, *isr::W(0).drr_not_empty(1)),
        ];

        for (source, w) in layout {
            assert_eq!(source.mask(), w.bits(), "{:?}", source);
        }
    }

    #[test]
    fn combine() {
        let bits = mask_of(&[Interrupt::ModeFault, Interrupt::RxNotEmpty]);
        assert_eq!(bits, 0x101);
        assert!(Interrupt::RxNotEmpty.is_set(bits));
        assert!(!Interrupt::TxEmpty.is_set(bits));
        assert_eq!(mask_of(&Interrupt::ALL), 0x17d);
    }
}
