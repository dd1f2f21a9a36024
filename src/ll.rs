//! Low-level interface to the AXI SPI controller
//!
//! This module implements a register-level interface to the controller. Users
//! of this library should typically not need to use this. Please consider
//! using the [high-level interface] instead.
//!
//! The register table at the bottom of this file is the only place that knows
//! where a register lives and how its bits are laid out. The controller model
//! in [`device`] and the [high-level interface] both go through the types
//! generated from it.
//!
//! **NOTE**: Many field access methods accept types that have a larger number
//! of bits than the field actually consists of. If you use such a method to
//! pass a value that is too large to be written to the field, it will be
//! silently truncated.
//!
//! [high-level interface]: ../hl/index.html
//! [`device`]: ../device/index.html

use core::marker::PhantomData;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Width of a register access on the bus, in bits
pub const DATA_WIDTH: u32 = 32;

/// Width of the register address space, in bits
pub const ADDR_WIDTH: u32 = 7;

/// The only value the soft reset register reacts to
pub const SOFT_RESET_KEY: u32 = 0x0000_000a;

/// Carries 32-bit register accesses to the controller
///
/// Implemented by the controller model itself, and by anything else that can
/// reach the register block (a memory-mapped window, a debug probe, ...).
pub trait Bus {
    /// Error reported by the bus
    type Error;

    /// Read the register at byte offset `offset`
    fn read(&mut self, offset: u8) -> Result<u32, Self::Error>;

    /// Write `value` to the register at byte offset `offset`
    fn write(&mut self, offset: u8, value: u32) -> Result<(), Self::Error>;
}

impl<B> Bus for &mut B
where
    B: Bus + ?Sized,
{
    type Error = B::Error;

    #[inline]
    fn read(&mut self, offset: u8) -> Result<u32, Self::Error> {
        (**self).read(offset)
    }

    #[inline]
    fn write(&mut self, offset: u8, value: u32) -> Result<(), Self::Error> {
        (**self).write(offset, value)
    }
}

/// Entry point to the register-level API
///
/// Please consider using [hl::AxiSpi] instead.
///
/// [hl::AxiSpi]: ../hl/struct.AxiSpi.html
#[derive(Copy, Clone, Debug)]
pub struct AxiSpi<BUS> {
    bus: BUS,
}

impl<BUS> AxiSpi<BUS> {
    /// Create a new instance of `AxiSpi`
    ///
    /// Requires the bus the controller's register block is reachable through.
    pub fn new(bus: BUS) -> Self {
        AxiSpi { bus }
    }

    /// Allow access to the bus
    pub fn bus(&mut self) -> &mut BUS {
        &mut self.bus
    }

    /// Give back the bus
    pub fn release(self) -> BUS {
        self.bus
    }
}

/// Provides access to a register
///
/// You can get an instance for a given register using one of the methods on
/// [`AxiSpi`].
pub struct RegAccessor<'s, R, BUS>(&'s mut AxiSpi<BUS>, PhantomData<R>);

impl<'s, R, BUS> RegAccessor<'s, R, BUS>
where
    BUS: Bus,
{
    /// Read from the register
    #[inline]
    pub fn read(&mut self) -> Result<R::Read, BUS::Error>
    where
        R: Register + Readable,
    {
        let mut r = R::read();
        *R::buffer(&mut r) = self.0.bus.read(R::OFFSET)?;

        Ok(r)
    }

    /// Write to the register
    #[inline]
    pub fn write<F>(&mut self, f: F) -> Result<(), BUS::Error>
    where
        R: Register + Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::write();
        f(&mut w);

        self.0.bus.write(R::OFFSET, *R::buffer(&mut w))
    }

    /// Modify the register
    ///
    /// Not suitable for clear-on-write-1 registers: every bit that reads as 1
    /// is written back as 1.
    #[inline]
    pub fn modify<F>(&mut self, f: F) -> Result<(), BUS::Error>
    where
        R: Register + Readable + Writable,
        F: for<'r> FnOnce(&mut R::Read, &'r mut R::Write) -> &'r mut R::Write,
    {
        let mut r = self.read()?;
        let mut w = R::write();

        *<R as Writable>::buffer(&mut w) = *<R as Readable>::buffer(&mut r);

        f(&mut r, &mut w);

        self.0.bus.write(R::OFFSET, *<R as Writable>::buffer(&mut w))
    }
}

/// How the bus master may access a register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Access {
    /// Reads only, writes are rejected
    ReadOnly,
    /// Reads and writes
    ReadWrite,
    /// Writes only, reads return zero
    WriteOnly,
}

/// Static description of one register of the map
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct RegisterInfo {
    /// Register mnemonic
    pub name: &'static str,
    /// Byte offset in the 7-bit address space
    pub offset: u8,
    /// Value after controller or soft reset
    pub reset: u32,
    /// Access rule
    pub access: Access,
}

/// Look up the register living at `offset`
///
/// Returns `None` for offsets that are outside of the address space, unaligned
/// or unmapped.
pub fn lookup(offset: u8) -> Option<&'static RegisterInfo> {
    REGISTER_MAP.iter().find(|info| info.offset == offset)
}

/// Implemented for all registers
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Register {
    /// Byte offset of the register
    const OFFSET: u8;

    /// Reset value of the register
    const RESET: u32;

    /// Access rule of the register
    const ACCESS: Access;
}

/// Marker trait for registers that can be read from
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Readable {
    /// The type that is used to read from the register
    type Read;

    /// Return the read type for this register
    fn read() -> Self::Read;

    /// Return the read type's internal buffer
    fn buffer(r: &mut Self::Read) -> &mut u32;
}

/// Marker trait for registers that can be written to
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Writable {
    /// The type that is used to write to the register
    type Write;

    /// Return the write type for this register
    fn write() -> Self::Write;

    /// Return the write type's internal buffer
    fn buffer(w: &mut Self::Write) -> &mut u32;
}

/// Generates register implementations
macro_rules! impl_register {
    (
        $(
            $offset:expr,
            $reset:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
            #[$doc:meta]
            $(
                $field:ident,
                $first_bit:expr,
                $last_bit:expr,
                $ty:ty;
                #[$field_doc:meta]
            )*
            }
        )*
    ) => {
        $(
            #[$doc]
            #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
            pub struct $name;

            impl Register for $name {
                const OFFSET: u8     = $offset;
                const RESET:  u32    = $reset;
                const ACCESS: Access = impl_rw!(@access $rw);
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                /// Used to read from the register
                #[derive(Copy, Clone, Eq, PartialEq)]
                pub struct R(pub(crate) u32);

                impl R {
                    /// The raw register value
                    #[inline(always)]
                    pub fn bits(&self) -> u32 {
                        self.0
                    }

                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&self) -> $ty {
                            const FIRST: u32 = $first_bit;
                            const MASK:  u32 =
                                u32::MAX >> (31 - ($last_bit - $first_bit));

                            ((self.0 >> FIRST) & MASK) as $ty
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x{:08x}", self.0)
                    }
                }

                #[cfg(feature = "defmt")]
                impl defmt::Format for R {
                    fn format(&self, f: defmt::Formatter) {
                        defmt::write!(f, "0x{:08x}", self.0);
                    }
                }

                /// Used to write to the register
                #[derive(Copy, Clone, Eq, PartialEq)]
                pub struct W(pub(crate) u32);

                impl W {
                    /// The raw register value
                    #[inline(always)]
                    pub fn bits(&self) -> u32 {
                        self.0
                    }

                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&mut self, value: $ty) -> &mut Self {
                            const FIRST: u32 = $first_bit;
                            const MASK:  u32 =
                                u32::MAX >> (31 - ($last_bit - $first_bit));

                            self.0 = (self.0 & !(MASK << FIRST))
                                | (((value as u32) & MASK) << FIRST);

                            self
                        }
                    )*
                }

                impl fmt::Debug for W {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x{:08x}", self.0)
                    }
                }
            }

            impl_rw!($rw, $name, $name_lower);
        )*

        /// Every register of the controller, in address order
        pub static REGISTER_MAP: &[RegisterInfo] = &[
            $(
                RegisterInfo {
                    name:   stringify!($name),
                    offset: $offset,
                    reset:  $reset,
                    access: impl_rw!(@access $rw),
                },
            )*
        ];

        impl<BUS> AxiSpi<BUS> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<'_, $name, BUS> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }
    }
}

// Helper macro, used internally by `impl_register!`
macro_rules! impl_rw {
    (@access RO) => { Access::ReadOnly };
    (@access RW) => { Access::ReadWrite };
    (@access WO) => { Access::WriteOnly };

    (RO, $name:ident, $name_lower:ident) => {
        impl_rw!(@R, $name, $name_lower);
    };
    (RW, $name:ident, $name_lower:ident) => {
        impl_rw!(@R, $name, $name_lower);
        impl_rw!(@W, $name, $name_lower);
    };
    (WO, $name:ident, $name_lower:ident) => {
        impl_rw!(@W, $name, $name_lower);
    };

    (@R, $name:ident, $name_lower:ident) => {
        impl Readable for $name {
            type Read = $name_lower::R;

            fn read() -> Self::Read {
                $name_lower::R(0)
            }

            fn buffer(r: &mut Self::Read) -> &mut u32 {
                &mut r.0
            }
        }
    };
    (@W, $name:ident, $name_lower:ident) => {
        impl Writable for $name {
            type Write = $name_lower::W;

            fn write() -> Self::Write {
                $name_lower::W(0)
            }

            fn buffer(w: &mut Self::Write) -> &mut u32 {
                &mut w.0
            }
        }
    };
}

// All registers are implemented in this macro invocation. It follows the
// following syntax:
// <offset>, <reset-value>, <RO/RW/WO>, <NAME(name)> { /// <doc>
//     <field>, <first-bit-index>, <last-bit-index>, <type>; /// <doc>
//     ...
// }
//
// The ISR and IER layouts must stay in step with `crate::interrupt::Interrupt`.
impl_register! {
    0x1c, 0x0000_0000, RW, GIER(gier) { /// Global Interrupt Enable
        gie,            31, 31, u8; /// Gates the interrupt line
    }
    0x20, 0x0000_0000, RW, ISR(isr) { /// Interrupt Status (write 1 to clear)
        modf,            0,  0, u8; /// Mode fault
        dtr_empty,       2,  2, u8; /// TX FIFO drained
        tx_overflow,     3,  3, u8; /// DTR write dropped, TX FIFO full
        drr_full,        4,  4, u8; /// RX FIFO became full
        drr_overrun,     5,  5, u8; /// Received word dropped, RX FIFO full
        tx_half_empty,   6,  6, u8; /// TX FIFO down to half its depth
        drr_not_empty,   8,  8, u8; /// RX FIFO received its first word
    }
    0x28, 0x0000_0000, RW, IER(ier) { /// Interrupt Enable
        modf,            0,  0, u8; /// Mode fault
        dtr_empty,       2,  2, u8; /// TX FIFO drained
        tx_overflow,     3,  3, u8; /// DTR write dropped, TX FIFO full
        drr_full,        4,  4, u8; /// RX FIFO became full
        drr_overrun,     5,  5, u8; /// Received word dropped, RX FIFO full
        tx_half_empty,   6,  6, u8; /// TX FIFO down to half its depth
        drr_not_empty,   8,  8, u8; /// RX FIFO received its first word
    }
    0x40, 0x0000_0000, WO, SRR(srr) { /// Software Reset
        reset,           0, 31, u32; /// Write `SOFT_RESET_KEY` to reset
    }
    0x60, 0x0000_0180, RW, CR(cr) { /// Control
        loopback,        0,  0, u8; /// Stored, no effect in this model
        spe,             1,  1, u8; /// SPI system enable
        master,          2,  2, u8; /// Master mode
        cpol,            3,  3, u8; /// Clock polarity
        cpha,            4,  4, u8; /// Clock phase
        txfifo_reset,    5,  5, u8; /// Flush the TX FIFO, self-clearing
        rxfifo_reset,    6,  6, u8; /// Flush the RX FIFO, self-clearing
        manual_ss,       7,  7, u8; /// Stored, no effect in this model
        inhibit,         8,  8, u8; /// Stored, no effect in this model
        lsb_first,       9,  9, u8; /// Shift the least significant bit first
    }
    0x64, 0x0000_00a5, RO, SR(sr) { /// Status
        rx_empty,        0,  0, u8; /// RX FIFO empty
        rx_full,         1,  1, u8; /// RX FIFO full
        tx_empty,        2,  2, u8; /// TX FIFO empty
        tx_full,         3,  3, u8; /// TX FIFO full
        modf,            4,  4, u8; /// Mode fault, cleared by reading SR
        slave_mode_select, 5, 5, u8; /// Level of the slave select input
        reserved,        7,  7, u8; /// Reserved, reads as 1
    }
    0x68, 0x0000_0000, WO, DTR(dtr) { /// Data Transmit
        data,            0,  7, u8; /// Word to shift out
    }
    0x6c, 0x0000_0000, RO, DRR(drr) { /// Data Receive
        data,            0,  7, u8; /// Oldest received word
    }
    0x70, 0xffff_ffff, RW, SSR(ssr) { /// Slave Select (active low)
        value,           0, 31, u32; /// One bit per slave
    }
    0x74, 0x0000_0000, RO, TFOR(tfor) { /// TX FIFO Occupancy
        value,           0, 31, u32; /// Words waiting in the TX FIFO
    }
    0x78, 0x0000_0000, RO, RFOR(rfor) { /// RX FIFO Occupancy
        value,           0, 31, u32; /// Words waiting in the RX FIFO
    }
}

/// Bits of CR that are backed by storage
pub const CR_MASK: u32 = 0x0000_03ff;
