//! Model and driver for an AXI4-Lite SPI master controller
//!
//! The crate has two halves that meet at the register block:
//!
//! - The [controller model] is a clock-driven rendition of the controller: a
//!   register file behind an AXI4-Lite slave port, transmit and receive
//!   FIFOs, and a shift engine that clocks 8-bit words out on MOSI and in on
//!   MISO.
//! - The [high-level interface] drives any controller that is reachable
//!   through the [register-level interface], the model included, and exposes
//!   it as an [`embedded-hal`] SPI bus.
//!
//! [controller model]: device/index.html
//! [high-level interface]: hl/index.html
//! [register-level interface]: ll/index.html
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod axi;
pub mod configs;
pub mod device;
pub mod hl;
pub mod interrupt;
pub mod ll;
pub mod status;

/// Redirection of nb::block
pub mod block {
    pub use nb::block;
}

pub use crate::{
    block::block,
    configs::{BitOrder, Config, ControlConfig, Timing},
    device::{Controller, Floating, Loopback, Peer, Target},
    hl::{AxiSpi, Error, Ready, Uninitialized},
    interrupt::Interrupt,
};
