//! High-level interface to the AXI SPI controller
//!
//! The entry point to this API is the [AxiSpi] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a high-level interface to the controller. This is
//! the recommended way to access it using this crate, unless you need the
//! greater flexibility provided by the [register-level interface].
//!
//! [register-level interface]: ../ll/index.html

use core::fmt;

pub use bus::*;
pub use error::*;
pub use state_impls::*;

use crate::ll;

mod bus;
mod error;
mod ready;
mod state_impls;
mod uninitialized;

/// Entry point to the AXI SPI driver API
///
/// Starts out [`Uninitialized`], [`AxiSpi::init`] moves it to [`Ready`], where
/// it implements [`embedded_hal::spi::SpiBus`].
#[derive(Copy, Clone)]
pub struct AxiSpi<BUS, State> {
    ll: ll::AxiSpi<BUS>,
    state: State,
}

// Can't be derived without putting requirements on `BUS`.
impl<BUS, State> fmt::Debug for AxiSpi<BUS, State>
where
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AxiSpi {{ state: ")?;
        self.state.fmt(f)?;
        write!(f, ", .. }}")?;

        Ok(())
    }
}
