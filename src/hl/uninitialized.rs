use crate::{
    configs::ControlConfig,
    ll::{self, Bus, SOFT_RESET_KEY},
    AxiSpi, Config, Error, Ready, Uninitialized,
};

/// Highest slave index SSR has a bit for
const MAX_SLAVE: u8 = 31;

impl<BUS> AxiSpi<BUS, Uninitialized>
where
    BUS: Bus,
{
    /// Create a new instance of `AxiSpi`
    ///
    /// Requires the bus the controller's register block is reachable through.
    pub fn new(bus: BUS) -> Self {
        AxiSpi {
            ll: ll::AxiSpi::new(bus),
            state: Uninitialized,
        }
    }

    /// Initialize the controller
    ///
    /// Resets the controller, selects `config.slave` and enables it as a
    /// master with the configured clock mode and bit order. Whatever the
    /// controller was doing before is lost, both FIFOs are empty afterwards.
    pub fn init(mut self, config: Config) -> Result<AxiSpi<BUS, Ready>, Error<BUS::Error>> {
        if config.slave > MAX_SLAVE || config.fifo_depth == 0 {
            return Err(Error::InvalidConfiguration);
        }

        self.ll.srr().write(|w| w.reset(SOFT_RESET_KEY))?;

        self.ll.ssr().write(|w| w.value(!(1u32 << config.slave)))?;
        self.ll
            .cr()
            .modify(|_, w| ControlConfig::master(config.mode, config.bit_order).encode(w))?;

        log::debug!("initialized: {:?}", config);

        Ok(AxiSpi {
            ll: self.ll,
            state: Ready { config },
        })
    }
}
