#[cfg(feature = "defmt")]
use defmt::Format;

use crate::Config;

/// Indicates that the controller hasn't been configured yet
///
/// The controller is still in whatever state it was in when the driver
/// took it over.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Uninitialized;

/// Indicates that the controller is enabled as a master and ready to shift
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ready {
    pub(super) config: Config,
}
