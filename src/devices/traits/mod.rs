//! Collaborator device interfaces
//!
//! The policy engine never talks to a bus directly; it drives these traits.
//! Implementations own their transport and timeout behavior, so every method
//! resolves in bounded time with `Result` rather than blocking indefinitely.

pub mod charger;
pub mod delay;
pub mod fuel_gauge;
pub mod wireless;

pub use charger::{ChargeMode, Charger, ChargerHealth, DirectChargeStatus};
pub use delay::Delay;
pub use fuel_gauge::FuelGauge;
pub use wireless::{PowerPath, WirelessSource, WirelessTxPort};

#[cfg(feature = "embassy")]
pub use delay::EmbassyDelay;

/// Device communication failures.
///
/// Transient by definition: the supervisor retries on its next tick and
/// keeps the previous applied values in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// Bus transfer failed
    Bus,
    /// Device did not answer in time
    Timeout,
    /// Device is powered down or mid-reset
    NotReady,
    /// Requested value outside the device's range
    InvalidValue,
    /// Operation not available on this part
    Unsupported,
}

/// Shorthand for device call results
pub type Result<T> = core::result::Result<T, DeviceError>;
