//! Mock device implementations for testing
//!
//! Every mock records the writes it receives so tests can verify exactly
//! what the policy engine asked the hardware to do, and exposes setters to
//! program the telemetry the engine will read back.
//!
//! # Feature Gate
//!
//! Available during test builds and when the `mock` feature is enabled.

#![cfg(any(test, feature = "mock"))]

mod charger;
mod delay;
mod fuel_gauge;
mod wireless;

pub use charger::{ChargerWrite, MockCharger};
pub use delay::MockDelay;
pub use fuel_gauge::MockFuelGauge;
pub use wireless::{MockWirelessSource, MockWirelessTxPort, RxWrite, TxWrite};
