//! Fuel gauge interface
//!
//! Sign convention: positive current flows into the battery (charging),
//! negative flows out (discharging). Temperatures are in tenths of a
//! degree C, the gauge's native thermistor resolution.

use super::Result;

/// Device-independent fuel gauge interface
#[allow(async_fn_in_trait)]
pub trait FuelGauge {
    /// Instantaneous cell voltage in mV
    async fn voltage_now_mv(&mut self) -> Result<i32>;

    /// Averaged cell voltage in mV
    async fn voltage_avg_mv(&mut self) -> Result<i32>;

    /// Open-circuit voltage estimate in mV
    async fn voltage_ocv_mv(&mut self) -> Result<i32>;

    /// Instantaneous current in mA
    async fn current_now_ma(&mut self) -> Result<i32>;

    /// Averaged current in mA
    async fn current_avg_ma(&mut self) -> Result<i32>;

    /// State of charge in percent
    async fn capacity_percent(&mut self) -> Result<u8>;

    /// Battery pack temperature
    async fn temperature(&mut self) -> Result<i32>;

    /// USB connector thermistor
    async fn usb_temperature(&mut self) -> Result<i32>;

    /// Secondary pack thermistor (folding devices), if fitted
    async fn sub_temperature(&mut self) -> Result<i32>;

    /// Accumulated charge cycle count
    async fn cycle_count(&mut self) -> Result<u16>;

    /// Gauge-side charge-full marker
    async fn is_charge_full(&mut self) -> Result<bool>;

    /// Clear the charge-full marker after a new session starts
    async fn reset_charge_full(&mut self) -> Result<()>;
}
