//! Charger IC interface

use super::Result;

/// What the charger power stage is asked to do.
///
/// `ChargingOff` keeps the input path (buck) alive so the system still runs
/// from the adapter; `BuckOff` cuts the input path entirely, which is what
/// OTG and hard safety stops require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeMode {
    /// Battery charging enabled
    Charging,
    /// Charging stopped, input buck still on
    ChargingOff,
    /// Input path fully disabled
    BuckOff,
}

/// Electrical condition reported by the charger IC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerHealth {
    Good,
    /// Input above the OVP threshold
    OverVoltage,
    /// Input collapsed below UVLO
    UnderVoltage,
    /// Charger watchdog bit set, register state untrusted
    WatchdogExpired,
}

/// Direct-charging (switched-cap) engine state, meaningful under APDO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectChargeStatus {
    Off,
    /// Adjusting the APDO request before the bypass engages
    Preparing,
    Charging,
    Done,
}

/// Device-independent charger interface.
///
/// Setters are only invoked from the vote apply path, so implementations
/// see at most one writer.
#[allow(async_fn_in_trait)]
pub trait Charger {
    /// Program the input current limit in mA
    async fn set_input_current_ma(&mut self, ma: i32) -> Result<()>;

    /// Program the fast-charge (constant current) limit in mA
    async fn set_fast_charging_current_ma(&mut self, ma: i32) -> Result<()>;

    /// Program the float (constant voltage) setpoint in mV
    async fn set_float_voltage_mv(&mut self, mv: i32) -> Result<()>;

    /// Program the requested input voltage in mV (AFC/PD negotiation target)
    async fn set_input_voltage_mv(&mut self, mv: i32) -> Result<()>;

    /// Program the termination (topoff) current in mA
    async fn set_topoff_current_ma(&mut self, ma: i32) -> Result<()>;

    /// Switch the power stage mode
    async fn set_charge_mode(&mut self, mode: ChargeMode) -> Result<()>;

    /// True when the charger reports charge termination itself
    async fn is_charging_done(&mut self) -> Result<bool>;

    /// Electrical health as measured at the input
    async fn health(&mut self) -> Result<ChargerHealth>;

    /// Die or board thermistor temperature in tenths of a degree C
    async fn temperature(&mut self) -> Result<i32>;

    /// Direct-charging engine state
    async fn direct_charge_status(&mut self) -> Result<DirectChargeStatus>;
}
