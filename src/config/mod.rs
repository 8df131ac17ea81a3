//! Charging policy configuration
//!
//! Every tuning constant lives here, including the settle and debounce
//! delays that tend to get hard-coded next to the device writes they pace.
//! `ChargeConfig::validate` runs once at startup; a rejected configuration
//! never reaches the supervisor.

pub mod cable;
pub mod safety;
pub mod siop;
pub mod thermal;
pub mod tx;

pub use cable::{CableEntry, CableTable};
pub use safety::{AgeStep, FullCheckPolicy, RechargeCheck, SafetyConfig};
pub use siop::{SiopEntry, SiopTable};
pub use thermal::ThermalConfig;
pub use tx::TxConfig;

/// Configuration rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Cable table has a zero or negative current on a charging source
    CableTable,
    /// Thermal boundaries not ascending, or hysteresis/limit values inconsistent
    ThermalTable,
    /// Full/recharge/aging/store settings inconsistent
    SafetyTable,
    /// SIOP rows unordered or carrying non-positive currents
    SiopTable,
    /// TX voltage window, frequency band or retry budget inconsistent
    TxSettings,
    /// Poll intervals or debounce windows are zero
    Intervals,
}

/// Top-level configuration for the charging policy engine
#[derive(Debug, Clone)]
pub struct ChargeConfig {
    /// Per-cable input and fast-charge currents
    pub cable: CableTable,

    /// Thermal zones and temperature-driven limits
    pub thermal: ThermalConfig,

    /// Full detection, recharge, safety timer, aging, store mode
    pub safety: SafetyConfig,

    /// System thermal throttle table
    pub siop: SiopTable,

    /// Wireless TX loop settings
    pub tx: TxConfig,

    /// Float voltage before aging or swelling adjustments (default: 4350 mV)
    pub float_voltage_mv: i32,

    /// Input current the fallback voter holds at all times (default: 100 mA)
    pub fallback_input_ma: i32,

    /// Input voltage for 5 V class sources (default: 5000 mV)
    pub input_voltage_5v_mv: i32,

    /// Input voltage for 9 V class sources (default: 9000 mV)
    pub input_voltage_9v_mv: i32,

    /// Input voltage for 12 V class sources (default: 12000 mV)
    pub input_voltage_12v_mv: i32,

    /// Steady-state poll interval (default: 30 s)
    pub poll_interval_s: u32,

    /// Poll interval while actively charging (default: 10 s)
    pub poll_interval_charging_s: u32,

    /// Poll interval during a live fault window (default: 1 s)
    pub poll_interval_fault_s: u32,

    /// Poll interval while APDO negotiation or wireless TX is active (default: 3 s)
    pub poll_interval_busy_s: u32,

    /// A tick this soon after the previous one is skipped when nothing
    /// changed and no events are queued (default: 10 s)
    pub skip_window_ms: u64,

    /// Settle delay inside the wireless-to-wired power path switch (default: 100 ms)
    pub path_switch_settle_ms: u64,

    /// Fast-charge current pinned while the power path switches (default: 400 mA)
    pub path_switch_fcc_ma: i32,

    /// Operating voltage assumed for 5 V class wireless receivers (default: 5500 mV)
    pub wireless_vout_mv: i32,

    /// Operating voltage assumed for EPP receivers after authentication
    /// (default: 10000 mV)
    pub wireless_hv_vout_mv: i32,

    /// Design capacity used for the time-to-full estimate (default: 4000 mAh)
    pub battery_capacity_mah: i32,
}

impl ChargeConfig {
    /// Checks every table for internal consistency.
    ///
    /// # Returns
    ///
    /// The first inconsistency found, or `Ok` when the configuration is safe
    /// to hand to the supervisor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cable.validate() {
            return Err(ConfigError::CableTable);
        }
        if !self.thermal.validate() {
            return Err(ConfigError::ThermalTable);
        }
        if !self.safety.validate() {
            return Err(ConfigError::SafetyTable);
        }
        if !self.siop.validate() {
            return Err(ConfigError::SiopTable);
        }
        if !self.tx.validate() {
            return Err(ConfigError::TxSettings);
        }
        if self.poll_interval_s == 0
            || self.poll_interval_charging_s == 0
            || self.poll_interval_fault_s == 0
            || self.poll_interval_busy_s == 0
            || self.float_voltage_mv <= 0
            || self.fallback_input_ma <= 0
            || self.path_switch_fcc_ma <= 0
            || self.wireless_vout_mv <= 0
            || self.wireless_hv_vout_mv < self.wireless_vout_mv
            || self.battery_capacity_mah <= 0
        {
            return Err(ConfigError::Intervals);
        }
        Ok(())
    }

    /// Declared operating point for a wireless receiver class, used when an
    /// attachment is re-announced locally (authentication upgrade) rather
    /// than by the receiver chip.
    pub fn wireless_operating_point(&self, kind: crate::cable::types::WirelessKind) -> (i32, i32) {
        use crate::cable::types::WirelessKind;
        let vout_mv = match kind {
            WirelessKind::Epp => self.wireless_hv_vout_mv,
            _ => self.wireless_vout_mv,
        };
        let max_current_ma = self.cable.entry(kind.cable_type()).input_current_ma;
        (vout_mv, max_current_ma)
    }
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            cable: CableTable::default(),
            thermal: ThermalConfig::default(),
            safety: SafetyConfig::default(),
            siop: SiopTable::default(),
            tx: TxConfig::default(),
            float_voltage_mv: 4350,
            fallback_input_ma: 100,
            input_voltage_5v_mv: 5000,
            input_voltage_9v_mv: 9000,
            input_voltage_12v_mv: 12_000,
            poll_interval_s: 30,
            poll_interval_charging_s: 10,
            poll_interval_fault_s: 1,
            poll_interval_busy_s: 3,
            skip_window_ms: 10_000,
            path_switch_settle_ms: 100,
            path_switch_fcc_ma: 400,
            wireless_vout_mv: 5500,
            wireless_hv_vout_mv: 10_000,
            battery_capacity_mah: 4000,
        }
    }
}
