//! Battery state types and the published snapshot

use crate::cable::types::CableType;
use crate::core::events::{CurrentEvent, MiscEvent, TxEvent};
use crate::monitor::ThermalZone;
use crate::tx::AovState;

/// Reported charging status, mirroring the standard battery device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeStatus {
    /// No source, or the source cannot charge
    Discharging,
    /// Actively charging
    Charging,
    /// Source present but charging held off by a fault or policy
    NotCharging,
    /// First full reached; topoff may still be running underneath
    Full,
}

/// Reported battery health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryHealth {
    Good,
    Overheat,
    Cold,
    OverVoltage,
    UnderVoltage,
    WatchdogExpire,
    SafetyTimerExpire,
    NoBattery,
}

/// Charge stage within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargingMode {
    /// Not charging
    None,
    /// Source attached, first evaluated tick pending
    Checking,
    /// Main constant-current / constant-voltage stage
    First,
    /// Topoff stage after the first full
    Second,
    /// Re-entered charging from Full
    Recharging,
}

impl ChargingMode {
    /// True for the stages that accumulate charge
    pub fn is_active(self) -> bool {
        matches!(self, Self::First | Self::Second | Self::Recharging)
    }
}

/// Charge speed class derived from the active cable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeType {
    None,
    /// 5 V low-current (USB enumeration class)
    Slow,
    /// 5 V dedicated charger class
    Fast,
    /// High-voltage wired or wireless contract
    HvFast,
    /// Programmable PD contract, direct charging
    Direct,
}

impl ChargeType {
    pub fn from_cable(cable: CableType, apdo: bool) -> Self {
        if apdo {
            return Self::Direct;
        }
        match cable {
            CableType::None | CableType::Otg | CableType::WirelessFake => Self::None,
            CableType::Usb | CableType::Timeout | CableType::Unknown => Self::Slow,
            CableType::HvTa | CableType::HvTa12v | CableType::Pd | CableType::PdApdo => {
                Self::HvFast
            }
            CableType::WirelessHv => Self::HvFast,
            _ => Self::Fast,
        }
    }
}

/// Published battery state, refreshed at the end of every supervisor tick
#[derive(Debug, Clone, Copy)]
pub struct BatterySnapshot {
    pub status: ChargeStatus,
    pub health: BatteryHealth,
    pub cable: CableType,
    pub charge_type: ChargeType,
    pub charging_mode: ChargingMode,
    pub battery_present: bool,
    pub soc: u8,
    pub voltage_mv: i32,
    pub avg_voltage_mv: i32,
    pub current_ma: i32,
    pub avg_current_ma: i32,
    /// Effective battery temperature, prediction-substituted when active
    pub temperature: i32,
    /// Unsubstituted thermistor reading
    pub raw_temperature: i32,
    pub thermal_zone: ThermalZone,
    pub cycle_count: u16,
    /// Estimated seconds until full while charging
    pub time_to_full_s: Option<u32>,
    /// Highest source power seen on the current path
    pub max_charge_power_mw: i32,
    pub safety_remaining_ms: u64,
    pub siop_level: u8,
    pub current_events: CurrentEvent,
    pub misc_events: MiscEvent,
    /// Written by the TX controller, preserved across supervisor publishes
    pub tx_events: TxEvent,
    /// Written by the TX controller, preserved across supervisor publishes
    pub aov_state: AovState,
}

impl Default for BatterySnapshot {
    fn default() -> Self {
        Self {
            status: ChargeStatus::Discharging,
            health: BatteryHealth::Good,
            cable: CableType::None,
            charge_type: ChargeType::None,
            charging_mode: ChargingMode::None,
            battery_present: true,
            soc: 0,
            voltage_mv: 0,
            avg_voltage_mv: 0,
            current_ma: 0,
            avg_current_ma: 0,
            temperature: 0,
            raw_temperature: 0,
            thermal_zone: ThermalZone::Normal,
            cycle_count: 0,
            time_to_full_s: None,
            max_charge_power_mw: 0,
            safety_remaining_ms: 0,
            siop_level: 100,
            current_events: CurrentEvent::empty(),
            misc_events: MiscEvent::empty(),
            tx_events: TxEvent::empty(),
            aov_state: AovState::None,
        }
    }
}
