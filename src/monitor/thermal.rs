//! Thermal zone classification and temperature-driven charge limits
//!
//! Each thermal source is classified independently. The battery runs the
//! full eight-zone machine; the charger IC, USB connector and wireless coil
//! each run a two-state trigger/recovery pair. Every exit toward a milder
//! state crosses its boundary by the configured hysteresis, so a value
//! sitting exactly on a boundary never produces transitions.

use crate::config::ThermalConfig;
use crate::core::events::CurrentEvent;
use crate::devices::traits::ChargeMode;
use crate::vote::{DomainId, VoteArbiter, VoterId};

/// Battery thermal zone, ordered cold to hot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermalZone {
    /// Charging stops entirely
    Cold,
    /// Deepest reduced-current swelling zone
    Cool3,
    Cool2,
    Cool1,
    Normal,
    /// Reduced current and float voltage
    Warm,
    /// Charging stops
    Overheat,
    /// Input suspended
    OverheatLimit,
}

const ZONE_ORDER: [ThermalZone; 8] = [
    ThermalZone::Cold,
    ThermalZone::Cool3,
    ThermalZone::Cool2,
    ThermalZone::Cool1,
    ThermalZone::Normal,
    ThermalZone::Warm,
    ThermalZone::Overheat,
    ThermalZone::OverheatLimit,
];

/// Index of the first hot-side boundary; boundaries below separate cold
/// zones, boundaries at or above separate hot zones
const NORMAL_INDEX: usize = 4;

impl ThermalZone {
    fn index(self) -> usize {
        match self {
            Self::Cold => 0,
            Self::Cool3 => 1,
            Self::Cool2 => 2,
            Self::Cool1 => 3,
            Self::Normal => 4,
            Self::Warm => 5,
            Self::Overheat => 6,
            Self::OverheatLimit => 7,
        }
    }

    /// True when charging must stop in this zone
    pub fn blocks_charging(self) -> bool {
        matches!(self, Self::Cold | Self::Overheat | Self::OverheatLimit)
    }

    /// True for the reduced-current low-temperature zones
    pub fn is_cool(self) -> bool {
        matches!(self, Self::Cool1 | Self::Cool2 | Self::Cool3)
    }
}

/// Telemetry consumed by one thermal evaluation
#[derive(Debug, Clone, Copy)]
pub struct ThermalInputs {
    /// Battery temperature, tenths C (already blended when prediction is active)
    pub battery_temp: i32,
    /// USB connector temperature, tenths C
    pub usb_temp: i32,
    /// Charger IC temperature, tenths C
    pub charger_temp: i32,
    /// Wireless coil temperature, tenths C
    pub coil_temp: i32,
    /// Battery voltage, mV
    pub battery_voltage_mv: i32,
    /// True while the wireless path carries the power
    pub wireless_active: bool,
}

/// Result of one thermal evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalDecision {
    pub zone: ThermalZone,
    pub zone_changed: bool,
    /// Zone or warm-swelling voltage gate is holding charging off
    pub charging_blocked: bool,
}

/// Per-source thermal state with hysteresis
#[derive(Debug)]
pub struct ThermalMonitor {
    zone: ThermalZone,
    chg_limited: bool,
    coil_limited: bool,
    mix_limited: bool,
    usb_suspended: bool,
    /// Warm zone with the battery above the swelling float voltage;
    /// charging stays off until voltage falls to the swelling recharge level
    warm_suspended: bool,
}

impl ThermalMonitor {
    pub const fn new() -> Self {
        Self {
            zone: ThermalZone::Normal,
            chg_limited: false,
            coil_limited: false,
            mix_limited: false,
            usb_suspended: false,
            warm_suspended: false,
        }
    }

    pub fn zone(&self) -> ThermalZone {
        self.zone
    }

    /// Forgets the per-path limit flags. Called when power moves between
    /// the wired and wireless paths; the heat history belongs to the old
    /// path. The battery zone is physical and survives.
    pub fn clear_limits(&mut self) {
        self.chg_limited = false;
        self.coil_limited = false;
        self.mix_limited = false;
    }

    /// Classifies every source, recasts the thermal votes and maintains the
    /// thermal bits in `events`.
    pub fn evaluate(
        &mut self,
        inputs: &ThermalInputs,
        config: &ThermalConfig,
        arbiter: &mut VoteArbiter,
        events: &mut CurrentEvent,
    ) -> ThermalDecision {
        let previous_zone = self.zone;
        self.zone = self.classify_battery(inputs.battery_temp, config);
        let zone_changed = self.zone != previous_zone;
        if zone_changed {
            crate::log_info!("battery thermal zone {:?} -> {:?}", previous_zone, self.zone);
        }

        self.update_limit_flags(inputs, config);
        self.update_warm_suspend(inputs, config);
        self.cast_votes(config, arbiter);
        self.update_events(events);

        ThermalDecision {
            zone: self.zone,
            zone_changed,
            charging_blocked: self.zone.blocks_charging() || self.warm_suspended,
        }
    }

    /// Zone transition with per-boundary hysteresis.
    ///
    /// Entering a more extreme zone happens at the plain boundary. Leaving
    /// one toward Normal requires crossing the boundary by the hysteresis,
    /// from either side.
    fn classify_battery(&self, temp: i32, config: &ThermalConfig) -> ThermalZone {
        let bounds = [
            config.cold_threshold,
            config.cool3_threshold,
            config.cool2_threshold,
            config.cool1_threshold,
            config.warm_threshold,
            config.overheat_threshold,
            config.overheat_limit_threshold,
        ];
        let hysteresis = config.zone_hysteresis;
        let mut index = self.zone.index();

        loop {
            // Boundary `index` separates zone `index` from `index + 1`
            if index < bounds.len() {
                let exit_at = if index < NORMAL_INDEX {
                    bounds[index] + hysteresis
                } else {
                    bounds[index]
                };
                if temp > exit_at {
                    index += 1;
                    continue;
                }
            }
            if index > 0 {
                let exit_at = if index - 1 >= NORMAL_INDEX {
                    bounds[index - 1] - hysteresis
                } else {
                    bounds[index - 1]
                };
                if temp <= exit_at {
                    index -= 1;
                    continue;
                }
            }
            break;
        }

        ZONE_ORDER[index]
    }

    fn update_limit_flags(&mut self, inputs: &ThermalInputs, config: &ThermalConfig) {
        if self.chg_limited {
            if inputs.charger_temp <= config.chg_recovery_temp {
                self.chg_limited = false;
                crate::log_info!("charger thermal limit released");
            }
        } else if inputs.charger_temp >= config.chg_high_temp {
            self.chg_limited = true;
            crate::log_warn!("charger thermal limit active");
        }

        if self.coil_limited {
            if !inputs.wireless_active || inputs.coil_temp <= config.wpc_recovery_temp {
                self.coil_limited = false;
            }
        } else if inputs.wireless_active && inputs.coil_temp >= config.wpc_high_temp {
            self.coil_limited = true;
            crate::log_warn!("wireless coil thermal limit active");
        }

        if self.mix_limited {
            if inputs.battery_temp <= config.mix_recovery_batt_temp {
                self.mix_limited = false;
            }
        } else if inputs.battery_temp >= config.mix_high_batt_temp
            && inputs.charger_temp >= config.mix_high_chg_temp
        {
            self.mix_limited = true;
            crate::log_warn!("mixed thermal limit active");
        }

        if self.usb_suspended {
            if inputs.usb_temp <= config.usb_recovery_temp {
                self.usb_suspended = false;
                crate::log_info!("usb connector cooled, input resumed");
            }
        } else if inputs.usb_temp >= config.usb_suspend_temp {
            self.usb_suspended = true;
            crate::log_error!("usb connector overheated, suspending input");
        }
    }

    fn update_warm_suspend(&mut self, inputs: &ThermalInputs, config: &ThermalConfig) {
        if self.zone != ThermalZone::Warm {
            self.warm_suspended = false;
            return;
        }
        if self.warm_suspended {
            if inputs.battery_voltage_mv <= config.swelling_recharge_voltage_mv {
                self.warm_suspended = false;
            }
        } else if inputs.battery_voltage_mv >= config.swelling_float_voltage_mv {
            self.warm_suspended = true;
        }
    }

    fn cast_votes(&self, config: &ThermalConfig, arbiter: &mut VoteArbiter) {
        // Swelling voter carries every battery-zone consequence
        let (swelling_fcc, swelling_fv) = match self.zone {
            ThermalZone::Cool1 => (Some(config.cool1_fcc_ma), true),
            ThermalZone::Cool2 => (Some(config.cool2_fcc_ma), true),
            ThermalZone::Cool3 => (Some(config.cool3_fcc_ma), true),
            ThermalZone::Warm => (Some(config.warm_fcc_ma), true),
            _ => (None, false),
        };
        arbiter.cast(
            DomainId::Fcc,
            VoterId::Swelling,
            swelling_fcc.is_some(),
            swelling_fcc.unwrap_or(0),
        );
        arbiter.cast(
            DomainId::FloatVoltage,
            VoterId::Swelling,
            swelling_fv,
            config.swelling_float_voltage_mv,
        );
        arbiter.cast_enable(
            VoterId::Swelling,
            self.zone.blocks_charging() || self.warm_suspended,
            ChargeMode::ChargingOff,
        );

        arbiter.cast(
            DomainId::Fcc,
            VoterId::ChgThermal,
            self.chg_limited,
            config.chg_limit_fcc_ma,
        );
        // A hot charger IC on an HV contract also backs the input down to 5 V
        arbiter.cast(
            DomainId::InputVoltage,
            VoterId::ChgThermal,
            self.chg_limited,
            5000,
        );
        arbiter.cast(
            DomainId::Icl,
            VoterId::ChgThermal,
            self.coil_limited,
            config.wpc_icl_ma,
        );

        arbiter.cast(
            DomainId::Icl,
            VoterId::MixThermal,
            self.mix_limited,
            config.mix_icl_ma,
        );

        arbiter.cast_enable(VoterId::UsbThermal, self.usb_suspended, ChargeMode::BuckOff);
    }

    fn update_events(&self, events: &mut CurrentEvent) {
        events.set(
            CurrentEvent::CHG_LIMIT,
            self.chg_limited || self.coil_limited,
        );
        events.set(CurrentEvent::MIX_LIMIT, self.mix_limited);
        events.set(CurrentEvent::USB_SUSPENDED, self.usb_suspended);
        events.set(CurrentEvent::SWELLING_COOL, self.zone.is_cool());
        events.set(
            CurrentEvent::SWELLING_WARM,
            self.zone == ThermalZone::Warm,
        );
    }
}

impl Default for ThermalMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(battery_temp: i32) -> ThermalInputs {
        ThermalInputs {
            battery_temp,
            usb_temp: 250,
            charger_temp: 250,
            coil_temp: 250,
            battery_voltage_mv: 3900,
            wireless_active: false,
        }
    }

    fn run(monitor: &mut ThermalMonitor, battery_temp: i32) -> ThermalDecision {
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();
        monitor.evaluate(&inputs(battery_temp), &config, &mut arbiter, &mut events)
    }

    #[test]
    fn test_zone_classification_from_normal() {
        let mut monitor = ThermalMonitor::new();
        assert_eq!(run(&mut monitor, 250).zone, ThermalZone::Normal);
        assert_eq!(run(&mut monitor, 460).zone, ThermalZone::Warm);
        assert_eq!(run(&mut monitor, 510).zone, ThermalZone::Overheat);
        assert_eq!(run(&mut monitor, 710).zone, ThermalZone::OverheatLimit);
        assert_eq!(run(&mut monitor, 250).zone, ThermalZone::Normal);
        assert_eq!(run(&mut monitor, 180).zone, ThermalZone::Cool1);
        assert_eq!(run(&mut monitor, 120).zone, ThermalZone::Cool2);
        assert_eq!(run(&mut monitor, 50).zone, ThermalZone::Cool3);
        assert_eq!(run(&mut monitor, -10).zone, ThermalZone::Cold);
    }

    #[test]
    fn test_no_chatter_at_exact_boundary() {
        let mut monitor = ThermalMonitor::new();
        let mut transitions = 0;
        let mut previous = monitor.zone();

        // Oscillate around the warm boundary without clearing the hysteresis
        for temp in [449, 450, 451, 450, 451, 449, 451, 450] {
            let decision = run(&mut monitor, temp);
            if decision.zone != previous {
                transitions += 1;
                previous = decision.zone;
            }
        }
        // One crossing up, never back down
        assert_eq!(transitions, 1);
        assert_eq!(monitor.zone(), ThermalZone::Warm);

        // Clearing the hysteresis brings it back exactly once
        assert_eq!(run(&mut monitor, 430).zone, ThermalZone::Normal);
    }

    #[test]
    fn test_cool_exit_needs_hysteresis() {
        let mut monitor = ThermalMonitor::new();
        assert_eq!(run(&mut monitor, 190).zone, ThermalZone::Cool1);
        // Boundary is 200, exit needs 220
        assert_eq!(run(&mut monitor, 210).zone, ThermalZone::Cool1);
        assert_eq!(run(&mut monitor, 221).zone, ThermalZone::Normal);
    }

    #[test]
    fn test_cool_zones_cap_current_and_float_voltage() {
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();
        let mut monitor = ThermalMonitor::new();

        monitor.evaluate(&inputs(120), &config, &mut arbiter, &mut events);
        assert_eq!(monitor.zone(), ThermalZone::Cool2);

        let fcc = arbiter.resolve(DomainId::Fcc).map(|r| (r.voter, r.value));
        assert_eq!(fcc, Some((VoterId::Fallback, 100)));
        // With the fallback floor out of the way the swelling cap shows
        arbiter.cast(DomainId::Fcc, VoterId::Fallback, false, 0);
        arbiter.cast(DomainId::Fcc, VoterId::Cable, true, 2100);
        let fcc = arbiter.resolve(DomainId::Fcc).map(|r| (r.voter, r.value));
        assert_eq!(fcc, Some((VoterId::Swelling, 900)));

        let fv = arbiter
            .resolve(DomainId::FloatVoltage)
            .map(|r| (r.voter, r.value));
        assert_eq!(fv, Some((VoterId::Swelling, 4150)));
        assert!(events.contains(CurrentEvent::SWELLING_COOL));
    }

    #[test]
    fn test_cold_blocks_charging() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();

        let decision = monitor.evaluate(&inputs(-20), &config, &mut arbiter, &mut events);
        assert!(decision.charging_blocked);
        assert_eq!(
            arbiter.resolve_enable(),
            Some((VoterId::Swelling, ChargeMode::ChargingOff))
        );
    }

    #[test]
    fn test_warm_voltage_gate_suspends_and_recovers() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();

        let mut warm = inputs(470);
        warm.battery_voltage_mv = 4200;
        let decision = monitor.evaluate(&warm, &config, &mut arbiter, &mut events);
        assert_eq!(decision.zone, ThermalZone::Warm);
        assert!(decision.charging_blocked);
        assert!(events.contains(CurrentEvent::SWELLING_WARM));

        // Above the recharge threshold the gate holds
        warm.battery_voltage_mv = 4050;
        assert!(monitor
            .evaluate(&warm, &config, &mut arbiter, &mut events)
            .charging_blocked);

        warm.battery_voltage_mv = 3990;
        let decision = monitor.evaluate(&warm, &config, &mut arbiter, &mut events);
        assert!(!decision.charging_blocked);
        assert_eq!(
            arbiter.resolve_enable(),
            Some((VoterId::Cable, ChargeMode::ChargingOff))
        );
    }

    #[test]
    fn test_charger_limit_trigger_and_recovery() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();
        arbiter.cast(DomainId::Fcc, VoterId::Fallback, false, 0);
        arbiter.cast(DomainId::Fcc, VoterId::Cable, true, 2750);
        arbiter.cast(DomainId::InputVoltage, VoterId::Cable, true, 9000);

        let mut hot = inputs(300);
        hot.charger_temp = 560;
        monitor.evaluate(&hot, &config, &mut arbiter, &mut events);
        assert!(events.contains(CurrentEvent::CHG_LIMIT));
        assert_eq!(
            arbiter.resolve(DomainId::Fcc).map(|r| r.value),
            Some(1400)
        );
        assert_eq!(
            arbiter.resolve(DomainId::InputVoltage).map(|r| r.value),
            Some(5000)
        );

        // Recovery threshold is 500, inclusive
        hot.charger_temp = 520;
        monitor.evaluate(&hot, &config, &mut arbiter, &mut events);
        assert!(events.contains(CurrentEvent::CHG_LIMIT));

        hot.charger_temp = 490;
        monitor.evaluate(&hot, &config, &mut arbiter, &mut events);
        assert!(!events.contains(CurrentEvent::CHG_LIMIT));
        assert_eq!(
            arbiter.resolve(DomainId::Fcc).map(|r| r.value),
            Some(2750)
        );
    }

    #[test]
    fn test_mix_limit_needs_both_sensors() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();

        let mut warm_batt = inputs(430);
        warm_batt.charger_temp = 400;
        monitor.evaluate(&warm_batt, &config, &mut arbiter, &mut events);
        assert!(!events.contains(CurrentEvent::MIX_LIMIT));

        warm_batt.charger_temp = 510;
        monitor.evaluate(&warm_batt, &config, &mut arbiter, &mut events);
        assert!(events.contains(CurrentEvent::MIX_LIMIT));

        // Releases on battery temperature alone
        warm_batt.battery_temp = 380;
        monitor.evaluate(&warm_batt, &config, &mut arbiter, &mut events);
        assert!(!events.contains(CurrentEvent::MIX_LIMIT));
    }

    #[test]
    fn test_usb_overheat_suspends_input() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();

        let mut hot_usb = inputs(300);
        hot_usb.usb_temp = 710;
        monitor.evaluate(&hot_usb, &config, &mut arbiter, &mut events);
        assert!(events.contains(CurrentEvent::USB_SUSPENDED));
        assert_eq!(
            arbiter.resolve_enable(),
            Some((VoterId::UsbThermal, ChargeMode::BuckOff))
        );

        hot_usb.usb_temp = 640;
        monitor.evaluate(&hot_usb, &config, &mut arbiter, &mut events);
        assert!(!events.contains(CurrentEvent::USB_SUSPENDED));
    }

    #[test]
    fn test_coil_limit_only_while_wireless_active() {
        let mut monitor = ThermalMonitor::new();
        let config = ThermalConfig::default();
        let mut arbiter = VoteArbiter::new(100);
        let mut events = CurrentEvent::default();

        let mut hot_coil = inputs(300);
        hot_coil.coil_temp = 620;
        monitor.evaluate(&hot_coil, &config, &mut arbiter, &mut events);
        assert!(!events.contains(CurrentEvent::CHG_LIMIT));

        hot_coil.wireless_active = true;
        monitor.evaluate(&hot_coil, &config, &mut arbiter, &mut events);
        assert!(events.contains(CurrentEvent::CHG_LIMIT));
        assert_eq!(arbiter.resolve(DomainId::Icl).map(|r| r.value), Some(100));
        arbiter.cast(DomainId::Icl, VoterId::Fallback, false, 0);
        assert_eq!(arbiter.resolve(DomainId::Icl).map(|r| r.value), Some(600));
    }
}
