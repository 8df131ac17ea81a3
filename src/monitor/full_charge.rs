//! Full-charge and recharge detection
//!
//! Full detection is debounced: the configured policy must hold on
//! `full_check_count` consecutive samples. The first full moves charging
//! into the topoff stage; the second, detected against the lower taper
//! threshold, terminates the session. Recharge re-enters charging from Full
//! once the chosen measurement falls below its threshold.

use crate::config::{FullCheckPolicy, RechargeCheck, SafetyConfig};

/// Which full condition is being tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullStage {
    /// First full, ends the constant-voltage stage
    First,
    /// Second full at the topoff taper, terminates charging
    Second,
}

/// Telemetry consumed by full and recharge checks.
///
/// `condition_soc` / `condition_mv` are the age-adjusted first-full gates
/// resolved by the caller from the active aging step.
#[derive(Debug, Clone, Copy)]
pub struct FullChargeInputs {
    pub soc: u8,
    pub voltage_mv: i32,
    pub avg_voltage_mv: i32,
    pub current_ma: i32,
    pub avg_current_ma: i32,
    /// Charger chip reports terminal status
    pub charger_reports_done: bool,
    /// Fuel gauge reports its own full marker
    pub gauge_reports_full: bool,
    pub condition_soc: u8,
    pub condition_mv: i32,
}

/// Debounced full-charge detector
#[derive(Debug, Default)]
pub struct FullChargeDetector {
    full_count: u8,
    charging_since_ms: Option<u64>,
}

impl FullChargeDetector {
    pub const fn new() -> Self {
        Self {
            full_count: 0,
            charging_since_ms: None,
        }
    }

    /// Marks the start of a charge stage. Resets the debounce counter and
    /// the reference point for the time-based policy.
    pub fn note_charging_started(&mut self, now_ms: u64) {
        self.full_count = 0;
        self.charging_since_ms = Some(now_ms);
    }

    /// Forgets the session. Called on detach.
    pub fn reset(&mut self) {
        self.full_count = 0;
        self.charging_since_ms = None;
    }

    /// Current debounce progress, for the snapshot surface
    pub fn full_count(&self) -> u8 {
        self.full_count
    }

    /// Feeds one sample.
    ///
    /// # Returns
    ///
    /// True once the policy has held for `full_check_count` consecutive
    /// samples; the counter restarts so the same detector then debounces
    /// the next stage.
    pub fn check_full(
        &mut self,
        stage: FullStage,
        inputs: &FullChargeInputs,
        config: &SafetyConfig,
        now_ms: u64,
    ) -> bool {
        let triggered = match config.full_check_policy {
            FullCheckPolicy::CurrentTaper | FullCheckPolicy::AdcCount => {
                self.taper_reached(stage, inputs, config)
            }
            FullCheckPolicy::Time => {
                let elapsed_s = self
                    .charging_since_ms
                    .map(|since| now_ms.saturating_sub(since) / 1000)
                    .unwrap_or(0);
                elapsed_s >= u64::from(config.full_check_time_s)
                    && inputs.soc >= inputs.condition_soc
            }
            FullCheckPolicy::Soc => inputs.soc >= inputs.condition_soc,
            FullCheckPolicy::ChargerStatus => {
                inputs.charger_reports_done && inputs.soc >= inputs.condition_soc
            }
        };

        if triggered {
            self.full_count += 1;
        } else {
            self.full_count = 0;
        }

        if self.full_count >= config.full_check_count {
            self.full_count = 0;
            crate::log_info!("full condition met at stage {:?}", stage);
            return true;
        }
        false
    }

    /// Taper condition: still charging, with both instantaneous and average
    /// current at or under the stage threshold, and the first-full gates
    /// satisfied.
    fn taper_reached(
        &self,
        stage: FullStage,
        inputs: &FullChargeInputs,
        config: &SafetyConfig,
    ) -> bool {
        let taper_ma = match stage {
            FullStage::First => config.full_current_1st_ma,
            FullStage::Second => config.full_current_2nd_ma,
        };
        let tapered = inputs.current_ma > 0
            && inputs.current_ma <= taper_ma
            && inputs.avg_current_ma <= taper_ma;
        let gauge_ok = match config.full_check_policy {
            FullCheckPolicy::AdcCount => inputs.gauge_reports_full,
            _ => true,
        };
        let gated = match stage {
            FullStage::First => {
                inputs.soc >= inputs.condition_soc && inputs.voltage_mv >= inputs.condition_mv
            }
            FullStage::Second => inputs.voltage_mv >= inputs.condition_mv,
        };
        tapered && gauge_ok && gated
    }
}

/// Recharge trigger: the chosen measurement has dropped strictly below its
/// threshold. `recharge_mv` is the already-selected threshold, lowered by
/// the caller under low-temperature swelling or an aging step.
pub fn check_recharge(
    check: RechargeCheck,
    inputs: &FullChargeInputs,
    recharge_mv: i32,
    recharge_soc: u8,
) -> bool {
    match check {
        RechargeCheck::Soc => inputs.soc < recharge_soc,
        RechargeCheck::Vcell => inputs.voltage_mv < recharge_mv,
        RechargeCheck::AvgVcell => inputs.avg_voltage_mv < recharge_mv,
    }
}
