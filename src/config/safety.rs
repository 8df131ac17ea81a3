//! Full-charge detection, recharge, safety timer, aging and store mode settings

use heapless::Vec;

/// Maximum number of aging steps
pub const MAX_AGE_STEPS: usize = 8;

/// How the first full-charge condition is detected.
///
/// Policies are mutually exclusive; boards pick the one their sensing
/// hardware supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullCheckPolicy {
    /// Charge current (average) tapers below the full threshold
    CurrentTaper,
    /// Charge current sampled through an ADC channel tapers below the threshold
    AdcCount,
    /// Fixed time in the charging state
    Time,
    /// State of charge reaches the full threshold
    Soc,
    /// Charger chip reports terminal status itself
    ChargerStatus,
}

/// Which measurement the recharge decision compares against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RechargeCheck {
    /// State of charge below `recharge_soc`
    Soc,
    /// Instantaneous cell voltage below the recharge voltage
    Vcell,
    /// Average cell voltage below the recharge voltage
    AvgVcell,
}

/// One battery-aging step.
///
/// Once the accumulated cycle count reaches `cycle`, the step's lowered
/// voltages and full conditions replace the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeStep {
    /// Cycle count at which this step activates
    pub cycle: u16,

    /// Float voltage for this step in mV
    pub float_voltage_mv: i32,

    /// Recharge voltage threshold for this step in mV
    pub recharge_voltage_mv: i32,

    /// Voltage part of the first-full condition in mV
    pub full_condition_mv: i32,

    /// SOC part of the first-full condition in percent
    pub full_condition_soc: u8,
}

/// Charge-termination and safety accounting configuration
#[derive(Debug, Clone)]
pub struct SafetyConfig {
    /// Full-charge detection policy (default: CurrentTaper)
    pub full_check_policy: FullCheckPolicy,

    /// Consecutive qualifying samples before full is declared (default: 3)
    pub full_check_count: u8,

    /// Taper current for the first full in mA (default: 480)
    pub full_current_1st_ma: i32,

    /// Taper current for the second (final) full in mA (default: 240)
    pub full_current_2nd_ma: i32,

    /// SOC the battery must reach before first full is accepted (default: 93)
    pub full_condition_soc: u8,

    /// Voltage the battery must reach before first full is accepted (default: 4250 mV)
    pub full_condition_mv: i32,

    /// Time in the charging state for the Time policy (default: 18000 s)
    pub full_check_time_s: u32,

    /// Second charge stage cap, full is forced when it elapses (default: 1800 s)
    pub second_stage_timer_s: u32,

    /// Topoff current voted during the second charge stage (default: 300 mA)
    pub topoff_current_ma: i32,

    /// Recharge comparison source (default: Vcell)
    pub recharge_check: RechargeCheck,

    /// Recharge voltage threshold in mV (default: 4280)
    pub recharge_voltage_mv: i32,

    /// Recharge SOC threshold in percent (default: 98)
    pub recharge_soc: u8,

    /// Safety-timer budget for a fresh charge session (default: 3 h)
    pub expired_time_ms: u64,

    /// Safety-timer budget for a recharge session (default: 90 min)
    pub recharging_expired_time_ms: u64,

    /// Current the safety budget is calibrated against (default: 2100 mA)
    pub standard_current_ma: i32,

    /// Store mode stops charging at this SOC (default: 70)
    pub store_mode_max_soc: u8,

    /// Store mode re-enables charging at this SOC (default: 60)
    pub store_mode_min_soc: u8,

    /// Aging steps in ascending cycle order, step 0 is the factory state
    pub age_steps: Vec<AgeStep, MAX_AGE_STEPS>,
}

impl SafetyConfig {
    /// Returns the aging step for an index, if configured.
    pub fn age_step(&self, index: usize) -> Option<&AgeStep> {
        self.age_steps.get(index)
    }

    pub(crate) fn validate(&self) -> bool {
        let steps_ascending = self
            .age_steps
            .windows(2)
            .all(|pair| pair[0].cycle < pair[1].cycle);
        let steps_sane = self.age_steps.iter().all(|step| {
            step.float_voltage_mv > step.recharge_voltage_mv
                && step.recharge_voltage_mv > step.full_condition_mv
                && step.full_condition_soc <= 100
        });

        self.full_check_count >= 1
            && self.full_current_1st_ma > self.full_current_2nd_ma
            && self.full_current_2nd_ma > 0
            && self.full_condition_soc <= 100
            && self.recharge_soc <= 100
            && self.expired_time_ms > 0
            && self.recharging_expired_time_ms > 0
            && self.standard_current_ma > 0
            && self.store_mode_min_soc < self.store_mode_max_soc
            && !self.age_steps.is_empty()
            && steps_ascending
            && steps_sane
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        let mut age_steps = Vec::new();
        // Capacity holds all five factory steps
        let _ = age_steps.push(AgeStep {
            cycle: 0,
            float_voltage_mv: 4350,
            recharge_voltage_mv: 4280,
            full_condition_mv: 4250,
            full_condition_soc: 93,
        });
        let _ = age_steps.push(AgeStep {
            cycle: 300,
            float_voltage_mv: 4330,
            recharge_voltage_mv: 4260,
            full_condition_mv: 4230,
            full_condition_soc: 92,
        });
        let _ = age_steps.push(AgeStep {
            cycle: 400,
            float_voltage_mv: 4310,
            recharge_voltage_mv: 4240,
            full_condition_mv: 4210,
            full_condition_soc: 91,
        });
        let _ = age_steps.push(AgeStep {
            cycle: 700,
            float_voltage_mv: 4290,
            recharge_voltage_mv: 4220,
            full_condition_mv: 4190,
            full_condition_soc: 90,
        });
        let _ = age_steps.push(AgeStep {
            cycle: 1000,
            float_voltage_mv: 4240,
            recharge_voltage_mv: 4170,
            full_condition_mv: 4140,
            full_condition_soc: 89,
        });

        Self {
            full_check_policy: FullCheckPolicy::CurrentTaper,
            full_check_count: 3,
            full_current_1st_ma: 480,
            full_current_2nd_ma: 240,
            full_condition_soc: 93,
            full_condition_mv: 4250,
            full_check_time_s: 18_000,
            second_stage_timer_s: 1800,
            topoff_current_ma: 300,
            recharge_check: RechargeCheck::Vcell,
            recharge_voltage_mv: 4280,
            recharge_soc: 98,
            expired_time_ms: 3 * 60 * 60 * 1000,
            recharging_expired_time_ms: 90 * 60 * 1000,
            standard_current_ma: 2100,
            store_mode_max_soc: 70,
            store_mode_min_soc: 60,
            age_steps,
        }
    }
}
