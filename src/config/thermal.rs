//! Thermal zone thresholds and temperature-driven limits
//!
//! All temperatures are in tenths of a degree Celsius, matching what fuel
//! gauges and charger ICs report.

/// Battery zone boundaries and the limits each thermal condition applies
#[derive(Debug, Clone)]
pub struct ThermalConfig {
    /// Battery temp at or below which charging stops entirely (default: 0 = 0.0 C)
    pub cold_threshold: i32,

    /// Cool3/Cool2 boundary (default: 100 = 10.0 C)
    pub cool3_threshold: i32,

    /// Cool2/Cool1 boundary (default: 150 = 15.0 C)
    pub cool2_threshold: i32,

    /// Cool1/Normal boundary (default: 200 = 20.0 C)
    pub cool1_threshold: i32,

    /// Normal/Warm boundary (default: 450 = 45.0 C)
    pub warm_threshold: i32,

    /// Warm/Overheat boundary, charging stops above it (default: 500)
    pub overheat_threshold: i32,

    /// Overheat/OverheatLimit boundary, input suspended above it (default: 700)
    pub overheat_limit_threshold: i32,

    /// Hysteresis applied when leaving a zone, in tenths C (default: 20)
    pub zone_hysteresis: i32,

    /// Fast-charge current while in Cool1 (default: 1300 mA)
    pub cool1_fcc_ma: i32,

    /// Fast-charge current while in Cool2 (default: 900 mA)
    pub cool2_fcc_ma: i32,

    /// Fast-charge current while in Cool3 (default: 450 mA)
    pub cool3_fcc_ma: i32,

    /// Fast-charge current while in Warm (default: 1300 mA)
    pub warm_fcc_ma: i32,

    /// Float voltage while a swelling zone is active (default: 4150 mV)
    pub swelling_float_voltage_mv: i32,

    /// Recharge voltage threshold while low-temp swelling is active (default: 4000 mV)
    pub swelling_recharge_voltage_mv: i32,

    /// Charger IC temp that triggers the charger thermal limit (default: 550)
    pub chg_high_temp: i32,

    /// Charger IC temp at which the limit releases (default: 500)
    pub chg_recovery_temp: i32,

    /// Fast-charge cap while the charger thermal limit is active (default: 1400 mA)
    pub chg_limit_fcc_ma: i32,

    /// Battery temp part of the mixed-limit trigger (default: 420)
    pub mix_high_batt_temp: i32,

    /// Charger temp part of the mixed-limit trigger (default: 500)
    pub mix_high_chg_temp: i32,

    /// Battery temp at which the mixed limit releases (default: 390)
    pub mix_recovery_batt_temp: i32,

    /// Input current cap while the mixed limit is active (default: 1000 mA)
    pub mix_icl_ma: i32,

    /// USB connector temp that suspends input (default: 700)
    pub usb_suspend_temp: i32,

    /// USB connector temp at which input resumes (default: 650)
    pub usb_recovery_temp: i32,

    /// Wireless coil temp that caps wireless input (default: 600)
    pub wpc_high_temp: i32,

    /// Wireless coil temp at which the cap releases (default: 550)
    pub wpc_recovery_temp: i32,

    /// Input current cap while the coil limit is active (default: 600 mA)
    pub wpc_icl_ma: i32,

    /// Smoothing gain for the predicted battery temperature (default: 0.3)
    pub lrp_gain: f32,

    /// Blend weight of the smoothed battery reading (default: 0.6)
    pub lrp_blend_main: f32,

    /// Blend weight of the secondary sensor (default: 0.4)
    pub lrp_blend_sub: f32,
}

impl ThermalConfig {
    pub(crate) fn validate(&self) -> bool {
        let bounds = [
            self.cold_threshold,
            self.cool3_threshold,
            self.cool2_threshold,
            self.cool1_threshold,
            self.warm_threshold,
            self.overheat_threshold,
            self.overheat_limit_threshold,
        ];
        let ascending = bounds.windows(2).all(|pair| pair[0] < pair[1]);
        let min_gap = bounds
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min()
            .unwrap_or(0);

        ascending
            && self.zone_hysteresis > 0
            && self.zone_hysteresis < min_gap
            && self.chg_recovery_temp < self.chg_high_temp
            && self.mix_recovery_batt_temp < self.mix_high_batt_temp
            && self.usb_recovery_temp < self.usb_suspend_temp
            && self.wpc_recovery_temp < self.wpc_high_temp
            && self.chg_limit_fcc_ma > 0
            && self.mix_icl_ma > 0
            && self.wpc_icl_ma > 0
            && self.lrp_gain > 0.0
            && self.lrp_gain <= 1.0
            && self.lrp_blend_main >= 0.0
            && self.lrp_blend_sub >= 0.0
    }
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            cold_threshold: 0,
            cool3_threshold: 100,
            cool2_threshold: 150,
            cool1_threshold: 200,
            warm_threshold: 450,
            overheat_threshold: 500,
            overheat_limit_threshold: 700,
            zone_hysteresis: 20,
            cool1_fcc_ma: 1300,
            cool2_fcc_ma: 900,
            cool3_fcc_ma: 450,
            warm_fcc_ma: 1300,
            swelling_float_voltage_mv: 4150,
            swelling_recharge_voltage_mv: 4000,
            chg_high_temp: 550,
            chg_recovery_temp: 500,
            chg_limit_fcc_ma: 1400,
            mix_high_batt_temp: 420,
            mix_high_chg_temp: 500,
            mix_recovery_batt_temp: 390,
            mix_icl_ma: 1000,
            usb_suspend_temp: 700,
            usb_recovery_temp: 650,
            wpc_high_temp: 600,
            wpc_recovery_temp: 550,
            wpc_icl_ma: 600,
            lrp_gain: 0.3,
            lrp_blend_main: 0.6,
            lrp_blend_sub: 0.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(ThermalConfig::default().validate());
    }

    #[test]
    fn test_inverted_boundaries_rejected() {
        let mut config = ThermalConfig::default();
        config.warm_threshold = config.overheat_threshold + 10;
        assert!(!config.validate());
    }

    #[test]
    fn test_hysteresis_wider_than_zone_rejected() {
        let mut config = ThermalConfig::default();
        config.zone_hysteresis = 60;
        assert!(!config.validate());
    }

    #[test]
    fn test_recovery_above_trigger_rejected() {
        let mut config = ThermalConfig::default();
        config.chg_recovery_temp = config.chg_high_temp + 10;
        assert!(!config.validate());
    }
}
