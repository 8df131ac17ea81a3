//! Predicted battery temperature
//!
//! Direct-charge contracts heat the battery sense path, so the raw battery
//! thermistor over-reads. While such a contract is live the supervisor
//! substitutes a prediction: the raw reading run through an exponential
//! smoothing recurrence, blended with the sub-battery sensor which sits
//! away from the heated path.

use crate::config::ThermalConfig;

/// Exponential-smoothing temperature predictor
#[derive(Debug, Default)]
pub struct LrpEstimator {
    smoothed: Option<f32>,
    last_update_ms: u64,
}

impl LrpEstimator {
    pub const fn new() -> Self {
        Self {
            smoothed: None,
            last_update_ms: 0,
        }
    }

    /// Feeds one sample pair and returns the blended prediction in tenths C.
    ///
    /// `bat(t) = bat(t-1) + (raw - bat(t-1)) * k * dt`, dt clamped to the
    /// 1..=60 s window and `k * dt` saturated at 1 so a long gap degrades to
    /// taking the raw value rather than overshooting past it.
    pub fn update(
        &mut self,
        raw_temp: i32,
        sub_temp: i32,
        now_ms: u64,
        config: &ThermalConfig,
    ) -> i32 {
        let dt_s = (now_ms.saturating_sub(self.last_update_ms) / 1000).clamp(1, 60) as f32;
        self.last_update_ms = now_ms;

        let raw = raw_temp as f32;
        let smoothed = match self.smoothed {
            Some(previous) => {
                let factor = (config.lrp_gain * dt_s).min(1.0);
                previous + (raw - previous) * factor
            }
            None => raw,
        };
        self.smoothed = Some(smoothed);

        let blended =
            config.lrp_blend_main * smoothed + config.lrp_blend_sub * sub_temp as f32;
        round_tenths(blended)
    }

    /// Drops the history. Called on cable change, the thermal path the
    /// recurrence was tracking no longer exists.
    pub fn reset(&mut self) {
        self.smoothed = None;
    }

    /// True when at least one sample has been fed since the last reset
    pub fn is_primed(&self) -> bool {
        self.smoothed.is_some()
    }
}

fn round_tenths(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}
