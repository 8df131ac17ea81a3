//! Charging safety timer
//!
//! Bounds how long one charge session may run. Consumption is scaled by the
//! charge rate: a session at half the standard current burns the budget at
//! half speed, and anything at or above standard burns it in real time. The
//! timer fully resets when the battery is clearly off charge (five
//! consecutive discharging samples) or while a stop condition (display on,
//! wireless TX active) holds.

use crate::config::SafetyConfig;

/// Consecutive discharging samples that reset the consumed budget
const DISCHARGE_RESET_COUNT: u8 = 5;

/// Scaled charge-session time budget
#[derive(Debug, Default)]
pub struct SafetyTimer {
    nominal_ms: u64,
    consumed_ms: u64,
    discharge_count: u8,
    last_sample_ms: Option<u64>,
    running: bool,
    expired: bool,
}

impl SafetyTimer {
    pub const fn new() -> Self {
        Self {
            nominal_ms: 0,
            consumed_ms: 0,
            discharge_count: 0,
            last_sample_ms: None,
            running: false,
            expired: false,
        }
    }

    /// Arms the timer for a new charge session. Clears a latched expiry;
    /// only a fresh session may do that.
    pub fn start(&mut self, budget_ms: u64, now_ms: u64) {
        self.nominal_ms = budget_ms;
        self.consumed_ms = 0;
        self.discharge_count = 0;
        self.last_sample_ms = Some(now_ms);
        self.running = true;
        self.expired = false;
    }

    /// Disarms the timer. A latched expiry survives until the next `start`.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_sample_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Budget left at the current consumption state
    pub fn remaining_ms(&self) -> u64 {
        self.nominal_ms.saturating_sub(self.consumed_ms)
    }

    /// Feeds one sample.
    ///
    /// `stop_condition` covers display-on and TX-active windows; while it
    /// holds the consumed budget resets and nothing accumulates.
    ///
    /// # Returns
    ///
    /// True exactly on the sample that exhausts the budget.
    pub fn tick(
        &mut self,
        current_ma: i32,
        stop_condition: bool,
        now_ms: u64,
        config: &SafetyConfig,
    ) -> bool {
        if !self.running || self.expired {
            return false;
        }

        let elapsed_ms = match self.last_sample_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        self.last_sample_ms = Some(now_ms);

        if stop_condition {
            self.consumed_ms = 0;
            self.discharge_count = 0;
            return false;
        }

        if current_ma <= 0 {
            self.discharge_count = self.discharge_count.saturating_add(1);
            if self.discharge_count >= DISCHARGE_RESET_COUNT {
                self.consumed_ms = 0;
            }
            return false;
        }
        self.discharge_count = 0;

        let standard_ma = config.standard_current_ma.max(1);
        let clamped_ma = current_ma.clamp(1, standard_ma);
        let scaled_ms = elapsed_ms * clamped_ma as u64 / standard_ma as u64;
        self.consumed_ms = self.consumed_ms.saturating_add(scaled_ms);

        if self.consumed_ms >= self.nominal_ms {
            self.expired = true;
            crate::log_error!("charging safety timer expired");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET_MS: u64 = 3 * 60 * 60 * 1000;

    #[test]
    fn test_standard_current_consumes_real_time() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        timer.tick(2100, false, 30_000, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 30_000);
    }

    #[test]
    fn test_half_current_consumes_half_rate() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        timer.tick(1050, false, 30_000, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 15_000);
    }

    #[test]
    fn test_current_above_standard_clamps_to_real_time() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        timer.tick(4200, false, 30_000, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 30_000);
    }

    #[test]
    fn test_five_discharging_samples_reset_budget() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        let mut now = 0;
        for _ in 0..10 {
            now += 30_000;
            timer.tick(2100, false, now, &config);
        }
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 300_000);

        // Four discharging samples are not enough
        for _ in 0..4 {
            now += 30_000;
            timer.tick(-200, false, now, &config);
        }
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 300_000);

        now += 30_000;
        timer.tick(-200, false, now, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS);
    }

    #[test]
    fn test_charging_sample_restarts_discharge_count() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        let mut now = 0;
        now += 30_000;
        timer.tick(2100, false, now, &config);

        for _ in 0..4 {
            now += 30_000;
            timer.tick(-200, false, now, &config);
        }
        now += 30_000;
        timer.tick(2100, false, now, &config);
        for _ in 0..4 {
            now += 30_000;
            timer.tick(-200, false, now, &config);
        }
        // Never five in a row, budget consumption stands
        assert!(timer.remaining_ms() < BUDGET_MS);
    }

    #[test]
    fn test_stop_condition_resets_and_holds() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(BUDGET_MS, 0);

        timer.tick(2100, false, 60_000, &config);
        assert!(timer.remaining_ms() < BUDGET_MS);

        timer.tick(2100, true, 90_000, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS);

        // Accumulation resumes from the stop sample's timestamp
        timer.tick(2100, false, 120_000, &config);
        assert_eq!(timer.remaining_ms(), BUDGET_MS - 30_000);
    }

    #[test]
    fn test_expiry_fires_once_and_latches() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(60_000, 0);

        assert!(!timer.tick(2100, false, 30_000, &config));
        assert!(timer.tick(2100, false, 60_000, &config));
        assert!(timer.is_expired());
        assert!(!timer.tick(2100, false, 90_000, &config));
        assert!(timer.is_expired());
    }

    #[test]
    fn test_new_session_clears_latched_expiry() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();
        timer.start(30_000, 0);
        timer.tick(2100, false, 30_000, &config);
        assert!(timer.is_expired());

        timer.start(BUDGET_MS, 100_000);
        assert!(!timer.is_expired());
        assert_eq!(timer.remaining_ms(), BUDGET_MS);
    }

    #[test]
    fn test_disarmed_timer_never_accumulates() {
        let mut timer = SafetyTimer::new();
        let config = SafetyConfig::default();

        assert!(!timer.tick(2100, false, 600_000, &config));
        assert!(!timer.is_expired());
    }
}
