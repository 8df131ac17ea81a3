//! Charger health fault tracking
//!
//! OVP, UVLO and watchdog faults reported by the charger IC drive explicit
//! override votes. Every transition requests an urgent re-tick so the
//! supervisor reassesses on the fault interval instead of waiting out the
//! steady-state poll.

use crate::devices::traits::{ChargeMode, ChargerHealth};
use crate::vote::{VoteArbiter, VoterId};

/// Measured-vs-previous charger health state machine
#[derive(Debug)]
pub struct HealthMonitor {
    current: ChargerHealth,
}

impl HealthMonitor {
    pub const fn new() -> Self {
        Self {
            current: ChargerHealth::Good,
        }
    }

    pub fn current(&self) -> ChargerHealth {
        self.current
    }

    /// Applies one measured health sample.
    ///
    /// Input voltage faults (OVP, UVLO) hold charging off through one
    /// override; a watchdog expiry holds its own, and its recovery rewrites
    /// every charger register since the expiry reset them.
    ///
    /// # Returns
    ///
    /// True when the health changed and the supervisor should re-run soon.
    pub fn evaluate(&mut self, measured: ChargerHealth, arbiter: &mut VoteArbiter) -> bool {
        if measured == self.current {
            return false;
        }
        let previous = self.current;
        self.current = measured;
        crate::log_warn!("charger health {:?} -> {:?}", previous, measured);

        let voltage_fault = matches!(
            measured,
            ChargerHealth::OverVoltage | ChargerHealth::UnderVoltage
        );
        arbiter.cast_enable(VoterId::VbatOvp, voltage_fault, ChargeMode::ChargingOff);

        let watchdog = measured == ChargerHealth::WatchdogExpired;
        arbiter.cast_enable(VoterId::WdtExpire, watchdog, ChargeMode::ChargingOff);
        if previous == ChargerHealth::WatchdogExpired && !watchdog {
            arbiter.refresh_all();
        }

        true
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
