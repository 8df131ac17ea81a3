//! Vote apply path
//!
//! Bridges arbitration to the charger. The arbiter lock is held only for
//! the `take_pending` / `mark_applied` bookkeeping; every device write
//! happens between those, with the lock released.

use super::{DomainValue, VoteArbiter};
use crate::core::traits::SharedState;
use crate::devices::traits::Charger;

/// What one apply pass accomplished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Writes that reached the hardware
    pub wrote: usize,
    /// At least one write failed and stays pending
    pub any_failed: bool,
    /// The charge-enable write specifically failed; the supervisor treats
    /// this as urgent because the power stage mode is a safety output
    pub chg_en_failed: bool,
}

/// Writes every out-of-sync domain to the charger.
///
/// Failed writes are left pending, so calling again retries exactly the
/// writes that are still owed.
pub async fn apply_pending<S, C>(arbiter: &S, charger: &mut C) -> ApplyOutcome
where
    S: SharedState<VoteArbiter>,
    C: Charger,
{
    let writes = arbiter.with(|a| a.take_pending());
    let mut outcome = ApplyOutcome::default();

    for write in writes {
        let result = match write {
            DomainValue::Icl(ma) => charger.set_input_current_ma(ma).await,
            DomainValue::Fcc(ma) => charger.set_fast_charging_current_ma(ma).await,
            DomainValue::FloatVoltage(mv) => charger.set_float_voltage_mv(mv).await,
            DomainValue::InputVoltage(mv) => charger.set_input_voltage_mv(mv).await,
            DomainValue::Topoff(ma) => charger.set_topoff_current_ma(ma).await,
            DomainValue::ChargeEnable(mode) => charger.set_charge_mode(mode).await,
        };

        match result {
            Ok(()) => {
                arbiter.with_mut(|a| a.mark_applied(write));
                outcome.wrote += 1;
            }
            Err(_) => {
                outcome.any_failed = true;
                if matches!(write, DomainValue::ChargeEnable(_)) {
                    outcome.chg_en_failed = true;
                    crate::log_error!("charge enable write failed, retrying next tick");
                } else {
                    crate::log_warn!("charger write failed, retrying next tick");
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockState;
    use crate::devices::mock::{ChargerWrite, MockCharger};
    use crate::devices::traits::ChargeMode;
    use crate::vote::{DomainId, VoterId};

    #[tokio::test]
    async fn test_apply_writes_and_settles() {
        let arbiter = MockState::new(VoteArbiter::new(100));
        arbiter.with_mut(|a| {
            a.cast(DomainId::Icl, VoterId::Cable, true, 1500);
            a.cast(DomainId::Fcc, VoterId::Cable, true, 2100);
            a.cast(DomainId::Fcc, VoterId::Fallback, false, 100);
            a.cast(DomainId::Icl, VoterId::Fallback, false, 100);
            a.cast_enable(VoterId::Cable, true, ChargeMode::Charging);
        });
        let mut charger = MockCharger::new();

        let outcome = apply_pending(&arbiter, &mut charger).await;
        assert_eq!(outcome.wrote, 3);
        assert!(!outcome.any_failed);

        let writes = charger.writes();
        assert_eq!(
            writes.as_slice(),
            &[
                ChargerWrite::InputCurrent(1500),
                ChargerWrite::FastCharging(2100),
                ChargerWrite::Mode(ChargeMode::Charging),
            ]
        );

        // Everything settled, nothing left to do
        assert!(!arbiter.with(|a| a.has_pending()));
        charger.clear_writes();
        let outcome = apply_pending(&arbiter, &mut charger).await;
        assert_eq!(outcome.wrote, 0);
        assert!(charger.writes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_retried_on_next_pass() {
        let arbiter = MockState::new(VoteArbiter::new(100));
        let mut charger = MockCharger::new();

        // Initial state owes ICL, FCC and mode; fail the first write
        charger.set_fail_writes(1);
        let outcome = apply_pending(&arbiter, &mut charger).await;
        assert!(outcome.any_failed);
        assert_eq!(outcome.wrote, 2);

        let outcome = apply_pending(&arbiter, &mut charger).await;
        assert!(!outcome.any_failed);
        assert_eq!(outcome.wrote, 1);
        assert!(!arbiter.with(|a| a.has_pending()));
    }

    #[tokio::test]
    async fn test_chg_en_failure_flagged_as_urgent() {
        let arbiter = MockState::new(VoteArbiter::new(100));
        let mut charger = MockCharger::new();
        // ICL and FCC succeed, the mode write fails
        charger.set_fail_writes(0);
        let _ = apply_pending(&arbiter, &mut charger).await;

        arbiter.with_mut(|a| a.cast_enable(VoterId::VbatOvp, true, ChargeMode::ChargingOff));
        charger.set_fail_writes(1);
        let outcome = apply_pending(&arbiter, &mut charger).await;
        assert!(outcome.chg_en_failed);
    }
}
