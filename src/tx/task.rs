//! TX controller async task for the Embassy executor
//!
//! Runs [`WirelessTxController::tick`] on the cadence the tick reports.
//! The power-sharing switch arrives through a signal, so flipping it
//! takes effect immediately instead of after the current sleep.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};

use super::WirelessTxController;
use crate::core::traits::SharedState;
use crate::devices::traits::WirelessTxPort;
use crate::supervisor::{BatterySnapshot, SupervisorControls};
use crate::vote::VoteArbiter;

/// Power-sharing switch line into the TX loop
pub type TxSwitch = Signal<CriticalSectionRawMutex, bool>;

/// Requests a session start or stop
pub fn request_power_share(switch: &TxSwitch, on: bool) {
    switch.signal(on);
}

/// TX loop body.
///
/// The executor-facing task is a thin wrapper, so the loop stays
/// generic over the port and shared-state implementations:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn tx_task(
///     controller: WirelessTxController<P9222Tx>,
///     arbiter: &'static SharedArbiter,
///     controls: &'static SharedControls,
///     snapshot: &'static SharedSnapshot,
///     switch: &'static TxSwitch,
/// ) {
///     run_tx_task(controller, arbiter, controls, snapshot, switch).await;
/// }
/// ```
pub async fn run_tx_task<P, SA, SC, SB>(
    mut controller: WirelessTxController<P>,
    arbiter: &SA,
    controls: &SC,
    snapshot: &SB,
    switch: &TxSwitch,
) where
    P: WirelessTxPort,
    SA: SharedState<VoteArbiter>,
    SC: SharedState<SupervisorControls>,
    SB: SharedState<BatterySnapshot>,
{
    loop {
        let now_ms = Instant::now().as_millis();
        let outcome = controller.tick(arbiter, controls, snapshot, now_ms).await;

        match select(
            Timer::after_secs(u64::from(outcome.next_interval_s)),
            switch.wait(),
        )
        .await
        {
            Either::First(()) => {}
            Either::Second(on) => {
                controller.request_enable(on);
            }
        }
    }
}
