//! Supervisor async task for the Embassy executor
//!
//! Drives [`ChargingSupervisor::tick`] on the adaptive cadence the tick
//! itself reports. A wake signal lets interrupt handlers and the system
//! surface pull the next pass forward after queueing an event, instead
//! of waiting out the current sleep.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};

use super::notify::{notices_between, post_all, NoticeChannel};
use super::{BatterySnapshot, ChargingSupervisor, SupervisorControls};
use crate::cable::SourceEvent;
use crate::core::traits::SharedState;
use crate::devices::traits::{Charger, Delay, FuelGauge, WirelessSource};
use crate::vote::VoteArbiter;

/// Wake-up line into the supervisor loop
pub type WakeSignal = Signal<CriticalSectionRawMutex, ()>;

/// Queues a source event and pulls the next monitor pass forward.
///
/// Returns false when the queue suppressed the event as a duplicate of
/// its newest entry; the wake still fires, a duplicate usually means
/// the supervisor is behind.
pub fn notify_source_event<S>(controls: &S, wake: &WakeSignal, event: SourceEvent) -> bool
where
    S: SharedState<SupervisorControls>,
{
    let queued = controls.with_mut(|c| c.events.push(event));
    wake.signal(());
    queued
}

/// Requests a prompt re-tick after a control field changed
pub fn request_tick(wake: &WakeSignal) {
    wake.signal(());
}

/// Supervisor loop body.
///
/// The executor-facing task is a thin wrapper, so the loop stays
/// generic over the device and shared-state implementations:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn supervisor_task(
///     supervisor: ChargingSupervisor<Smb1357, Max77705, P9222, EmbassyDelay>,
///     arbiter: &'static SharedArbiter,
///     controls: &'static SharedControls,
///     snapshot: &'static SharedSnapshot,
///     wake: &'static WakeSignal,
///     notices: &'static NoticeChannel,
/// ) {
///     run_supervisor_task(supervisor, arbiter, controls, snapshot, wake, notices).await;
/// }
/// ```
pub async fn run_supervisor_task<C, F, W, D, SA, SC, SB>(
    mut supervisor: ChargingSupervisor<C, F, W, D>,
    arbiter: &SA,
    controls: &SC,
    snapshot: &SB,
    wake: &WakeSignal,
    notices: &NoticeChannel,
) where
    C: Charger,
    F: FuelGauge,
    W: WirelessSource,
    D: Delay,
    SA: SharedState<VoteArbiter>,
    SC: SharedState<SupervisorControls>,
    SB: SharedState<BatterySnapshot>,
{
    let mut last_published = snapshot.with(|s| *s);
    loop {
        let now_ms = Instant::now().as_millis();
        let outcome = supervisor.tick(arbiter, controls, snapshot, now_ms).await;

        if !outcome.skipped {
            let published = snapshot.with(|s| *s);
            post_all(notices, &notices_between(&last_published, &published));
            last_published = published;
        }

        // An urgent outcome wants a prompt follow-up regardless of cadence
        let wait_s = if outcome.urgent {
            1
        } else {
            outcome.next_interval_s
        };
        match select(Timer::after_secs(u64::from(wait_s)), wake.wait()).await {
            Either::First(()) => {}
            Either::Second(()) => {
                crate::log_trace!("supervisor woken early");
            }
        }
    }
}
