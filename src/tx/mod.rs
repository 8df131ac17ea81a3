//! Reverse wireless charging (power sharing)
//!
//! `WirelessTxController` drives the transmit coil as its own loop
//! beside the charging supervisor. It owns the TX port exclusively; the
//! rest of the system sees a running session only through the shared
//! controls flag, the power-sharing votes and the published snapshot.
//! Battery temperature and state of charge gate the session using the
//! supervisor's published values, so the controller never touches the
//! fuel gauge itself.

pub mod aov;
pub mod fault;
#[cfg(feature = "embassy")]
pub mod task;

pub use aov::AovState;
pub use fault::{FaultAction, FaultTracker};

use crate::config::TxConfig;
use crate::core::events::TxEvent;
use crate::core::traits::SharedState;
use crate::devices::traits::{Result, WirelessTxPort};
use crate::supervisor::{BatterySnapshot, SupervisorControls};
use crate::vote::{DomainId, VoteArbiter, VoterId};
use aov::AovLoop;

/// What one controller pass concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxTickOutcome {
    /// Coil energized after this pass
    pub transmitting: bool,
    /// Seconds until the next pass
    pub next_interval_s: u32,
}

enum FaultOutcome {
    Clean,
    Retried,
    Terminal,
}

/// Transmit-path controller.
///
/// A session is requested externally and held open as long as the
/// battery stays inside the allowed window. Faults spend a per-kind
/// retry budget before the session turns terminal; a terminal fault
/// clears itself after a cool-down if a receiver is still on the pad,
/// or immediately on an explicit re-enable.
pub struct WirelessTxController<P> {
    port: P,
    config: TxConfig,
    aov: AovLoop,
    faults: FaultTracker,
    events: TxEvent,
    /// External power-sharing switch
    requested: bool,
    /// Battery thermal gate, hysteretic
    too_hot: bool,
    rx_seen: bool,
    /// Set while a terminal fault holds the session down
    terminal_since_ms: Option<u64>,
}

impl<P: WirelessTxPort> WirelessTxController<P> {
    pub fn new(port: P, config: TxConfig) -> Self {
        Self {
            port,
            config,
            aov: AovLoop::new(),
            faults: FaultTracker::new(),
            events: TxEvent::empty(),
            requested: false,
            too_hot: false,
            rx_seen: false,
            terminal_since_ms: None,
        }
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn events(&self) -> TxEvent {
        self.events
    }

    pub fn state(&self) -> AovState {
        self.aov.state()
    }

    pub fn is_transmitting(&self) -> bool {
        matches!(
            self.aov.state(),
            AovState::Preset | AovState::Monitor | AovState::Phm
        )
    }

    /// Direct access to the port, for tests
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Flips the external power-sharing switch.
    ///
    /// An explicit enable starts a fresh retry budget and lifts a
    /// terminal fault latch; the session itself starts or stops on the
    /// next pass.
    pub fn request_enable(&mut self, on: bool) {
        self.requested = on;
        if on {
            self.terminal_since_ms = None;
            self.faults.note_clean();
            self.events.remove(TxEvent::TX_RETRY_EXHAUSTED);
        }
    }

    /// One controller pass.
    ///
    /// Applies the battery gates, services faults, then runs one step of
    /// the output-voltage loop. Every pass ends by publishing the TX
    /// fields of the shared snapshot.
    pub async fn tick<SA, SC, SB>(
        &mut self,
        arbiter: &SA,
        controls: &SC,
        snapshot: &SB,
        now_ms: u64,
    ) -> TxTickOutcome
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
        SB: SharedState<BatterySnapshot>,
    {
        let (soc, temperature) = snapshot.with(|s| (s.soc, s.temperature));
        self.update_thermal_gate(temperature);
        self.service_terminal_latch(now_ms).await;

        let mut allowed = self.requested && !self.too_hot && self.terminal_since_ms.is_none();
        if allowed && soc < self.config.tx_min_soc {
            crate::log_warn!("tx: battery at {} percent, ending power share", soc);
            self.requested = false;
            allowed = false;
        }

        if !allowed {
            if self.is_transmitting() {
                self.stop(arbiter, controls).await;
            }
            return self.finish(snapshot);
        }

        if !self.is_transmitting() {
            if self.start(arbiter, controls).await.is_err() {
                crate::log_error!("tx: coil enable failed");
                self.fail(arbiter, controls, now_ms).await;
                return self.finish(snapshot);
            }
        }

        match self.service_faults(now_ms).await {
            Ok(FaultOutcome::Clean) => {}
            Ok(FaultOutcome::Retried) => return self.finish(snapshot),
            Ok(FaultOutcome::Terminal) => {
                self.release(arbiter, controls);
                return self.finish(snapshot);
            }
            Err(_) => {
                crate::log_error!("tx: fault poll failed");
                self.fail(arbiter, controls, now_ms).await;
                return self.finish(snapshot);
            }
        }

        match self.port.rx_connected().await {
            Ok(rx) => {
                if rx != self.rx_seen {
                    self.rx_seen = rx;
                    self.events.set(TxEvent::RX_CONNECT, rx);
                    if rx {
                        crate::log_info!("tx: receiver found");
                    } else {
                        crate::log_info!("tx: receiver left the pad");
                    }
                }
            }
            Err(_) => {
                crate::log_error!("tx: receiver presence read failed");
                self.fail(arbiter, controls, now_ms).await;
                return self.finish(snapshot);
            }
        }

        if self
            .aov
            .step(&mut self.port, &self.config, now_ms)
            .await
            .is_err()
        {
            crate::log_error!("tx: output control failed");
            self.fail(arbiter, controls, now_ms).await;
        }

        self.finish(snapshot)
    }

    /// Lifts the terminal latch once the cool-down has run, provided a
    /// receiver is still on the pad. Without one the latch holds until
    /// an explicit re-enable.
    async fn service_terminal_latch(&mut self, now_ms: u64) {
        if let Some(since) = self.terminal_since_ms {
            if now_ms.saturating_sub(since) >= self.config.fault_cooldown_ms {
                if let Ok(true) = self.port.rx_connected().await {
                    self.terminal_since_ms = None;
                    self.faults.note_clean();
                    self.aov.stop();
                    self.events.remove(TxEvent::TX_RETRY_EXHAUSTED);
                    crate::log_info!("tx: fault cooldown over with a receiver present");
                }
            }
        }
    }

    fn update_thermal_gate(&mut self, temperature: i32) {
        if self.too_hot {
            if temperature <= self.config.tx_high_temp_recovery {
                self.too_hot = false;
                self.events.remove(TxEvent::TX_HIGH_TEMP);
                crate::log_info!("tx: battery back to {}, sharing allowed", temperature);
            }
        } else if temperature >= self.config.tx_high_temp {
            self.too_hot = true;
            self.events.insert(TxEvent::TX_HIGH_TEMP);
            crate::log_warn!("tx: battery at {}, too hot to share power", temperature);
        }
    }

    async fn start<SA, SC>(&mut self, arbiter: &SA, controls: &SC) -> Result<()>
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
    {
        self.port.set_tx_enabled(true).await?;
        self.port.set_tx_current_ma(self.config.tx_current_ma).await?;
        self.aov.begin();
        self.faults.note_clean();
        self.events.insert(TxEvent::TX_STATUS);
        arbiter.with_mut(|a| self.cast_share_votes(a, true));
        controls.with_mut(|c| c.tx_active = true);
        crate::log_info!("tx: power sharing on");
        Ok(())
    }

    /// Orderly session end. Fault latches owned by other paths stay.
    async fn stop<SA, SC>(&mut self, arbiter: &SA, controls: &SC)
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
    {
        if self.port.set_tx_enabled(false).await.is_err() {
            crate::log_warn!("tx: coil disable failed");
        }
        self.aov.stop();
        self.faults.note_clean();
        self.rx_seen = false;
        self.events.remove(
            TxEvent::TX_STATUS | TxEvent::RX_CONNECT | TxEvent::TX_MISALIGN | TxEvent::TX_OCP,
        );
        self.release(arbiter, controls);
        crate::log_info!("tx: power sharing off");
    }

    /// Drops the session after a device error and latches the error
    /// state behind the same cool-down a terminal fault uses.
    async fn fail<SA, SC>(&mut self, arbiter: &SA, controls: &SC, now_ms: u64)
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
    {
        if self.port.set_tx_enabled(false).await.is_err() {
            crate::log_warn!("tx: coil disable failed");
        }
        self.aov.fail();
        self.terminal_since_ms = Some(now_ms);
        self.events.remove(TxEvent::TX_STATUS);
        self.release(arbiter, controls);
    }

    fn release<SA, SC>(&self, arbiter: &SA, controls: &SC)
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
    {
        arbiter.with_mut(|a| self.cast_share_votes(a, false));
        controls.with_mut(|c| c.tx_active = false);
    }

    fn cast_share_votes(&self, arbiter: &mut VoteArbiter, on: bool) {
        arbiter.cast(DomainId::Fcc, VoterId::TxShare, on, self.config.tx_fcc_limit_ma);
        arbiter.cast(DomainId::Icl, VoterId::TxShare, on, self.config.tx_icl_limit_ma);
    }

    /// Polls the fault lines and spends the retry budget.
    ///
    /// A retryable fault toggles the coil and restarts the ramp in the
    /// same pass. A terminal one de-energizes the coil and arms the
    /// cool-down latch.
    async fn service_faults(&mut self, now_ms: u64) -> Result<FaultOutcome> {
        let misalign = self.port.misalign_fault().await?;
        let ocp = self.port.ocp_fault().await?;
        if !misalign && !ocp {
            self.faults.note_clean();
            self.events.remove(TxEvent::TX_MISALIGN | TxEvent::TX_OCP);
            return Ok(FaultOutcome::Clean);
        }

        let mut action = FaultAction::Retry;
        if misalign {
            crate::log_warn!("tx: misalignment fault");
            self.events.insert(TxEvent::TX_MISALIGN);
            if self.faults.note_misalign(self.config.fault_retry_limit) == FaultAction::Terminal {
                action = FaultAction::Terminal;
            }
        }
        if ocp {
            crate::log_warn!("tx: overcurrent fault");
            self.events.insert(TxEvent::TX_OCP);
            if self.faults.note_ocp(self.config.fault_retry_limit) == FaultAction::Terminal {
                action = FaultAction::Terminal;
            }
        }

        match action {
            FaultAction::Retry => {
                self.port.set_tx_enabled(false).await?;
                self.port.set_tx_enabled(true).await?;
                self.port.set_tx_current_ma(self.config.tx_current_ma).await?;
                self.aov.begin();
                crate::log_info!("tx: coil toggled, ramp restarted");
                Ok(FaultOutcome::Retried)
            }
            FaultAction::Terminal => {
                self.port.set_tx_enabled(false).await?;
                self.aov.fail();
                self.terminal_since_ms = Some(now_ms);
                self.events.insert(TxEvent::TX_RETRY_EXHAUSTED);
                self.events.remove(TxEvent::TX_STATUS);
                crate::log_error!("tx: retry budget exhausted, transmission off");
                Ok(FaultOutcome::Terminal)
            }
        }
    }

    fn finish<SB: SharedState<BatterySnapshot>>(&self, snapshot: &SB) -> TxTickOutcome {
        snapshot.with_mut(|s| {
            s.tx_events = self.events;
            s.aov_state = self.aov.state();
        });
        TxTickOutcome {
            transmitting: self.is_transmitting(),
            next_interval_s: self.next_interval_s(),
        }
    }

    fn next_interval_s(&self) -> u32 {
        match self.aov.state() {
            AovState::Preset => 1,
            AovState::Monitor | AovState::Phm => 3,
            AovState::Error => 5,
            AovState::None => 10,
        }
    }
}
