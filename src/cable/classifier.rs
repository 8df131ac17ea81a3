//! Power source classification
//!
//! Maps raw attach notifications onto one canonical `CableType`, arbitrating
//! between simultaneous wired and wireless sources by comparing their
//! declared charge power. Classification recasts the cable votes and, when
//! the winner changes sides, switches the receiver chip's physical power
//! path.

use crate::cable::types::{CableType, SourceEvent, WirelessKind};
use crate::config::ChargeConfig;
use crate::core::traits::SharedState;
use crate::devices::traits::{ChargeMode, Charger, Delay, PowerPath, WirelessSource};
use crate::vote::{apply_pending, DomainId, VoteArbiter, VoterId};

/// Negotiated PD sink contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PdContract {
    /// Contract voltage in mV
    pub max_voltage_mv: i32,
    /// Contract current in mA
    pub max_current_ma: i32,
    /// Programmable contract, direct charging capable
    pub apdo: bool,
}

/// Result of one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    /// The active classification changed
    pub changed: bool,
    /// Power moved between the wired and wireless paths. Accumulated
    /// charge-power and thermal-limit history belongs to the old path and
    /// must be discarded.
    pub cleared_limits: bool,
    /// Every source is gone; per-session state resets
    pub fully_detached: bool,
}

/// Wireless receiver attachment with its declared operating point
#[derive(Debug, Clone, Copy)]
struct RxPresence {
    kind: WirelessKind,
    vout_mv: i32,
    max_current_ma: i32,
}

/// Attach-event classifier and active-source selector.
///
/// Holds the last known wired and wireless attachments separately; `active`
/// is always the single source currently allowed to deliver power.
#[derive(Debug)]
pub struct PowerSourceClassifier {
    wired: CableType,
    rx: Option<RxPresence>,
    /// Last power path commanded to the receiver chip, `None` until a
    /// receiver is present and has been steered once
    rx_path: Option<PowerPath>,
    pd: Option<PdContract>,
    active: CableType,
    ldo_blocked: bool,
}

impl PowerSourceClassifier {
    pub const fn new() -> Self {
        Self {
            wired: CableType::None,
            rx: None,
            rx_path: None,
            pd: None,
            active: CableType::None,
            ldo_blocked: false,
        }
    }

    /// The source currently powering the device
    pub fn active(&self) -> CableType {
        self.active
    }

    /// The negotiated PD contract, when one is live
    pub fn pd_contract(&self) -> Option<PdContract> {
        self.pd
    }

    /// True while a programmable PD contract is live
    pub fn is_apdo(&self) -> bool {
        self.pd.map(|pd| pd.apdo).unwrap_or(false)
    }

    /// Receiver class of the attached wireless source, if any
    pub fn wireless_kind(&self) -> Option<WirelessKind> {
        self.rx.map(|rx| rx.kind)
    }

    /// Blocks the receiver LDO re-enable that normally accompanies a switch
    /// to the wireless path. Set while store mode holds wireless charging
    /// off; classification must not silently undo that.
    pub fn set_ldo_blocked(&mut self, blocked: bool) {
        self.ldo_blocked = blocked;
    }

    /// Applies one attach notification and reclassifies.
    ///
    /// Votes are recast on every accepted event, so a renegotiated contract
    /// lands even when the classification itself is unchanged; identical
    /// votes produce zero arbiter writes. Rejected events leave everything
    /// untouched.
    pub async fn handle_event<S, C, W, D>(
        &mut self,
        event: SourceEvent,
        config: &ChargeConfig,
        arbiter: &S,
        charger: &mut C,
        wireless: &mut W,
        delay: &mut D,
    ) -> ClassifyOutcome
    where
        S: SharedState<VoteArbiter>,
        C: Charger,
        W: WirelessSource,
        D: Delay,
    {
        if !self.ingest(event) {
            return ClassifyOutcome::default();
        }
        self.reclassify(config, arbiter, charger, wireless, delay)
            .await
    }

    /// Updates the attachment bookkeeping. Returns false when the event is
    /// rejected and the previous classification must be retained.
    fn ingest(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::WiredAttach { cable_id } => match CableType::from_raw(cable_id) {
                Some(CableType::None) => {
                    self.wired = CableType::None;
                    self.pd = None;
                    true
                }
                Some(cable) if cable.is_wired() || cable == CableType::Otg => {
                    self.wired = cable;
                    true
                }
                Some(_) => {
                    crate::log_warn!("wireless class on wired attach, ignored");
                    false
                }
                None => {
                    crate::log_warn!("unknown cable id, keeping previous classification");
                    false
                }
            },
            SourceEvent::WiredDetach => {
                self.wired = CableType::None;
                self.pd = None;
                true
            }
            SourceEvent::PdContract {
                max_voltage_mv,
                max_current_ma,
                apdo,
            } => {
                if !self.wired.is_wired() {
                    crate::log_warn!("pd contract with no wired attachment, ignored");
                    return false;
                }
                self.pd = Some(PdContract {
                    max_voltage_mv,
                    max_current_ma,
                    apdo,
                });
                self.wired = if apdo {
                    CableType::PdApdo
                } else {
                    CableType::Pd
                };
                true
            }
            SourceEvent::WirelessAttach {
                kind,
                vout_mv,
                max_current_ma,
            } => {
                self.rx = Some(RxPresence {
                    kind,
                    vout_mv,
                    max_current_ma,
                });
                true
            }
            SourceEvent::WirelessDetach => {
                self.rx = None;
                self.rx_path = None;
                true
            }
        }
    }

    async fn reclassify<S, C, W, D>(
        &mut self,
        config: &ChargeConfig,
        arbiter: &S,
        charger: &mut C,
        wireless: &mut W,
        delay: &mut D,
    ) -> ClassifyOutcome
    where
        S: SharedState<VoteArbiter>,
        C: Charger,
        W: WirelessSource,
        D: Delay,
    {
        let previous = self.active;
        let next = self.choose_cable_type(config);

        if next != previous {
            crate::log_info!("power source {:?} -> {:?}", previous, next);
        }
        self.active = next;

        // Steer the receiver chip whenever its commanded path disagrees
        // with the winner. The switch to wired pins FCC low first so the
        // handoff never happens under full charge current.
        if self.rx.is_some() {
            let desired = if next.is_wireless() && next != CableType::WirelessFake {
                PowerPath::Wireless
            } else {
                PowerPath::Wired
            };
            if self.rx_path != Some(desired) {
                match desired {
                    PowerPath::Wired => {
                        self.switch_to_wired(config, arbiter, charger, wireless, delay)
                            .await;
                    }
                    PowerPath::Wireless => {
                        if wireless.set_power_path(PowerPath::Wireless).await.is_err() {
                            crate::log_warn!("wireless power path switch failed");
                        }
                        if !self.ldo_blocked && wireless.set_ldo_enabled(true).await.is_err() {
                            crate::log_warn!("receiver ldo enable failed");
                        }
                    }
                }
                self.rx_path = Some(desired);
            }
        }

        self.cast_source_votes(config, arbiter);

        let crossed_paths = previous.is_wireless() != next.is_wireless()
            && previous != CableType::None
            && next != CableType::None;

        ClassifyOutcome {
            changed: next != previous,
            cleared_limits: crossed_paths,
            fully_detached: next == CableType::None,
        }
    }

    /// Pins FCC, commits it, switches the receiver to the wired path and
    /// waits out the settle window. The pin is lifted by `cast_source_votes`
    /// running afterwards; the restored current lands with the rest of the
    /// cable votes.
    async fn switch_to_wired<S, C, W, D>(
        &mut self,
        config: &ChargeConfig,
        arbiter: &S,
        charger: &mut C,
        wireless: &mut W,
        delay: &mut D,
    ) where
        S: SharedState<VoteArbiter>,
        C: Charger,
        W: WirelessSource,
        D: Delay,
    {
        arbiter.with_mut(|a| {
            a.cast(
                DomainId::Fcc,
                VoterId::Select,
                true,
                config.path_switch_fcc_ma,
            )
        });
        let _ = apply_pending(arbiter, charger).await;

        if wireless.set_power_path(PowerPath::Wired).await.is_err() {
            crate::log_warn!("wired power path switch failed");
        }
        delay.delay_ms(config.path_switch_settle_ms).await;
    }

    /// The winning classification given the current attachments.
    ///
    /// OTG owns the connector outright. A fake wireless marker never wins;
    /// otherwise a present wireless source beats the wired one only when its
    /// declared power strictly exceeds the wired power.
    fn choose_cable_type(&self, config: &ChargeConfig) -> CableType {
        if self.wired == CableType::Otg {
            return CableType::Otg;
        }

        let wired_present = self.wired != CableType::None;
        match self.rx {
            Some(rx) if rx.kind == WirelessKind::Fake => {
                if wired_present {
                    self.wired
                } else {
                    CableType::WirelessFake
                }
            }
            Some(rx) => {
                if !wired_present {
                    return rx.kind.cable_type();
                }
                let wireless_mw = rx.vout_mv * rx.max_current_ma / 1000;
                if wireless_mw > self.wired_power_mw(config) {
                    rx.kind.cable_type()
                } else {
                    self.wired
                }
            }
            None => self.wired,
        }
    }

    fn wired_power_mw(&self, config: &ChargeConfig) -> i32 {
        self.wired_voltage_mv(config) * self.wired_input_ma(config) / 1000
    }

    fn wired_voltage_mv(&self, config: &ChargeConfig) -> i32 {
        match self.wired {
            CableType::HvTa => config.input_voltage_9v_mv,
            CableType::HvTa12v => config.input_voltage_12v_mv,
            CableType::Pd | CableType::PdApdo => self
                .pd
                .map(|pd| pd.max_voltage_mv)
                .unwrap_or(config.input_voltage_9v_mv),
            _ => config.input_voltage_5v_mv,
        }
    }

    /// Table input current, narrowed by the PD contract when one is live.
    /// The contract is what the source can actually deliver; drawing past
    /// it collapses the supply.
    fn wired_input_ma(&self, config: &ChargeConfig) -> i32 {
        let table_ma = config.cable.entry(self.wired).input_current_ma;
        match (self.wired, self.pd) {
            (CableType::Pd | CableType::PdApdo, Some(pd)) => table_ma.min(pd.max_current_ma),
            _ => table_ma,
        }
    }

    /// Recasts every cable-owned vote for the active source. Also lifts the
    /// path-switch FCC pin, so the restored current commits atomically with
    /// the new cable values.
    fn cast_source_votes<S>(&self, config: &ChargeConfig, arbiter: &S)
    where
        S: SharedState<VoteArbiter>,
    {
        let active = self.active;
        arbiter.with_mut(|a| {
            a.cast(DomainId::Fcc, VoterId::Select, false, 0);

            if !active.is_charging_source() {
                a.cast(DomainId::Icl, VoterId::Fallback, true, config.fallback_input_ma);
                a.cast(DomainId::Fcc, VoterId::Fallback, true, config.fallback_input_ma);
                a.cast(DomainId::Icl, VoterId::Cable, false, 0);
                a.cast(DomainId::Fcc, VoterId::Cable, false, 0);
                a.cast(DomainId::FloatVoltage, VoterId::Cable, false, 0);
                a.cast(DomainId::InputVoltage, VoterId::Cable, false, 0);
                let mode = if active == CableType::Otg {
                    ChargeMode::BuckOff
                } else {
                    ChargeMode::ChargingOff
                };
                a.cast_enable(VoterId::Cable, true, mode);
                return;
            }

            let (icl, iv) = if active.is_wireless() {
                match self.rx {
                    Some(rx) => (rx.max_current_ma, rx.vout_mv),
                    // Receiver vanished under us; next event corrects this
                    None => (config.fallback_input_ma, config.wireless_vout_mv),
                }
            } else {
                (self.wired_input_ma(config), self.wired_voltage_mv(config))
            };
            let fcc = config.cable.entry(active).fast_charging_current_ma;

            a.cast(DomainId::Icl, VoterId::Cable, true, icl);
            a.cast(DomainId::Fcc, VoterId::Cable, true, fcc);
            a.cast(
                DomainId::FloatVoltage,
                VoterId::Cable,
                true,
                config.float_voltage_mv,
            );
            a.cast(DomainId::InputVoltage, VoterId::Cable, true, iv);
            a.cast_enable(VoterId::Cable, true, ChargeMode::Charging);
            a.cast(DomainId::Icl, VoterId::Fallback, false, 0);
            a.cast(DomainId::Fcc, VoterId::Fallback, false, 0);
        });
    }
}

impl Default for PowerSourceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockState;
    use crate::devices::mock::{ChargerWrite, MockCharger, MockDelay, MockWirelessSource, RxWrite};

    struct Rig {
        classifier: PowerSourceClassifier,
        config: ChargeConfig,
        arbiter: MockState<VoteArbiter>,
        charger: MockCharger,
        wireless: MockWirelessSource,
        delay: MockDelay,
    }

    impl Rig {
        fn new() -> Self {
            let config = ChargeConfig::default();
            Self {
                classifier: PowerSourceClassifier::new(),
                arbiter: MockState::new(VoteArbiter::new(config.fallback_input_ma)),
                config,
                charger: MockCharger::new(),
                wireless: MockWirelessSource::new(),
                delay: MockDelay::new(),
            }
        }

        async fn handle(&mut self, event: SourceEvent) -> ClassifyOutcome {
            self.classifier
                .handle_event(
                    event,
                    &self.config,
                    &self.arbiter,
                    &mut self.charger,
                    &mut self.wireless,
                    &mut self.delay,
                )
                .await
        }

        /// Commits pending votes and clears the write logs, so tests start
        /// from a settled charger.
        async fn settle(&mut self) {
            let _ = apply_pending(&self.arbiter, &mut self.charger).await;
            self.charger.clear_writes();
        }

        fn resolved(&self, domain: DomainId) -> Option<(VoterId, i32)> {
            self.arbiter
                .with(|a| a.resolve(domain).map(|r| (r.voter, r.value)))
        }
    }

    #[tokio::test]
    async fn test_usb_attach_casts_table_votes() {
        let mut rig = Rig::new();
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredAttach { cable_id: 2 }).await;
        assert!(outcome.changed);
        assert!(!outcome.fully_detached);

        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Cable, 500)));
        assert_eq!(rig.resolved(DomainId::Fcc), Some((VoterId::Cable, 500)));
        assert_eq!(
            rig.resolved(DomainId::InputVoltage),
            Some((VoterId::Cable, 5000))
        );
        assert_eq!(
            rig.arbiter.with(|a| a.resolve_enable()),
            Some((VoterId::Cable, ChargeMode::Charging))
        );
    }

    #[tokio::test]
    async fn test_unknown_cable_id_rejected() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WiredAttach { cable_id: 4 }).await;
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredAttach { cable_id: 99 }).await;
        assert_eq!(outcome, ClassifyOutcome::default());
        assert_eq!(rig.classifier.active(), CableType::Ta);
        assert!(!rig.arbiter.with(|a| a.has_pending()));
    }

    #[tokio::test]
    async fn test_reannouncement_produces_no_writes() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WiredAttach { cable_id: 4 }).await;
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredAttach { cable_id: 4 }).await;
        assert!(!outcome.changed);
        assert!(!rig.arbiter.with(|a| a.has_pending()));
        assert!(rig.charger.writes().is_empty());
    }

    #[tokio::test]
    async fn test_detach_restores_fallback_floor() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WiredAttach { cable_id: 4 }).await;
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredDetach).await;
        assert!(outcome.changed);
        assert!(outcome.fully_detached);

        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Fallback, 100)));
        assert_eq!(rig.resolved(DomainId::Fcc), Some((VoterId::Fallback, 100)));
        assert_eq!(
            rig.arbiter.with(|a| a.resolve_enable()),
            Some((VoterId::Cable, ChargeMode::ChargingOff))
        );
    }

    #[tokio::test]
    async fn test_weaker_wireless_loses_to_wired() {
        let mut rig = Rig::new();
        // 9 V x 1650 mA wired against 10 V x 750 mA wireless
        rig.handle(SourceEvent::WiredAttach { cable_id: 5 }).await;
        rig.settle().await;

        let outcome = rig
            .handle(SourceEvent::WirelessAttach {
                kind: WirelessKind::Epp,
                vout_mv: 10_000,
                max_current_ma: 750,
            })
            .await;

        assert!(!outcome.changed);
        assert_eq!(rig.classifier.active(), CableType::HvTa);
        // The losing receiver still gets steered onto the wired path
        assert!(rig
            .wireless
            .writes()
            .contains(&RxWrite::Path(PowerPath::Wired)));
    }

    #[tokio::test]
    async fn test_stronger_wireless_beats_wired() {
        let mut rig = Rig::new();
        // 5 V x 500 mA USB against 10 V x 800 mA wireless
        rig.handle(SourceEvent::WiredAttach { cable_id: 2 }).await;
        rig.settle().await;

        let outcome = rig
            .handle(SourceEvent::WirelessAttach {
                kind: WirelessKind::Epp,
                vout_mv: 10_000,
                max_current_ma: 800,
            })
            .await;

        assert!(outcome.changed);
        assert!(outcome.cleared_limits);
        assert_eq!(rig.classifier.active(), CableType::WirelessHv);
        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Cable, 800)));
        assert_eq!(
            rig.resolved(DomainId::InputVoltage),
            Some((VoterId::Cable, 10_000))
        );

        let writes = rig.wireless.writes();
        assert!(writes.contains(&RxWrite::Path(PowerPath::Wireless)));
        assert!(writes.contains(&RxWrite::Ldo(true)));
    }

    #[tokio::test]
    async fn test_wired_attach_over_wireless_runs_pin_sequence() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WirelessAttach {
            kind: WirelessKind::Bpp,
            vout_mv: 5500,
            max_current_ma: 700,
        })
        .await;
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredAttach { cable_id: 5 }).await;
        assert!(outcome.changed);
        assert!(outcome.cleared_limits);
        assert_eq!(rig.classifier.active(), CableType::HvTa);

        // The pin committed alone, before the path switch
        assert_eq!(rig.charger.writes().as_slice(), &[ChargerWrite::FastCharging(400)]);
        assert!(rig
            .wireless
            .writes()
            .contains(&RxWrite::Path(PowerPath::Wired)));
        assert_eq!(rig.delay.elapsed_ms(), rig.config.path_switch_settle_ms);

        // Final commit restores the real cable current
        rig.charger.clear_writes();
        let _ = apply_pending(&rig.arbiter, &mut rig.charger).await;
        assert!(rig
            .charger
            .writes()
            .contains(&ChargerWrite::FastCharging(2750)));
        assert_eq!(rig.resolved(DomainId::Fcc), Some((VoterId::Cable, 2750)));
    }

    #[tokio::test]
    async fn test_fake_wireless_never_charges() {
        let mut rig = Rig::new();
        rig.settle().await;

        let outcome = rig
            .handle(SourceEvent::WirelessAttach {
                kind: WirelessKind::Fake,
                vout_mv: 5500,
                max_current_ma: 700,
            })
            .await;

        assert!(outcome.changed);
        assert_eq!(rig.classifier.active(), CableType::WirelessFake);
        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Fallback, 100)));
        assert_eq!(
            rig.arbiter.with(|a| a.resolve_enable()),
            Some((VoterId::Cable, ChargeMode::ChargingOff))
        );
    }

    #[tokio::test]
    async fn test_otg_wins_outright_and_cuts_input() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WirelessAttach {
            kind: WirelessKind::Epp,
            vout_mv: 10_000,
            max_current_ma: 800,
        })
        .await;
        rig.settle().await;

        let outcome = rig.handle(SourceEvent::WiredAttach { cable_id: 10 }).await;
        assert!(outcome.changed);
        assert_eq!(rig.classifier.active(), CableType::Otg);
        assert_eq!(
            rig.arbiter.with(|a| a.resolve_enable()),
            Some((VoterId::Cable, ChargeMode::BuckOff))
        );
    }

    #[tokio::test]
    async fn test_pd_contract_narrows_input_current() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WiredAttach { cable_id: 2 }).await;
        rig.settle().await;

        let outcome = rig
            .handle(SourceEvent::PdContract {
                max_voltage_mv: 9000,
                max_current_ma: 1500,
                apdo: false,
            })
            .await;
        assert!(outcome.changed);
        assert_eq!(rig.classifier.active(), CableType::Pd);
        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Cable, 1500)));
        assert_eq!(
            rig.resolved(DomainId::InputVoltage),
            Some((VoterId::Cable, 9000))
        );

        // Renegotiation keeps the classification but updates the limit
        rig.settle().await;
        let outcome = rig
            .handle(SourceEvent::PdContract {
                max_voltage_mv: 9000,
                max_current_ma: 1200,
                apdo: false,
            })
            .await;
        assert!(!outcome.changed);
        assert_eq!(rig.resolved(DomainId::Icl), Some((VoterId::Cable, 1200)));
        assert!(rig.arbiter.with(|a| a.has_pending()));
    }

    #[tokio::test]
    async fn test_pd_contract_without_wired_attachment_ignored() {
        let mut rig = Rig::new();
        rig.settle().await;

        let outcome = rig
            .handle(SourceEvent::PdContract {
                max_voltage_mv: 9000,
                max_current_ma: 2000,
                apdo: true,
            })
            .await;
        assert_eq!(outcome, ClassifyOutcome::default());
        assert_eq!(rig.classifier.active(), CableType::None);
        assert!(!rig.classifier.is_apdo());
    }

    #[tokio::test]
    async fn test_apdo_contract_flags_direct_charging() {
        let mut rig = Rig::new();
        rig.handle(SourceEvent::WiredAttach { cable_id: 2 }).await;
        rig.handle(SourceEvent::PdContract {
            max_voltage_mv: 9000,
            max_current_ma: 2750,
            apdo: true,
        })
        .await;

        assert_eq!(rig.classifier.active(), CableType::PdApdo);
        assert!(rig.classifier.is_apdo());

        // Detach drops the contract with the cable
        rig.handle(SourceEvent::WiredDetach).await;
        assert!(!rig.classifier.is_apdo());
        assert_eq!(rig.classifier.pd_contract(), None);
    }

    #[tokio::test]
    async fn test_ldo_blocked_suppresses_reenable() {
        let mut rig = Rig::new();
        rig.classifier.set_ldo_blocked(true);

        rig.handle(SourceEvent::WirelessAttach {
            kind: WirelessKind::Bpp,
            vout_mv: 5500,
            max_current_ma: 700,
        })
        .await;

        let writes = rig.wireless.writes();
        assert!(writes.contains(&RxWrite::Path(PowerPath::Wireless)));
        assert!(!writes.contains(&RxWrite::Ldo(true)));
    }
}
