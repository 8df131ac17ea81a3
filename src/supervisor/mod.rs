//! Charging supervision loop
//!
//! `ChargingSupervisor` owns the periodic monitor pass. One tick drains
//! queued source events through the classifier, refreshes telemetry,
//! re-evaluates thermal zones and charger health, advances the
//! full-charge machine, recomputes policy votes and commits the winners
//! to the charger in a single settle pass. The tick reports how soon the
//! caller should come back, so polling speeds up while a session is
//! active and drops to a slow heartbeat when nothing is attached.

pub mod battery;
pub mod notify;
pub mod properties;
#[cfg(feature = "embassy")]
pub mod task;

pub use battery::{BatteryHealth, BatterySnapshot, ChargeStatus, ChargeType, ChargingMode};
pub use notify::{Notice, NoticeChannel};

use crate::cable::{CableType, ClassifyOutcome, EventQueue, PowerSourceClassifier, SourceEvent};
use crate::config::{AgeStep, ChargeConfig};
use crate::core::events::{CurrentEvent, MiscEvent, TxEvent};
use crate::core::traits::SharedState;
use crate::devices::traits::{
    ChargeMode, Charger, ChargerHealth, Delay, DirectChargeStatus, FuelGauge, WirelessSource,
};
use crate::monitor::{
    check_recharge, FullChargeDetector, FullChargeInputs, FullStage, HealthMonitor, LrpEstimator,
    SafetyTimer, ThermalInputs, ThermalMonitor, ThermalZone,
};
use crate::tx::AovState;
use crate::vote::{apply_pending, DomainId, VoteArbiter, VoterId};

/// External controls and the source event intake.
///
/// Lives behind a [`SharedState`] so interrupt handlers and the system
/// surface can flip switches between ticks without touching the
/// supervisor itself.
#[derive(Debug)]
pub struct SupervisorControls {
    /// Attach and detach notifications waiting for the next tick
    pub events: EventQueue,
    /// Thermal throttle level, 100 and above means unthrottled
    pub siop_level: u8,
    /// Retail display mode, holds SOC inside a window
    pub store_mode: bool,
    /// Shipment suspension, input floored and charging off
    pub slate: bool,
    /// LCD state, feeds the safety timer stop condition
    pub display_on: bool,
    /// Battery present per the fuel gauge detection pin
    pub battery_present: bool,
    /// Set by the TX controller while power sharing runs
    pub tx_active: bool,
    /// USB stack requests accessory boost
    pub otg_boost: bool,
    /// Externally forced power stage mode, `None` when automatic
    pub forced_mode: Option<ChargeMode>,
}

impl SupervisorControls {
    pub const fn new() -> Self {
        Self {
            events: EventQueue::new(),
            siop_level: 100,
            store_mode: false,
            slate: false,
            display_on: false,
            battery_present: true,
            tx_active: false,
            otg_boost: false,
            forced_mode: None,
        }
    }
}

impl Default for SupervisorControls {
    fn default() -> Self {
        Self::new()
    }
}

/// Scalar controls compared across ticks for the skip check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlsView {
    siop_level: u8,
    store_mode: bool,
    slate: bool,
    display_on: bool,
    battery_present: bool,
    tx_active: bool,
    otg_boost: bool,
    forced_mode: Option<ChargeMode>,
}

impl ControlsView {
    fn of(controls: &SupervisorControls) -> Self {
        Self {
            siop_level: controls.siop_level,
            store_mode: controls.store_mode,
            slate: controls.slate,
            display_on: controls.display_on,
            battery_present: controls.battery_present,
            tx_active: controls.tx_active,
            otg_boost: controls.otg_boost,
            forced_mode: controls.forced_mode,
        }
    }
}

/// Device readings cached across ticks.
///
/// A failed read keeps the previous value, so one flaky transfer cannot
/// flip a thermal zone or terminate a charge.
#[derive(Debug, Clone, Copy)]
struct Telemetry {
    voltage_mv: i32,
    avg_voltage_mv: i32,
    current_ma: i32,
    avg_current_ma: i32,
    soc: u8,
    raw_temperature: i32,
    usb_temperature: i32,
    sub_temperature: i32,
    cycle_count: u16,
    gauge_full: bool,
    charger_health: ChargerHealth,
    charger_temperature: i32,
    charger_done: bool,
    direct_status: DirectChargeStatus,
    coil_temperature: i32,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            voltage_mv: 3900,
            avg_voltage_mv: 3900,
            current_ma: 0,
            avg_current_ma: 0,
            soc: 50,
            raw_temperature: 250,
            usb_temperature: 250,
            sub_temperature: 250,
            cycle_count: 0,
            gauge_full: false,
            charger_health: ChargerHealth::Good,
            charger_temperature: 250,
            charger_done: false,
            direct_status: DirectChargeStatus::Off,
            coil_temperature: 250,
        }
    }
}

/// What one tick decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Nothing changed recently, the pass was elided
    pub skipped: bool,
    /// The caller should re-tick soon instead of sleeping a full interval
    pub urgent: bool,
    /// Seconds until the next scheduled pass
    pub next_interval_s: u32,
}

/// The periodic decision engine.
///
/// Owns the charger, fuel gauge and wireless receiver devices plus all
/// per-session monitor state. Everything shared with other contexts, the
/// arbiter, controls and the published snapshot, comes in through
/// [`SharedState`] handles on each tick.
pub struct ChargingSupervisor<C, F, W, D> {
    charger: C,
    fuel_gauge: F,
    wireless: W,
    delay: D,
    config: ChargeConfig,
    classifier: PowerSourceClassifier,
    thermal: ThermalMonitor,
    lrp: LrpEstimator,
    full: FullChargeDetector,
    safety: SafetyTimer,
    health: HealthMonitor,
    telemetry: Telemetry,
    status: ChargeStatus,
    battery_health: BatteryHealth,
    mode: ChargingMode,
    current_events: CurrentEvent,
    misc_events: MiscEvent,
    age_step_index: usize,
    store_stopped: bool,
    ldo_blocked: bool,
    /// Full was declared at least once this attach session
    full_latched: bool,
    /// The second stage finished on its own terms, not on the stage timer
    full_time_full: bool,
    full_since_ms: u64,
    second_stage_since_ms: u64,
    max_charge_power_mw: i32,
    last_tick_ms: u64,
    last_controls: Option<ControlsView>,
}

impl<C, F, W, D> ChargingSupervisor<C, F, W, D>
where
    C: Charger,
    F: FuelGauge,
    W: WirelessSource,
    D: Delay,
{
    pub fn new(charger: C, fuel_gauge: F, wireless: W, delay: D, config: ChargeConfig) -> Self {
        Self {
            charger,
            fuel_gauge,
            wireless,
            delay,
            config,
            classifier: PowerSourceClassifier::new(),
            thermal: ThermalMonitor::new(),
            lrp: LrpEstimator::new(),
            full: FullChargeDetector::new(),
            safety: SafetyTimer::new(),
            health: HealthMonitor::new(),
            telemetry: Telemetry::default(),
            status: ChargeStatus::Discharging,
            battery_health: BatteryHealth::Good,
            mode: ChargingMode::None,
            current_events: CurrentEvent::empty(),
            misc_events: MiscEvent::empty(),
            age_step_index: 0,
            store_stopped: false,
            ldo_blocked: false,
            full_latched: false,
            full_time_full: false,
            full_since_ms: 0,
            second_stage_since_ms: 0,
            max_charge_power_mw: 0,
            last_tick_ms: 0,
            last_controls: None,
        }
    }

    pub fn config(&self) -> &ChargeConfig {
        &self.config
    }

    pub fn status(&self) -> ChargeStatus {
        self.status
    }

    pub fn charging_mode(&self) -> ChargingMode {
        self.mode
    }

    /// Direct charger access for host-side tooling and tests
    pub fn charger_mut(&mut self) -> &mut C {
        &mut self.charger
    }

    /// Direct fuel gauge access for host-side tooling and tests
    pub fn fuel_gauge_mut(&mut self) -> &mut F {
        &mut self.fuel_gauge
    }

    /// Direct wireless receiver access for host-side tooling and tests
    pub fn wireless_mut(&mut self) -> &mut W {
        &mut self.wireless
    }

    /// Runs one monitor pass.
    ///
    /// `now_ms` comes from the caller so the engine never reads a clock
    /// itself. The returned interval is advisory; an `urgent` outcome
    /// asks for a prompt re-tick on top of the normal cadence.
    pub async fn tick<SA, SC, SB>(
        &mut self,
        arbiter: &SA,
        controls: &SC,
        snapshot: &SB,
        now_ms: u64,
    ) -> TickOutcome
    where
        SA: SharedState<VoteArbiter>,
        SC: SharedState<SupervisorControls>,
        SB: SharedState<BatterySnapshot>,
    {
        let (view, has_events) = controls.with(|c| (ControlsView::of(c), !c.events.is_empty()));

        if self.can_skip(now_ms, has_events, &view) {
            crate::log_trace!("monitor pass skipped, nothing changed");
            return TickOutcome {
                skipped: true,
                urgent: false,
                next_interval_s: self.next_interval_s(&view),
            };
        }

        while let Some(event) = controls.with_mut(|c| c.events.pop()) {
            let outcome = self
                .classifier
                .handle_event(
                    event,
                    &self.config,
                    arbiter,
                    &mut self.charger,
                    &mut self.wireless,
                    &mut self.delay,
                )
                .await;
            self.absorb_classification(arbiter, outcome);
        }
        if let Some(event) = self.wireless_upgrade_event().await {
            let outcome = self
                .classifier
                .handle_event(
                    event,
                    &self.config,
                    arbiter,
                    &mut self.charger,
                    &mut self.wireless,
                    &mut self.delay,
                )
                .await;
            self.absorb_classification(arbiter, outcome);
        }

        let active = self.classifier.active();
        if active.is_charging_source() {
            if self.mode == ChargingMode::None && !self.full_latched {
                self.mode = ChargingMode::Checking;
            }
        } else if self.mode != ChargingMode::None || self.full_latched {
            // Still attached but no longer a sink (fake pad, OTG)
            arbiter.with_mut(|a| self.end_session(a));
        }
        self.misc_events
            .set(MiscEvent::TIMEOUT_CABLE, active == CableType::Timeout);

        let wireless_attached = self.classifier.wireless_kind().is_some();
        self.refresh_telemetry(wireless_attached).await;

        let effective_temp = if self.classifier.is_apdo() {
            self.lrp.update(
                self.telemetry.raw_temperature,
                self.telemetry.sub_temperature,
                now_ms,
                &self.config.thermal,
            )
        } else {
            self.lrp.reset();
            self.telemetry.raw_temperature
        };

        let inputs = ThermalInputs {
            battery_temp: effective_temp,
            usb_temp: self.telemetry.usb_temperature,
            charger_temp: self.telemetry.charger_temperature,
            coil_temp: self.telemetry.coil_temperature,
            battery_voltage_mv: self.telemetry.voltage_mv,
            wireless_active: active.is_wireless() && active.is_charging_source(),
        };
        let stop_condition = view.display_on || view.tx_active;

        let (decision, health_changed, reset_gauge_full, expired_now) =
            arbiter.with_mut(|a| {
                let decision =
                    self.thermal
                        .evaluate(&inputs, &self.config.thermal, a, &mut self.current_events);
                let health_changed = self.health.evaluate(self.telemetry.charger_health, a);
                let reset_gauge_full = self.step_charging_machine(a, now_ms);
                let expired_now = self.safety.tick(
                    self.telemetry.current_ma,
                    stop_condition,
                    now_ms,
                    &self.config.safety,
                );
                if expired_now {
                    self.on_safety_expired();
                }
                self.cast_policy_votes(a, &view);
                a.cast_enable(
                    VoterId::SafetyTimer,
                    self.safety.is_expired(),
                    ChargeMode::ChargingOff,
                );
                self.current_events
                    .set(CurrentEvent::SAFETY_TIMER_EXPIRED, self.safety.is_expired());
                (decision, health_changed, reset_gauge_full, expired_now)
            });

        if reset_gauge_full && self.fuel_gauge.reset_charge_full().await.is_err() {
            crate::log_warn!("fuel gauge full marker reset failed");
        }
        self.sync_wireless_ldo(active).await;

        let apply = apply_pending(arbiter, &mut self.charger).await;

        let (resolved_fcc, source_power_mw) = arbiter.with(|a| {
            let fcc = a.resolve(DomainId::Fcc).map(|r| r.value);
            let power = match (
                a.resolve(DomainId::InputVoltage),
                a.resolve(DomainId::Icl),
            ) {
                (Some(iv), Some(icl)) => Some(iv.value * icl.value / 1000),
                _ => None,
            };
            (fcc, power)
        });
        if active.is_charging_source() {
            if let Some(power) = source_power_mw {
                if power > self.max_charge_power_mw {
                    self.max_charge_power_mw = power;
                }
            }
        }

        self.update_status(decision.charging_blocked, &view);

        let mut published = self.build_snapshot(&view, resolved_fcc, effective_temp);
        snapshot.with_mut(|s| {
            // the TX loop owns its two snapshot fields
            published.tx_events = s.tx_events;
            published.aov_state = s.aov_state;
            *s = published;
        });

        self.last_tick_ms = now_ms;
        self.last_controls = Some(view);

        TickOutcome {
            skipped: false,
            urgent: health_changed || expired_now || apply.chg_en_failed,
            next_interval_s: self.next_interval_s(&view),
        }
    }

    /// A pass can be elided when no events are queued, no control moved
    /// and the last full pass is recent. Never taken on the fault or
    /// direct-charge cadence, those exist to observe device state that
    /// changes without any notification.
    fn can_skip(&self, now_ms: u64, has_events: bool, view: &ControlsView) -> bool {
        if has_events {
            return false;
        }
        if self.health.current() != ChargerHealth::Good
            || self.classifier.is_apdo()
            || view.tx_active
        {
            return false;
        }
        let Some(previous) = self.last_controls else {
            return false;
        };
        if previous != *view {
            return false;
        }
        now_ms.saturating_sub(self.last_tick_ms) < self.config.skip_window_ms
    }

    fn next_interval_s(&self, view: &ControlsView) -> u32 {
        if self.health.current() != ChargerHealth::Good {
            return self.config.poll_interval_fault_s;
        }
        if self.classifier.is_apdo() || view.tx_active {
            return self.config.poll_interval_busy_s;
        }
        if self.mode.is_active() || self.mode == ChargingMode::Checking {
            return self.config.poll_interval_charging_s;
        }
        self.config.poll_interval_s
    }

    fn absorb_classification<S: SharedState<VoteArbiter>>(
        &mut self,
        arbiter: &S,
        outcome: ClassifyOutcome,
    ) {
        if outcome.cleared_limits {
            // Heat history belongs to the path we just left
            self.max_charge_power_mw = 0;
            self.thermal.clear_limits();
        }
        if outcome.fully_detached {
            arbiter.with_mut(|a| self.end_session(a));
        }
    }

    /// A pad can re-authenticate mid-session and unlock a better power
    /// profile. Fold a changed class back in as a fresh attach.
    async fn wireless_upgrade_event(&mut self) -> Option<SourceEvent> {
        let current = self.classifier.wireless_kind()?;
        match self.wireless.receiver_kind().await {
            Ok(Some(kind)) if kind != current => {
                let (vout_mv, max_current_ma) = self.config.wireless_operating_point(kind);
                crate::log_info!("wireless class change {:?} -> {:?}", current, kind);
                Some(SourceEvent::WirelessAttach {
                    kind,
                    vout_mv,
                    max_current_ma,
                })
            }
            Ok(_) => None,
            Err(_) => {
                crate::log_warn!("wireless class read failed");
                None
            }
        }
    }

    async fn refresh_telemetry(&mut self, wireless_attached: bool) {
        match self.fuel_gauge.voltage_now_mv().await {
            Ok(mv) => self.telemetry.voltage_mv = mv,
            Err(_) => crate::log_warn!("voltage read failed, holding last value"),
        }
        match self.fuel_gauge.voltage_avg_mv().await {
            Ok(mv) => self.telemetry.avg_voltage_mv = mv,
            Err(_) => crate::log_warn!("avg voltage read failed, holding last value"),
        }
        match self.fuel_gauge.current_now_ma().await {
            Ok(ma) => self.telemetry.current_ma = ma,
            Err(_) => crate::log_warn!("current read failed, holding last value"),
        }
        match self.fuel_gauge.current_avg_ma().await {
            Ok(ma) => self.telemetry.avg_current_ma = ma,
            Err(_) => crate::log_warn!("avg current read failed, holding last value"),
        }
        match self.fuel_gauge.capacity_percent().await {
            Ok(soc) => self.telemetry.soc = soc,
            Err(_) => crate::log_warn!("soc read failed, holding last value"),
        }
        match self.fuel_gauge.temperature().await {
            Ok(t) => self.telemetry.raw_temperature = t,
            Err(_) => crate::log_warn!("battery temp read failed, holding last value"),
        }
        match self.fuel_gauge.usb_temperature().await {
            Ok(t) => self.telemetry.usb_temperature = t,
            Err(_) => crate::log_warn!("usb temp read failed, holding last value"),
        }
        match self.fuel_gauge.sub_temperature().await {
            Ok(t) => self.telemetry.sub_temperature = t,
            Err(_) => crate::log_warn!("sub temp read failed, holding last value"),
        }
        match self.fuel_gauge.cycle_count().await {
            Ok(n) => self.telemetry.cycle_count = n,
            Err(_) => crate::log_warn!("cycle count read failed, holding last value"),
        }
        match self.fuel_gauge.is_charge_full().await {
            Ok(full) => self.telemetry.gauge_full = full,
            Err(_) => crate::log_warn!("gauge full flag read failed, holding last value"),
        }
        match self.charger.health().await {
            Ok(health) => self.telemetry.charger_health = health,
            Err(_) => crate::log_warn!("charger health read failed, holding last value"),
        }
        match self.charger.temperature().await {
            Ok(t) => self.telemetry.charger_temperature = t,
            Err(_) => crate::log_warn!("charger temp read failed, holding last value"),
        }
        match self.charger.is_charging_done().await {
            Ok(done) => self.telemetry.charger_done = done,
            Err(_) => crate::log_warn!("charger done flag read failed, holding last value"),
        }
        match self.charger.direct_charge_status().await {
            Ok(status) => self.telemetry.direct_status = status,
            Err(_) => crate::log_warn!("direct charge status read failed, holding last value"),
        }
        if wireless_attached {
            match self.wireless.coil_temperature().await {
                Ok(t) => self.telemetry.coil_temperature = t,
                Err(_) => crate::log_warn!("coil temp read failed, holding last value"),
            }
        }
    }

    /// Advances the charging mode machine.
    ///
    /// Returns true when the fuel gauge full marker must be cleared,
    /// which happens on the transition into recharging.
    fn step_charging_machine(&mut self, a: &mut VoteArbiter, now_ms: u64) -> bool {
        match self.mode {
            ChargingMode::None => {
                if !self.full_latched {
                    return false;
                }
                let step = self.age_step();
                let swelling = self
                    .current_events
                    .intersects(CurrentEvent::SWELLING_COOL | CurrentEvent::SWELLING_WARM);
                let threshold = if swelling {
                    self.config.thermal.swelling_recharge_voltage_mv
                } else {
                    step.recharge_voltage_mv
                };
                let inputs = self.full_inputs(&step);
                let timer_round = !self.full_time_full
                    && now_ms.saturating_sub(self.full_since_ms)
                        >= u64::from(self.config.safety.second_stage_timer_s) * 1000;
                if check_recharge(
                    self.config.safety.recharge_check,
                    &inputs,
                    threshold,
                    self.config.safety.recharge_soc,
                ) || timer_round
                {
                    self.begin_recharging(a, now_ms);
                    return true;
                }
                false
            }
            ChargingMode::Checking => {
                self.begin_first_stage(a, now_ms);
                false
            }
            ChargingMode::First | ChargingMode::Recharging => {
                let step = self.age_step();
                let inputs = self.full_inputs(&step);
                if self
                    .full
                    .check_full(FullStage::First, &inputs, &self.config.safety, now_ms)
                {
                    self.enter_second_stage(a, now_ms);
                }
                false
            }
            ChargingMode::Second => {
                let step = self.age_step();
                let inputs = self.full_inputs(&step);
                let stage_elapsed = now_ms.saturating_sub(self.second_stage_since_ms)
                    >= u64::from(self.config.safety.second_stage_timer_s) * 1000;
                if self
                    .full
                    .check_full(FullStage::Second, &inputs, &self.config.safety, now_ms)
                {
                    self.finish_full(a, now_ms, true);
                } else if stage_elapsed {
                    crate::log_info!("second charge stage timer elapsed, reporting full");
                    self.finish_full(a, now_ms, false);
                }
                false
            }
        }
    }

    fn begin_first_stage(&mut self, a: &mut VoteArbiter, now_ms: u64) {
        crate::log_info!("charging session started");
        self.mode = ChargingMode::First;
        self.full_latched = false;
        self.full_time_full = false;
        self.full.reset();
        self.full.note_charging_started(now_ms);
        self.safety.start(self.config.safety.expired_time_ms, now_ms);
        a.cast_enable(VoterId::FullCharge, false, ChargeMode::ChargingOff);
        a.cast(DomainId::Topoff, VoterId::FullCharge, false, 0);
    }

    fn enter_second_stage(&mut self, a: &mut VoteArbiter, now_ms: u64) {
        crate::log_info!("battery full, entering topoff stage");
        self.mode = ChargingMode::Second;
        self.full_latched = true;
        self.second_stage_since_ms = now_ms;
        self.full.reset();
        self.full.note_charging_started(now_ms);
        a.cast(
            DomainId::Topoff,
            VoterId::FullCharge,
            true,
            self.config.safety.topoff_current_ma,
        );
    }

    fn finish_full(&mut self, a: &mut VoteArbiter, now_ms: u64, proper: bool) {
        crate::log_info!("charging terminated on full battery");
        self.mode = ChargingMode::None;
        self.full_time_full = proper;
        self.full_since_ms = now_ms;
        self.full.reset();
        self.safety.stop();
        a.cast_enable(VoterId::FullCharge, true, ChargeMode::ChargingOff);
        a.cast(DomainId::Topoff, VoterId::FullCharge, false, 0);
    }

    fn begin_recharging(&mut self, a: &mut VoteArbiter, now_ms: u64) {
        crate::log_info!("recharge threshold crossed, charging again");
        self.mode = ChargingMode::Recharging;
        self.full.reset();
        self.full.note_charging_started(now_ms);
        self.safety
            .start(self.config.safety.recharging_expired_time_ms, now_ms);
        a.cast_enable(VoterId::FullCharge, false, ChargeMode::ChargingOff);
        a.cast(DomainId::Topoff, VoterId::FullCharge, false, 0);
    }

    fn on_safety_expired(&mut self) {
        self.mode = ChargingMode::None;
        self.full_latched = false;
        self.full.reset();
    }

    /// Tears down per-session state. Runs on detach and when the active
    /// source stops being a sink.
    fn end_session(&mut self, a: &mut VoteArbiter) {
        crate::log_info!("charging session ended");
        self.mode = ChargingMode::None;
        self.full_latched = false;
        self.full_time_full = false;
        self.full.reset();
        self.safety = SafetyTimer::new();
        self.lrp.reset();
        self.max_charge_power_mw = 0;
        self.ldo_blocked = false;
        self.classifier.set_ldo_blocked(false);
        a.cast_enable(VoterId::FullCharge, false, ChargeMode::ChargingOff);
        a.cast(DomainId::Topoff, VoterId::FullCharge, false, 0);
        a.cast_enable(VoterId::SafetyTimer, false, ChargeMode::ChargingOff);
    }

    fn age_step(&self) -> AgeStep {
        let cfg = &self.config.safety;
        match cfg.age_step(self.age_step_index) {
            Some(step) => *step,
            None => AgeStep {
                cycle: 0,
                float_voltage_mv: self.config.float_voltage_mv,
                recharge_voltage_mv: cfg.recharge_voltage_mv,
                full_condition_mv: cfg.full_condition_mv,
                full_condition_soc: cfg.full_condition_soc,
            },
        }
    }

    fn full_inputs(&self, step: &AgeStep) -> FullChargeInputs {
        FullChargeInputs {
            soc: self.telemetry.soc,
            voltage_mv: self.telemetry.voltage_mv,
            avg_voltage_mv: self.telemetry.avg_voltage_mv,
            current_ma: self.telemetry.current_ma,
            avg_current_ma: self.telemetry.avg_current_ma,
            charger_reports_done: self.telemetry.charger_done,
            gauge_reports_full: self.telemetry.gauge_full,
            condition_soc: step.full_condition_soc,
            condition_mv: step.full_condition_mv,
        }
    }

    fn cast_policy_votes(&mut self, a: &mut VoteArbiter, view: &ControlsView) {
        let active = self.classifier.active();

        match self.config.siop.lookup(view.siop_level) {
            Some(entry) => {
                let (icl, fcc) = if active.is_wireless() {
                    (entry.wireless_icl_ma, entry.wireless_fcc_ma)
                } else {
                    (entry.wired_icl_ma, entry.wired_fcc_ma)
                };
                a.cast(DomainId::Icl, VoterId::Siop, true, icl);
                a.cast(DomainId::Fcc, VoterId::Siop, true, fcc);
            }
            None => {
                a.cast(DomainId::Icl, VoterId::Siop, false, 0);
                a.cast(DomainId::Fcc, VoterId::Siop, false, 0);
            }
        }

        if view.store_mode {
            let cfg = &self.config.safety;
            if self.store_stopped {
                if self.telemetry.soc <= cfg.store_mode_min_soc {
                    crate::log_info!("store mode window floor reached, charging resumes");
                    self.store_stopped = false;
                }
            } else if self.telemetry.soc >= cfg.store_mode_max_soc {
                crate::log_info!("store mode window ceiling reached, charging stops");
                self.store_stopped = true;
            }
        } else {
            self.store_stopped = false;
        }
        self.misc_events.set(MiscEvent::STORE_MODE, view.store_mode);
        self.misc_events
            .set(MiscEvent::FULL_CAPACITY, self.store_stopped);
        a.cast_enable(VoterId::StoreMode, self.store_stopped, ChargeMode::ChargingOff);

        a.cast_enable(VoterId::Slate, view.slate, ChargeMode::ChargingOff);
        a.cast(
            DomainId::Icl,
            VoterId::Slate,
            view.slate,
            self.config.fallback_input_ma,
        );
        self.current_events.set(CurrentEvent::SLATE, view.slate);

        a.cast_enable(VoterId::Otg, view.otg_boost, ChargeMode::BuckOff);

        match view.forced_mode {
            Some(mode) => a.cast_enable(VoterId::ChangeChargeMode, true, mode),
            None => a.cast_enable(VoterId::ChangeChargeMode, false, ChargeMode::ChargingOff),
        }

        a.cast_enable(VoterId::NoBattery, !view.battery_present, ChargeMode::ChargingOff);

        self.refresh_age_step(a);
        self.misc_events.set(
            MiscEvent::SWELLING,
            self.current_events
                .intersects(CurrentEvent::SWELLING_COOL | CurrentEvent::SWELLING_WARM),
        );
    }

    fn refresh_age_step(&mut self, a: &mut VoteArbiter) {
        let cycles = self.telemetry.cycle_count;
        let mut index = 0;
        for (i, step) in self.config.safety.age_steps.iter().enumerate() {
            if cycles >= step.cycle {
                index = i;
            }
        }
        if index != self.age_step_index {
            crate::log_info!("battery aging step {} at {} cycles", index, cycles);
            self.age_step_index = index;
        }
        self.current_events
            .set(CurrentEvent::AGING_STEP, index > 0);
        let step = self.age_step();
        a.cast(
            DomainId::FloatVoltage,
            VoterId::Aging,
            true,
            step.float_voltage_mv,
        );
    }

    /// Store mode on a pad also drops the rectifier LDO so the phone
    /// runs from the battery while parked at the window ceiling.
    async fn sync_wireless_ldo(&mut self, active: CableType) {
        let block = self.store_stopped && active.is_wireless() && active.is_charging_source();
        if block == self.ldo_blocked {
            return;
        }
        self.ldo_blocked = block;
        self.classifier.set_ldo_blocked(block);
        if active.is_wireless() && active.is_charging_source() {
            if self.wireless.set_ldo_enabled(!block).await.is_err() {
                crate::log_warn!("wireless ldo write failed");
            }
            if block {
                crate::log_info!("store mode ceiling, wireless ldo off");
            } else {
                crate::log_info!("wireless ldo restored");
            }
        }
    }

    fn update_status(&mut self, thermal_blocked: bool, view: &ControlsView) {
        self.battery_health = if !view.battery_present {
            BatteryHealth::NoBattery
        } else if self.safety.is_expired() {
            BatteryHealth::SafetyTimerExpire
        } else {
            match self.health.current() {
                ChargerHealth::WatchdogExpired => BatteryHealth::WatchdogExpire,
                ChargerHealth::OverVoltage => BatteryHealth::OverVoltage,
                ChargerHealth::UnderVoltage => BatteryHealth::UnderVoltage,
                ChargerHealth::Good => match self.thermal.zone() {
                    ThermalZone::Cold => BatteryHealth::Cold,
                    ThermalZone::Overheat | ThermalZone::OverheatLimit => BatteryHealth::Overheat,
                    _ => BatteryHealth::Good,
                },
            }
        };

        let active = self.classifier.active();
        let forced_off = matches!(
            view.forced_mode,
            Some(ChargeMode::ChargingOff | ChargeMode::BuckOff)
        );
        self.status = if !active.is_charging_source() {
            ChargeStatus::Discharging
        } else if self.battery_health != BatteryHealth::Good {
            ChargeStatus::NotCharging
        } else if thermal_blocked || self.store_stopped || view.slate || forced_off {
            ChargeStatus::NotCharging
        } else if self.full_latched {
            ChargeStatus::Full
        } else if self.mode.is_active() || self.mode == ChargingMode::Checking {
            ChargeStatus::Charging
        } else {
            ChargeStatus::NotCharging
        };
    }

    fn build_snapshot(
        &self,
        view: &ControlsView,
        resolved_fcc: Option<i32>,
        effective_temp: i32,
    ) -> BatterySnapshot {
        let active = self.classifier.active();
        let direct_active = self.classifier.is_apdo()
            && !matches!(self.telemetry.direct_status, DirectChargeStatus::Off);
        BatterySnapshot {
            status: self.status,
            health: self.battery_health,
            cable: active,
            charge_type: ChargeType::from_cable(active, direct_active),
            charging_mode: self.mode,
            battery_present: view.battery_present,
            soc: self.telemetry.soc,
            voltage_mv: self.telemetry.voltage_mv,
            avg_voltage_mv: self.telemetry.avg_voltage_mv,
            current_ma: self.telemetry.current_ma,
            avg_current_ma: self.telemetry.avg_current_ma,
            temperature: effective_temp,
            raw_temperature: self.telemetry.raw_temperature,
            thermal_zone: self.thermal.zone(),
            cycle_count: self.telemetry.cycle_count,
            time_to_full_s: self.time_to_full_s(resolved_fcc),
            max_charge_power_mw: self.max_charge_power_mw,
            safety_remaining_ms: self.safety.remaining_ms(),
            siop_level: view.siop_level,
            current_events: self.current_events,
            misc_events: self.misc_events,
            tx_events: TxEvent::empty(),
            aov_state: AovState::None,
        }
    }

    fn time_to_full_s(&self, resolved_fcc: Option<i32>) -> Option<u32> {
        if self.status != ChargeStatus::Charging {
            return None;
        }
        let fcc = resolved_fcc.filter(|ma| *ma > 0)?;
        let soc = i64::from(self.telemetry.soc.min(100));
        let remaining_mah = i64::from(self.config.battery_capacity_mah) * (100 - soc) / 100;
        Some((remaining_mah * 3600 / i64::from(fcc)) as u32)
    }
}
