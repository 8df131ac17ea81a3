//! End-to-end charging scenarios driven through the public surface.
//!
//! Each test wires the supervisor to the mock devices and walks a whole
//! session: attach, arbitration, hardware commit, publish, query. Anything
//! narrower lives in the unit tests next to the modules.

use charge_guard::cable::{CableType, SourceEvent, WirelessKind};
use charge_guard::config::{ChargeConfig, ThermalConfig};
use charge_guard::core::events::{CurrentEvent, TxEvent};
use charge_guard::core::traits::{MockState, SharedState};
use charge_guard::devices::mock::{
    ChargerWrite, MockCharger, MockDelay, MockFuelGauge, MockWirelessSource, MockWirelessTxPort,
    RxWrite,
};
use charge_guard::devices::traits::{ChargeMode, PowerPath};
use charge_guard::monitor::{ThermalInputs, ThermalMonitor, ThermalZone};
use charge_guard::supervisor::properties::{self, Property, PropertyValue, PsyClass};
use charge_guard::supervisor::{
    BatterySnapshot, ChargeStatus, ChargeType, ChargingSupervisor, SupervisorControls, TickOutcome,
};
use charge_guard::tx::{AovState, WirelessTxController};
use charge_guard::vote::{DomainId, VoteArbiter, VoterId};

struct Bench {
    supervisor: ChargingSupervisor<MockCharger, MockFuelGauge, MockWirelessSource, MockDelay>,
    arbiter: MockState<VoteArbiter>,
    controls: MockState<SupervisorControls>,
    snapshot: MockState<BatterySnapshot>,
    now_ms: u64,
}

impl Bench {
    fn new() -> Self {
        let config = ChargeConfig::default();
        let fallback = config.fallback_input_ma;
        Self {
            supervisor: ChargingSupervisor::new(
                MockCharger::new(),
                MockFuelGauge::new(),
                MockWirelessSource::new(),
                MockDelay::new(),
                config,
            ),
            arbiter: MockState::new(VoteArbiter::new(fallback)),
            controls: MockState::new(SupervisorControls::new()),
            snapshot: MockState::new(BatterySnapshot::default()),
            now_ms: 0,
        }
    }

    async fn tick_after(&mut self, ms: u64) -> TickOutcome {
        self.now_ms += ms;
        self.supervisor
            .tick(&self.arbiter, &self.controls, &self.snapshot, self.now_ms)
            .await
    }

    fn push(&mut self, event: SourceEvent) {
        self.controls.with_mut(|c| {
            c.events.push(event);
        });
    }

    fn resolved(&self, domain: DomainId) -> Option<(VoterId, i32)> {
        self.arbiter
            .with(|a| a.resolve(domain).map(|r| (r.voter, r.value)))
    }

    fn enabled(&self) -> Option<(VoterId, ChargeMode)> {
        self.arbiter.with(|a| a.resolve_enable())
    }

    fn snap(&self) -> BatterySnapshot {
        self.snapshot.with(|s| *s)
    }
}

#[tokio::test]
async fn scenario_usb_session_from_attach_to_detach() {
    let mut bench = Bench::new();
    bench.supervisor.fuel_gauge_mut().set_current_ma(450);
    bench.push(SourceEvent::WiredAttach { cable_id: 2 });

    let outcome = bench.tick_after(1000).await;

    assert!(!outcome.skipped);
    assert_eq!(outcome.next_interval_s, 10);
    let snap = bench.snap();
    assert_eq!(snap.cable, CableType::Usb);
    assert_eq!(snap.status, ChargeStatus::Charging);
    assert_eq!(snap.charge_type, ChargeType::Slow);
    assert_eq!(snap.max_charge_power_mw, 2500);
    assert!(snap.time_to_full_s.is_some());
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Cable, 500)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::Cable, 500)));
    assert_eq!(
        bench.resolved(DomainId::InputVoltage),
        Some((VoterId::Cable, 5000))
    );
    assert_eq!(bench.enabled(), Some((VoterId::Cable, ChargeMode::Charging)));

    // the USB node reports the session, the mains node stays dark
    assert_eq!(
        properties::query(&snap, PsyClass::Usb, Property::Online),
        Some(PropertyValue::Bool(true))
    );
    assert_eq!(
        properties::query(&snap, PsyClass::Ac, Property::Online),
        Some(PropertyValue::Bool(false))
    );

    bench.push(SourceEvent::WiredDetach);
    bench.tick_after(1000).await;

    let snap = bench.snap();
    assert_eq!(snap.cable, CableType::None);
    assert_eq!(snap.status, ChargeStatus::Discharging);
    assert_eq!(snap.charge_type, ChargeType::None);
    assert_eq!(snap.max_charge_power_mw, 0);
    // down to the floor voter, with the path held off
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Fallback, 100)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::Fallback, 100)));
    assert_eq!(
        bench.enabled(),
        Some((VoterId::Cable, ChargeMode::ChargingOff))
    );
    assert_eq!(
        properties::query(&snap, PsyClass::Usb, Property::Online),
        Some(PropertyValue::Bool(false))
    );
}

#[tokio::test]
async fn scenario_wireless_pad_yields_to_stronger_wired() {
    let mut bench = Bench::new();
    bench.supervisor.fuel_gauge_mut().set_current_ma(600);
    bench.supervisor.wireless_mut().set_online(true);
    bench
        .supervisor
        .wireless_mut()
        .set_kind(Some(WirelessKind::Bpp));
    bench.push(SourceEvent::WirelessAttach {
        kind: WirelessKind::Bpp,
        vout_mv: 5500,
        max_current_ma: 700,
    });

    bench.tick_after(1000).await;

    let snap = bench.snap();
    assert_eq!(snap.cable, CableType::Wireless);
    assert_eq!(snap.max_charge_power_mw, 3850);
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Cable, 1100)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::Cable, 700)));

    // a 9 V adapter outpowers the 5.5 V pad, so the wired path takes over
    bench.push(SourceEvent::WiredAttach { cable_id: 5 });
    bench.tick_after(5000).await;

    let snap = bench.snap();
    assert_eq!(snap.cable, CableType::HvTa);
    assert_eq!(snap.charge_type, ChargeType::HvFast);
    assert_eq!(snap.max_charge_power_mw, 14_850);
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Cable, 2750)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::Cable, 1650)));
    assert_eq!(
        bench.resolved(DomainId::InputVoltage),
        Some((VoterId::Cable, 9000))
    );

    let rx_writes = bench.supervisor.wireless_mut().writes();
    assert!(rx_writes.contains(&RxWrite::Path(PowerPath::Wired)));

    // fast charge was pinned low for the switch and restored afterwards
    let writes = bench.supervisor.charger_mut().writes();
    let pin = writes
        .iter()
        .position(|w| *w == ChargerWrite::FastCharging(400))
        .unwrap();
    let restored = writes
        .iter()
        .rposition(|w| *w == ChargerWrite::FastCharging(2750))
        .unwrap();
    assert!(pin < restored);

    // the pad is still physically present but no longer the supply
    assert_eq!(
        properties::query(&snap, PsyClass::Wireless, Property::Online),
        Some(PropertyValue::Bool(false))
    );
    assert_eq!(
        properties::query(&snap, PsyClass::Ac, Property::MaxChargePower),
        Some(PropertyValue::Milliwatts(14_850))
    );
}

#[tokio::test]
async fn scenario_power_share_caps_wired_charging() {
    let mut bench = Bench::new();
    bench.supervisor.fuel_gauge_mut().capacity_percent = 60;
    bench.supervisor.fuel_gauge_mut().set_current_ma(1800);
    bench.push(SourceEvent::WiredAttach { cable_id: 4 });
    bench.tick_after(1000).await;
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Cable, 2100)));

    let mut tx = WirelessTxController::new(MockWirelessTxPort::new(), ChargeConfig::default().tx);
    tx.request_enable(true);
    let outcome = tx
        .tick(&bench.arbiter, &bench.controls, &bench.snapshot, bench.now_ms)
        .await;

    assert!(outcome.transmitting);
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::TxShare, 1000)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::TxShare, 800)));
    assert!(bench.controls.with(|c| c.tx_active));

    // the supervisor commits the shared limits and tightens its cadence
    bench.supervisor.charger_mut().clear_writes();
    let outcome = bench.tick_after(1000).await;
    assert!(!outcome.skipped);
    assert_eq!(outcome.next_interval_s, 3);
    let writes = bench.supervisor.charger_mut().writes();
    assert!(writes.contains(&ChargerWrite::FastCharging(1000)));
    assert!(writes.contains(&ChargerWrite::InputCurrent(800)));

    let snap = bench.snap();
    assert_eq!(snap.aov_state, AovState::Preset);
    assert!(snap.tx_events.contains(TxEvent::TX_STATUS));
    assert_eq!(
        properties::query(&snap, PsyClass::Wireless, Property::TxState),
        Some(PropertyValue::TxState(AovState::Preset))
    );

    tx.request_enable(false);
    let outcome = tx
        .tick(&bench.arbiter, &bench.controls, &bench.snapshot, bench.now_ms)
        .await;

    assert!(!outcome.transmitting);
    assert!(!bench.controls.with(|c| c.tx_active));
    assert_eq!(bench.resolved(DomainId::Fcc), Some((VoterId::Cable, 2100)));
    assert_eq!(bench.resolved(DomainId::Icl), Some((VoterId::Cable, 1500)));
}

#[test]
fn vote_resolution_is_independent_of_cast_order() {
    let votes = [
        (VoterId::Cable, 1500),
        (VoterId::ChgThermal, 900),
        (VoterId::Siop, 1200),
        (VoterId::Swelling, 700),
    ];

    let mut forward = VoteArbiter::new(100);
    let mut reverse = VoteArbiter::new(100);
    forward.cast(DomainId::Fcc, VoterId::Fallback, false, 0);
    reverse.cast(DomainId::Fcc, VoterId::Fallback, false, 0);
    for (voter, value) in votes {
        forward.cast(DomainId::Fcc, voter, true, value);
    }
    for (voter, value) in votes.iter().rev() {
        reverse.cast(DomainId::Fcc, *voter, true, *value);
    }

    let resolve = |a: &VoteArbiter| a.resolve(DomainId::Fcc).map(|r| (r.voter, r.value));
    assert_eq!(resolve(&forward), resolve(&reverse));
    assert_eq!(resolve(&forward), Some((VoterId::Swelling, 700)));

    // a profile override wins even against a numerically lower reduction
    forward.cast(DomainId::Fcc, VoterId::Select, true, 3000);
    assert_eq!(resolve(&forward), Some((VoterId::Select, 3000)));
    forward.cast(DomainId::Fcc, VoterId::Select, false, 0);
    assert_eq!(resolve(&forward), Some((VoterId::Swelling, 700)));
}

#[test]
fn zone_boundary_crossing_does_not_chatter() {
    let config = ThermalConfig::default();
    let mut monitor = ThermalMonitor::new();
    let mut arbiter = VoteArbiter::new(100);
    let mut events = CurrentEvent::empty();

    // up through 450, then hovering inside the 20-tenths hysteresis band
    let sweep = [300, 448, 455, 449, 431, 430, 380];
    let mut changes = 0;
    for temp in sweep {
        let inputs = ThermalInputs {
            battery_temp: temp,
            usb_temp: 300,
            charger_temp: 300,
            coil_temp: 250,
            battery_voltage_mv: 4000,
            wireless_active: false,
        };
        let decision = monitor.evaluate(&inputs, &config, &mut arbiter, &mut events);
        if decision.zone_changed {
            changes += 1;
        }
    }

    assert_eq!(changes, 2);
    assert_eq!(monitor.zone(), ThermalZone::Normal);
}
