//! Charging parameter arbitration
//!
//! Many subsystems want a say in the charging parameters at once: the cable
//! wants 2100 mA, the thermal monitor wants 900, the throttle table wants
//! 1200. Each casts a named vote per domain; the arbiter reduces every
//! domain to exactly one effective value. Numeric domains take the minimum
//! over enabled voters (override tiers excepted), the charge-enable domain
//! is strictly priority ordered.
//!
//! Resolution never touches hardware. The supervisor reads `take_pending`
//! after releasing the arbiter lock, performs the device writes, and records
//! each success with `mark_applied`; a failed write simply stays pending and
//! is retried on the next tick.

pub mod apply;
pub mod domain;
pub mod voter;

pub use apply::{apply_pending, ApplyOutcome};
pub use domain::{DomainId, Resolution};
pub use voter::{VoterId, NUM_VOTERS};

use crate::devices::traits::ChargeMode;
use domain::{EnableDomain, NumericDomain};
use heapless::Vec;

/// One hardware write owed by the apply path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DomainValue {
    /// Fast-charge current, mA
    Fcc(i32),
    /// Input current limit, mA
    Icl(i32),
    /// Float voltage, mV
    FloatVoltage(i32),
    /// Input voltage, mV
    InputVoltage(i32),
    /// Termination current, mA
    Topoff(i32),
    /// Power stage mode
    ChargeEnable(ChargeMode),
}

/// Maximum writes one apply pass can owe (one per domain)
pub const MAX_PENDING: usize = 6;

/// Named-parameter arbitration over the six charging domains
#[derive(Debug)]
pub struct VoteArbiter {
    fcc: NumericDomain,
    icl: NumericDomain,
    fv: NumericDomain,
    iv: NumericDomain,
    topoff: NumericDomain,
    chg_en: EnableDomain,
}

impl VoteArbiter {
    /// Creates an arbiter with the safety floor in place.
    ///
    /// The fallback voter holds `fallback_input_ma` in ICL and FCC from the
    /// start, and the cable voter holds the power stage off, so the first
    /// apply pass always brings the charger to a known state.
    pub fn new(fallback_input_ma: i32) -> Self {
        let mut arbiter = Self {
            fcc: NumericDomain::new(DomainId::Fcc),
            icl: NumericDomain::new(DomainId::Icl),
            fv: NumericDomain::new(DomainId::FloatVoltage),
            iv: NumericDomain::new(DomainId::InputVoltage),
            topoff: NumericDomain::new(DomainId::Topoff),
            chg_en: EnableDomain::new(),
        };
        arbiter
            .fcc
            .cast(VoterId::Fallback, true, fallback_input_ma);
        arbiter
            .icl
            .cast(VoterId::Fallback, true, fallback_input_ma);
        arbiter
            .chg_en
            .cast(VoterId::Cable, true, ChargeMode::ChargingOff);
        arbiter
    }

    fn numeric(&self, domain: DomainId) -> &NumericDomain {
        match domain {
            DomainId::Fcc => &self.fcc,
            DomainId::Icl => &self.icl,
            DomainId::FloatVoltage => &self.fv,
            DomainId::InputVoltage => &self.iv,
            DomainId::Topoff => &self.topoff,
        }
    }

    fn numeric_mut(&mut self, domain: DomainId) -> &mut NumericDomain {
        match domain {
            DomainId::Fcc => &mut self.fcc,
            DomainId::Icl => &mut self.icl,
            DomainId::FloatVoltage => &mut self.fv,
            DomainId::InputVoltage => &mut self.iv,
            DomainId::Topoff => &mut self.topoff,
        }
    }

    /// Registers, updates or disables a numeric contribution.
    ///
    /// Re-casting an identical vote changes nothing and owes no write.
    pub fn cast(&mut self, domain: DomainId, voter: VoterId, enabled: bool, value: i32) {
        if let Some((before, after)) = self.numeric_mut(domain).cast(voter, enabled, value) {
            crate::log_info!("{:?} resolved {:?} -> {:?}", domain, before, after);
        }
    }

    /// Registers, updates or disables a charge-enable contribution.
    pub fn cast_enable(&mut self, voter: VoterId, enabled: bool, mode: ChargeMode) {
        if let Some((before, after)) = self.chg_en.cast(voter, enabled, mode) {
            crate::log_info!("chg_en resolved {:?} -> {:?}", before, after);
        }
    }

    /// Effective value of a numeric domain
    pub fn resolve(&self, domain: DomainId) -> Option<Resolution> {
        self.numeric(domain).resolved()
    }

    /// Effective power stage mode and the voter that decided it
    pub fn resolve_enable(&self) -> Option<(VoterId, ChargeMode)> {
        self.chg_en.resolved()
    }

    /// Force one domain to be re-written even if unchanged
    pub fn refresh(&mut self, domain: DomainId) {
        self.numeric_mut(domain).refresh();
    }

    /// Force every resolved domain to be re-written.
    ///
    /// Used after a charger reset, when register contents can no longer be
    /// trusted to match the applied values.
    pub fn refresh_all(&mut self) {
        self.fcc.refresh();
        self.icl.refresh();
        self.fv.refresh();
        self.iv.refresh();
        self.topoff.refresh();
        self.chg_en.refresh();
    }

    /// Writes owed to the hardware, in apply order.
    ///
    /// Current limits come first and the enable mode last, so the power
    /// stage never runs with stale limits. Entries remain pending until
    /// `mark_applied` records the write; reading twice returns the same
    /// list, and a failed write is simply picked up again next tick.
    pub fn take_pending(&self) -> Vec<DomainValue, MAX_PENDING> {
        let mut writes = Vec::new();
        if let Some(value) = self.icl.pending_value() {
            let _ = writes.push(DomainValue::Icl(value));
        }
        if let Some(value) = self.fcc.pending_value() {
            let _ = writes.push(DomainValue::Fcc(value));
        }
        if let Some(value) = self.fv.pending_value() {
            let _ = writes.push(DomainValue::FloatVoltage(value));
        }
        if let Some(value) = self.iv.pending_value() {
            let _ = writes.push(DomainValue::InputVoltage(value));
        }
        if let Some(value) = self.topoff.pending_value() {
            let _ = writes.push(DomainValue::Topoff(value));
        }
        if let Some(mode) = self.chg_en.pending_value() {
            let _ = writes.push(DomainValue::ChargeEnable(mode));
        }
        writes
    }

    /// True when any domain is out of sync with the hardware
    pub fn has_pending(&self) -> bool {
        !self.take_pending().is_empty()
    }

    /// Records one successful hardware write
    pub fn mark_applied(&mut self, write: DomainValue) {
        match write {
            DomainValue::Fcc(value) => self.fcc.mark_applied(value),
            DomainValue::Icl(value) => self.icl.mark_applied(value),
            DomainValue::FloatVoltage(value) => self.fv.mark_applied(value),
            DomainValue::InputVoltage(value) => self.iv.mark_applied(value),
            DomainValue::Topoff(value) => self.topoff.mark_applied(value),
            DomainValue::ChargeEnable(mode) => self.chg_en.mark_applied(mode),
        }
    }
}
