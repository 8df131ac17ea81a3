//! Voter identities and static priority tables
//!
//! Every subsystem that influences a charging parameter casts votes under a
//! fixed identity. Priorities live in tables here, assigned at build time
//! and never mutated, so arbitration outcomes depend only on the current
//! vote snapshot.

use super::domain::DomainId;

/// Number of voter identities, sized for the vote storage arrays
pub const NUM_VOTERS: usize = 19;

/// Who is casting a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VoterId {
    /// Per-cable defaults from the current table
    Cable = 0,
    /// Always-on floor keeping ICL/FCC resolvable with nothing attached
    Fallback = 1,
    /// Transient pin during the wireless-to-wired power path switch
    Select = 2,
    /// Charger-IC thermal limit
    ChgThermal = 3,
    /// Mixed battery + charger thermal limit
    MixThermal = 4,
    /// USB connector overheat protection
    UsbThermal = 5,
    /// Cool/warm zone current and voltage restrictions
    Swelling = 6,
    /// System thermal throttle level
    Siop = 7,
    /// Retail store mode SOC window
    StoreMode = 8,
    /// Slate mode input suspension
    Slate = 9,
    /// Battery aging step adjustments
    Aging = 10,
    /// Wireless TX power sharing caps
    TxShare = 11,
    /// Full-charge termination and topoff stage
    FullCharge = 12,
    /// Safety timer expiry
    SafetyTimer = 13,
    /// OTG accessory attached
    Otg = 14,
    /// External forced charge mode
    ChangeChargeMode = 15,
    /// Battery overvoltage / undervoltage health
    VbatOvp = 16,
    /// Charger watchdog expired
    WdtExpire = 17,
    /// Battery not present
    NoBattery = 18,
}

impl VoterId {
    /// All voters in index order
    pub const ALL: [VoterId; NUM_VOTERS] = [
        VoterId::Cable,
        VoterId::Fallback,
        VoterId::Select,
        VoterId::ChgThermal,
        VoterId::MixThermal,
        VoterId::UsbThermal,
        VoterId::Swelling,
        VoterId::Siop,
        VoterId::StoreMode,
        VoterId::Slate,
        VoterId::Aging,
        VoterId::TxShare,
        VoterId::FullCharge,
        VoterId::SafetyTimer,
        VoterId::Otg,
        VoterId::ChangeChargeMode,
        VoterId::VbatOvp,
        VoterId::WdtExpire,
        VoterId::NoBattery,
    ];

    /// Storage index of this voter
    pub fn index(self) -> usize {
        self as usize
    }

    /// Override tier in a numeric domain.
    ///
    /// Zero means the voter participates in plain minimum reduction. A
    /// non-zero tier wins over every lower tier regardless of magnitude;
    /// only the path-switch pin uses one, because the restore step must see
    /// exactly the value the drop step set.
    pub(crate) fn numeric_tier(self, domain: DomainId) -> u8 {
        match (self, domain) {
            (VoterId::Select, DomainId::Fcc) => 3,
            _ => 0,
        }
    }

    /// Priority in the charge-enable domain.
    ///
    /// Strictly ordered: the highest-priority enabled voter decides the
    /// mode outright. Hard stops (no battery, watchdog, OVP, forced mode)
    /// outrank every normal policy voter.
    pub(crate) fn enable_tier(self) -> u8 {
        match self {
            VoterId::NoBattery => 18,
            VoterId::WdtExpire => 17,
            VoterId::VbatOvp => 16,
            VoterId::ChangeChargeMode => 15,
            VoterId::SafetyTimer => 14,
            VoterId::UsbThermal => 13,
            VoterId::Otg => 12,
            VoterId::Slate => 11,
            VoterId::StoreMode => 10,
            VoterId::Swelling => 9,
            VoterId::FullCharge => 8,
            VoterId::MixThermal => 7,
            VoterId::ChgThermal => 6,
            VoterId::TxShare => 5,
            VoterId::Aging => 4,
            VoterId::Siop => 3,
            VoterId::Select => 2,
            VoterId::Fallback => 1,
            VoterId::Cable => 0,
        }
    }
}
