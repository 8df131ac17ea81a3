//! Per-cable charging current table

use crate::cable::types::{CableType, CABLE_TYPE_COUNT};

/// Input and fast-charge current for one cable classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CableEntry {
    /// Input current limit in mA
    pub input_current_ma: i32,

    /// Fast-charge current in mA
    pub fast_charging_current_ma: i32,
}

impl CableEntry {
    const fn new(input_current_ma: i32, fast_charging_current_ma: i32) -> Self {
        Self {
            input_current_ma,
            fast_charging_current_ma,
        }
    }
}

/// Charging current table, one entry per `CableType`.
///
/// Values here are what the cable voter casts into the ICL and FCC domains
/// on attach. `None` and `Otg` carry zeros: neither sinks charge current,
/// and the always-on fallback voter keeps those domains resolvable.
#[derive(Debug, Clone)]
pub struct CableTable {
    entries: [CableEntry; CABLE_TYPE_COUNT],
}

impl CableTable {
    /// Looks up the entry for a cable classification.
    pub fn entry(&self, cable: CableType) -> CableEntry {
        self.entries[cable as usize]
    }

    /// Mutable access for board-specific tuning.
    pub fn entry_mut(&mut self, cable: CableType) -> &mut CableEntry {
        &mut self.entries[cable as usize]
    }

    /// Rejects entries that would stall charging on a real source.
    pub(crate) fn validate(&self) -> bool {
        let mut id = 0u8;
        while let Some(cable) = CableType::from_raw(id) {
            let entry = self.entry(cable);
            if cable.is_charging_source()
                && (entry.input_current_ma <= 0 || entry.fast_charging_current_ma <= 0)
            {
                return false;
            }
            if entry.input_current_ma < 0 || entry.fast_charging_current_ma < 0 {
                return false;
            }
            id += 1;
        }
        true
    }
}

impl Default for CableTable {
    fn default() -> Self {
        let mut entries = [CableEntry::new(0, 0); CABLE_TYPE_COUNT];

        entries[CableType::Unknown as usize] = CableEntry::new(500, 500);
        entries[CableType::Usb as usize] = CableEntry::new(500, 500);
        entries[CableType::UsbCdp as usize] = CableEntry::new(1000, 1000);
        entries[CableType::Ta as usize] = CableEntry::new(1500, 2100);
        entries[CableType::HvTa as usize] = CableEntry::new(1650, 2750);
        entries[CableType::HvTa12v as usize] = CableEntry::new(1250, 2750);
        entries[CableType::Pd as usize] = CableEntry::new(2000, 2750);
        entries[CableType::PdApdo as usize] = CableEntry::new(2750, 4500);
        entries[CableType::Timeout as usize] = CableEntry::new(1000, 1000);
        entries[CableType::Wireless as usize] = CableEntry::new(700, 1100);
        entries[CableType::WirelessHv as usize] = CableEntry::new(750, 1800);
        entries[CableType::WirelessPack as usize] = CableEntry::new(500, 1000);
        entries[CableType::WirelessStand as usize] = CableEntry::new(900, 1800);
        entries[CableType::WirelessTx as usize] = CableEntry::new(500, 500);

        Self { entries }
    }
}
