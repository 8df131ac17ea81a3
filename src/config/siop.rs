//! SIOP (system thermal throttle) level table
//!
//! The platform thermal engine hands down a level between 0 and 100. Level
//! 100 means no throttling; anything lower selects the closest table row at
//! or below the level and caps the charging currents with it.

use heapless::Vec;

/// Maximum number of throttle rows
pub const MAX_SIOP_LEVELS: usize = 8;

/// Current caps for one throttle level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiopEntry {
    /// Level this row applies from
    pub level: u8,

    /// Wired input current cap in mA
    pub wired_icl_ma: i32,

    /// Wired fast-charge cap in mA
    pub wired_fcc_ma: i32,

    /// Wireless input current cap in mA
    pub wireless_icl_ma: i32,

    /// Wireless fast-charge cap in mA
    pub wireless_fcc_ma: i32,
}

/// Throttle table ordered by ascending level
#[derive(Debug, Clone)]
pub struct SiopTable {
    entries: Vec<SiopEntry, MAX_SIOP_LEVELS>,
}

impl SiopTable {
    /// Selects the row for a throttle level.
    ///
    /// # Returns
    ///
    /// `None` at level 100 and above (no throttling), otherwise the row with
    /// the greatest level not exceeding the requested one.
    pub fn lookup(&self, level: u8) -> Option<&SiopEntry> {
        if level >= 100 {
            return None;
        }
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.level <= level)
            .or_else(|| self.entries.first())
    }

    pub(crate) fn validate(&self) -> bool {
        let ascending = self
            .entries
            .windows(2)
            .all(|pair| pair[0].level < pair[1].level);
        let currents_sane = self.entries.iter().all(|entry| {
            entry.level < 100
                && entry.wired_icl_ma > 0
                && entry.wired_fcc_ma > 0
                && entry.wireless_icl_ma > 0
                && entry.wireless_fcc_ma > 0
        });
        !self.entries.is_empty() && ascending && currents_sane
    }
}

impl Default for SiopTable {
    fn default() -> Self {
        let mut entries = Vec::new();
        // Capacity holds all five factory rows
        let _ = entries.push(SiopEntry {
            level: 0,
            wired_icl_ma: 500,
            wired_fcc_ma: 500,
            wireless_icl_ma: 500,
            wireless_fcc_ma: 500,
        });
        let _ = entries.push(SiopEntry {
            level: 10,
            wired_icl_ma: 700,
            wired_fcc_ma: 800,
            wireless_icl_ma: 600,
            wireless_fcc_ma: 700,
        });
        let _ = entries.push(SiopEntry {
            level: 20,
            wired_icl_ma: 1000,
            wired_fcc_ma: 1200,
            wireless_icl_ma: 700,
            wireless_fcc_ma: 900,
        });
        let _ = entries.push(SiopEntry {
            level: 40,
            wired_icl_ma: 1200,
            wired_fcc_ma: 1750,
            wireless_icl_ma: 700,
            wireless_fcc_ma: 1200,
        });
        let _ = entries.push(SiopEntry {
            level: 70,
            wired_icl_ma: 1500,
            wired_fcc_ma: 2100,
            wireless_icl_ma: 700,
            wireless_fcc_ma: 1400,
        });

        Self { entries }
    }
}
