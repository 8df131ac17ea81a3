//! Consecutive-fault accounting for the transmit path

/// What a newly observed fault should do to the transmit path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultAction {
    /// Toggle the coil off and back on, then ramp again
    Retry,
    /// Retry budget spent, transmission stays off
    Terminal,
}

/// Retry budget tracking for misalignment and overcurrent faults.
///
/// The two fault kinds run independent counters. A pass that observes
/// neither fault ends both runs, so only back-to-back faults spend the
/// budget.
#[derive(Debug, Default)]
pub struct FaultTracker {
    misalign_run: u8,
    ocp_run: u8,
}

impl FaultTracker {
    pub const fn new() -> Self {
        Self {
            misalign_run: 0,
            ocp_run: 0,
        }
    }

    /// Records a misalignment fault against a retry limit
    pub fn note_misalign(&mut self, retry_limit: u8) -> FaultAction {
        self.misalign_run = self.misalign_run.saturating_add(1);
        if self.misalign_run > retry_limit {
            FaultAction::Terminal
        } else {
            FaultAction::Retry
        }
    }

    /// Records an overcurrent fault against a retry limit
    pub fn note_ocp(&mut self, retry_limit: u8) -> FaultAction {
        self.ocp_run = self.ocp_run.saturating_add(1);
        if self.ocp_run > retry_limit {
            FaultAction::Terminal
        } else {
            FaultAction::Retry
        }
    }

    /// A pass with neither fault observed
    pub fn note_clean(&mut self) {
        self.misalign_run = 0;
        self.ocp_run = 0;
    }
}
