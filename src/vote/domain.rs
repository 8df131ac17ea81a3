//! Vote domain storage and resolution
//!
//! A domain holds one optional vote slot per voter plus the bookkeeping for
//! the apply path: the last resolution, the last value actually written to
//! hardware, and whether those two differ. Resolution is a pure function of
//! the vote slots; casting merely re-runs it.

use super::voter::{VoterId, NUM_VOTERS};
use crate::devices::traits::ChargeMode;

/// Numeric arbitration domains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DomainId {
    /// Fast-charge current, mA
    Fcc,
    /// Input current limit, mA
    Icl,
    /// Float voltage, mV
    FloatVoltage,
    /// Input voltage, mV
    InputVoltage,
    /// Termination current, mA
    Topoff,
}

/// Outcome of arbitration: the winning voter and its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resolution {
    pub voter: VoterId,
    pub value: i32,
}

#[derive(Debug, Clone, Copy)]
struct NumericVote {
    enabled: bool,
    value: i32,
}

/// One min-reduced numeric domain
#[derive(Debug)]
pub(crate) struct NumericDomain {
    domain: DomainId,
    votes: [Option<NumericVote>; NUM_VOTERS],
    resolved: Option<Resolution>,
    applied: Option<i32>,
    force_refresh: bool,
}

impl NumericDomain {
    pub(crate) fn new(domain: DomainId) -> Self {
        Self {
            domain,
            votes: [None; NUM_VOTERS],
            resolved: None,
            applied: None,
            force_refresh: false,
        }
    }

    /// Registers, updates or disables a contribution.
    ///
    /// # Returns
    ///
    /// The previous and new resolution when the effective value changed.
    pub(crate) fn cast(
        &mut self,
        voter: VoterId,
        enabled: bool,
        value: i32,
    ) -> Option<(Option<Resolution>, Option<Resolution>)> {
        self.votes[voter.index()] = Some(NumericVote { enabled, value });

        let before = self.resolved;
        self.resolved = self.compute();
        if before != self.resolved {
            Some((before, self.resolved))
        } else {
            None
        }
    }

    /// Pure resolution over the current vote slots.
    ///
    /// Winner selection: highest override tier first, then smallest value,
    /// then smallest voter index. With all tiers at zero this is plain
    /// minimum reduction with a deterministic tie-break.
    pub(crate) fn compute(&self) -> Option<Resolution> {
        let mut best: Option<(u8, i32, usize)> = None;

        for (idx, slot) in self.votes.iter().enumerate() {
            let Some(vote) = slot else { continue };
            if !vote.enabled {
                continue;
            }
            let tier = VoterId::ALL[idx].numeric_tier(self.domain);
            let candidate = (tier, vote.value, idx);

            best = Some(match best {
                None => candidate,
                Some(current) => {
                    let wins = candidate.0 > current.0
                        || (candidate.0 == current.0
                            && (candidate.1 < current.1
                                || (candidate.1 == current.1 && candidate.2 < current.2)));
                    if wins {
                        candidate
                    } else {
                        current
                    }
                }
            });
        }

        best.map(|(_, value, idx)| Resolution {
            voter: VoterId::ALL[idx],
            value,
        })
    }

    pub(crate) fn id(&self) -> DomainId {
        self.domain
    }

    pub(crate) fn resolved(&self) -> Option<Resolution> {
        self.resolved
    }

    /// Force the next apply pass to re-write the resolved value even if the
    /// hardware supposedly has it already.
    pub(crate) fn refresh(&mut self) {
        if self.resolved.is_some() {
            self.force_refresh = true;
        }
    }

    /// Value waiting to be written, if the domain is out of sync.
    pub(crate) fn pending_value(&self) -> Option<i32> {
        let resolved = self.resolved?;
        if self.force_refresh || self.applied != Some(resolved.value) {
            Some(resolved.value)
        } else {
            None
        }
    }

    /// Records a successful hardware write.
    ///
    /// If the resolution moved on while the write was in flight the domain
    /// stays pending and the next pass writes the newer value.
    pub(crate) fn mark_applied(&mut self, value: i32) {
        self.applied = Some(value);
        if self.resolved.map(|r| r.value) == Some(value) {
            self.force_refresh = false;
        }
    }
}

/// The priority-ordered charge-enable domain
#[derive(Debug)]
pub(crate) struct EnableDomain {
    votes: [Option<(bool, ChargeMode)>; NUM_VOTERS],
    resolved: Option<(VoterId, ChargeMode)>,
    applied: Option<ChargeMode>,
    force_refresh: bool,
}

impl EnableDomain {
    pub(crate) fn new() -> Self {
        Self {
            votes: [None; NUM_VOTERS],
            resolved: None,
            applied: None,
            force_refresh: false,
        }
    }

    pub(crate) fn cast(
        &mut self,
        voter: VoterId,
        enabled: bool,
        mode: ChargeMode,
    ) -> Option<(
        Option<(VoterId, ChargeMode)>,
        Option<(VoterId, ChargeMode)>,
    )> {
        self.votes[voter.index()] = Some((enabled, mode));

        let before = self.resolved;
        self.resolved = self.compute();
        if before != self.resolved {
            Some((before, self.resolved))
        } else {
            None
        }
    }

    /// Highest enabled priority wins outright; ties are impossible because
    /// enable tiers are distinct per voter.
    pub(crate) fn compute(&self) -> Option<(VoterId, ChargeMode)> {
        let mut best: Option<(u8, usize, ChargeMode)> = None;

        for (idx, slot) in self.votes.iter().enumerate() {
            let Some((enabled, mode)) = slot else { continue };
            if !enabled {
                continue;
            }
            let tier = VoterId::ALL[idx].enable_tier();

            best = Some(match best {
                None => (tier, idx, *mode),
                Some(current) if tier > current.0 => (tier, idx, *mode),
                Some(current) => current,
            });
        }

        best.map(|(_, idx, mode)| (VoterId::ALL[idx], mode))
    }

    pub(crate) fn resolved(&self) -> Option<(VoterId, ChargeMode)> {
        self.resolved
    }

    pub(crate) fn refresh(&mut self) {
        if self.resolved.is_some() {
            self.force_refresh = true;
        }
    }

    pub(crate) fn pending_value(&self) -> Option<ChargeMode> {
        let (_, mode) = self.resolved?;
        if self.force_refresh || self.applied != Some(mode) {
            Some(mode)
        } else {
            None
        }
    }

    pub(crate) fn mark_applied(&mut self, mode: ChargeMode) {
        self.applied = Some(mode);
        if self.resolved.map(|(_, m)| m) == Some(mode) {
            self.force_refresh = false;
        }
    }
}
