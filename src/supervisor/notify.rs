//! Outward change notifications
//!
//! The snapshot is pull-only; platform layers that must react promptly
//! (sound a charge chime, redraw a status icon, surface a fault) get a
//! push surface instead: a bounded channel of [`Notice`] values derived
//! by diffing consecutive published snapshots. The supervisor loop posts
//! after every non-skipped tick, consumers receive at their own pace.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use super::battery::{BatteryHealth, BatterySnapshot, ChargeStatus};
use crate::cable::CableType;

/// One observable change, with just enough payload to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    /// A power source appeared where there was none
    Attached { cable: CableType },
    /// The last power source left
    Detached,
    /// The active source changed class without a gap: PD renegotiation,
    /// wireless re-authentication, or a wired/wireless handover
    Renegotiated { cable: CableType },
    /// Charging status moved (includes reaching Full)
    StatusChanged { status: ChargeStatus },
    /// Health moved, in either direction
    HealthChanged { health: BatteryHealth },
}

/// Outward notice transport. Bounded; a full channel drops the notice
/// rather than stalling the supervisor.
pub type NoticeChannel = Channel<CriticalSectionRawMutex, Notice, 8>;

/// Diffs two consecutive snapshots into the notices a consumer cares
/// about. At most one cable notice, one status notice and one health
/// notice per pass.
pub fn notices_between(previous: &BatterySnapshot, current: &BatterySnapshot) -> Vec<Notice, 4> {
    let mut out = Vec::new();

    if current.cable != previous.cable {
        let notice = match (previous.cable, current.cable) {
            (CableType::None, cable) => Notice::Attached { cable },
            (_, CableType::None) => Notice::Detached,
            (_, cable) => Notice::Renegotiated { cable },
        };
        let _ = out.push(notice);
    }
    if current.status != previous.status {
        let _ = out.push(Notice::StatusChanged {
            status: current.status,
        });
    }
    if current.health != previous.health {
        let _ = out.push(Notice::HealthChanged {
            health: current.health,
        });
    }

    out
}

/// Posts every notice, dropping on overflow. A drop means the consumer
/// is more than a full channel behind; the snapshot still carries the
/// current truth.
pub fn post_all(channel: &NoticeChannel, notices: &[Notice]) {
    for notice in notices {
        if channel.try_send(*notice).is_err() {
            crate::log_warn!("notice dropped, consumer behind");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(cable: CableType, status: ChargeStatus, health: BatteryHealth) -> BatterySnapshot {
        BatterySnapshot {
            cable,
            status,
            health,
            ..BatterySnapshot::default()
        }
    }

    #[test]
    fn attach_detach_and_handover_map_to_distinct_notices() {
        let idle = snap(
            CableType::None,
            ChargeStatus::Discharging,
            BatteryHealth::Good,
        );
        let usb = snap(CableType::Usb, ChargeStatus::Charging, BatteryHealth::Good);
        let hv = snap(CableType::HvTa, ChargeStatus::Charging, BatteryHealth::Good);

        let attach = notices_between(&idle, &usb);
        assert_eq!(attach[0], Notice::Attached {
            cable: CableType::Usb
        });
        assert!(attach.contains(&Notice::StatusChanged {
            status: ChargeStatus::Charging
        }));

        let handover = notices_between(&usb, &hv);
        assert_eq!(
            handover.as_slice(),
            &[Notice::Renegotiated {
                cable: CableType::HvTa
            }]
        );

        let detach = notices_between(&hv, &idle);
        assert_eq!(detach[0], Notice::Detached);
    }

    #[test]
    fn unchanged_snapshot_raises_nothing() {
        let usb = snap(CableType::Usb, ChargeStatus::Charging, BatteryHealth::Good);
        assert!(notices_between(&usb, &usb).is_empty());
    }

    #[test]
    fn health_fault_and_recovery_both_notify() {
        let good = snap(CableType::Ta, ChargeStatus::Charging, BatteryHealth::Good);
        let ovp = snap(
            CableType::Ta,
            ChargeStatus::NotCharging,
            BatteryHealth::OverVoltage,
        );

        let onset = notices_between(&good, &ovp);
        assert!(onset.contains(&Notice::HealthChanged {
            health: BatteryHealth::OverVoltage
        }));
        assert!(onset.contains(&Notice::StatusChanged {
            status: ChargeStatus::NotCharging
        }));

        let recovery = notices_between(&ovp, &good);
        assert!(recovery.contains(&Notice::HealthChanged {
            health: BatteryHealth::Good
        }));
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let channel = NoticeChannel::new();
        let notices = [Notice::Detached; 10];

        post_all(&channel, &notices);

        let mut received = 0;
        while channel.try_receive().is_ok() {
            received += 1;
        }
        assert_eq!(received, 8);
    }
}
