//! Power source identity types and attach-event intake
//!
//! `CableType` is the canonical answer to "what is powering the device right
//! now". Exactly one value is active at a time; transitions are serialized
//! through the `EventQueue` so classification always happens on the
//! supervisor tick, never concurrently with it.

use heapless::Deque;

/// Attach-event queue depth
const EVENT_QUEUE_DEPTH: usize = 8;

/// Canonical power source classification.
///
/// Raw attach notifications carry a numeric cable id; `from_raw` is the only
/// entry point for those, and rejects anything outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CableType {
    /// Nothing attached
    None = 0,
    /// Attached but type never resolved
    Unknown = 1,
    /// USB SDP (500 mA enumeration class)
    Usb = 2,
    /// USB CDP (charging downstream port)
    UsbCdp = 3,
    /// Dedicated charger (DCP)
    Ta = 4,
    /// High-voltage 9 V charger
    HvTa = 5,
    /// High-voltage 12 V charger
    HvTa12v = 6,
    /// USB-PD fixed contract
    Pd = 7,
    /// USB-PD programmable (APDO) contract, direct charging capable
    PdApdo = 8,
    /// Type detection timed out, treated as a slow charger
    Timeout = 9,
    /// OTG accessory, device sources power instead of sinking it
    Otg = 10,
    /// Wireless BPP pad (5 V class)
    Wireless = 11,
    /// Wireless EPP pad (high voltage class)
    WirelessHv = 12,
    /// Wireless battery pack
    WirelessPack = 13,
    /// Wireless charging stand
    WirelessStand = 14,
    /// Wireless detection artifact while the wired path carries the power
    WirelessFake = 15,
    /// Receiving from another device's TX coil (power sharing)
    WirelessTx = 16,
}

/// Number of cable classifications, for table indexing
pub const CABLE_TYPE_COUNT: usize = 17;

impl CableType {
    /// Maps a raw attach-notification cable id to a classification.
    ///
    /// # Returns
    ///
    /// `None` for ids outside the known range. Callers keep the previous
    /// classification when that happens.
    pub fn from_raw(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::None),
            1 => Some(Self::Unknown),
            2 => Some(Self::Usb),
            3 => Some(Self::UsbCdp),
            4 => Some(Self::Ta),
            5 => Some(Self::HvTa),
            6 => Some(Self::HvTa12v),
            7 => Some(Self::Pd),
            8 => Some(Self::PdApdo),
            9 => Some(Self::Timeout),
            10 => Some(Self::Otg),
            11 => Some(Self::Wireless),
            12 => Some(Self::WirelessHv),
            13 => Some(Self::WirelessPack),
            14 => Some(Self::WirelessStand),
            15 => Some(Self::WirelessFake),
            16 => Some(Self::WirelessTx),
            _ => None,
        }
    }

    /// True for every wireless classification, including the fake marker.
    pub fn is_wireless(self) -> bool {
        matches!(
            self,
            Self::Wireless
                | Self::WirelessHv
                | Self::WirelessPack
                | Self::WirelessStand
                | Self::WirelessFake
                | Self::WirelessTx
        )
    }

    /// True for wired sink classifications (OTG sources power, so it is not one).
    pub fn is_wired(self) -> bool {
        matches!(
            self,
            Self::Usb
                | Self::UsbCdp
                | Self::Ta
                | Self::HvTa
                | Self::HvTa12v
                | Self::Pd
                | Self::PdApdo
                | Self::Timeout
                | Self::Unknown
        )
    }

    /// True when the source negotiates an input voltage above 5 V.
    pub fn is_hv(self) -> bool {
        matches!(
            self,
            Self::HvTa | Self::HvTa12v | Self::Pd | Self::PdApdo | Self::WirelessHv
        )
    }

    /// True when any charge current can be drawn from this source.
    pub fn is_charging_source(self) -> bool {
        self.is_wired() || (self.is_wireless() && self != Self::WirelessFake)
    }
}

/// Wireless receiver operating class reported on attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WirelessKind {
    /// Baseline power profile, 5 V pad
    Bpp,
    /// Extended power profile, high-voltage pad
    Epp,
    /// Wireless battery pack
    Pack,
    /// Charging stand
    Stand,
    /// Pad detected while wired power stays active
    Fake,
    /// Another device transmitting (power sharing)
    PhoneTx,
}

impl WirelessKind {
    /// Classification this receiver class maps to
    pub fn cable_type(self) -> CableType {
        match self {
            Self::Bpp => CableType::Wireless,
            Self::Epp => CableType::WirelessHv,
            Self::Pack => CableType::WirelessPack,
            Self::Stand => CableType::WirelessStand,
            Self::Fake => CableType::WirelessFake,
            Self::PhoneTx => CableType::WirelessTx,
        }
    }
}

/// Raw power source notification, queued for the next supervisor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceEvent {
    /// Wired attach carrying the raw cable id from the detection block
    WiredAttach { cable_id: u8 },
    /// Wired source removed
    WiredDetach,
    /// PD sink-capability renegotiation
    PdContract {
        /// Contract voltage in mV
        max_voltage_mv: i32,
        /// Contract current in mA
        max_current_ma: i32,
        /// True for a programmable (APDO) contract
        apdo: bool,
    },
    /// Wireless attach with the receiver class and declared operating point
    WirelessAttach {
        kind: WirelessKind,
        /// Declared output voltage in mV
        vout_mv: i32,
        /// Declared maximum current in mA
        max_current_ma: i32,
    },
    /// Wireless source removed
    WirelessDetach,
}

/// Bounded attach-event queue with duplicate suppression.
///
/// Producers push from notification context; the supervisor drains the queue
/// at the start of each tick, so every event is observed at least once. A
/// duplicate of an event already waiting is dropped (the tick would classify
/// identically either way). When the queue is full the oldest entry is
/// discarded with a warning, since the newest event reflects the present
/// hardware state.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Deque<SourceEvent, EVENT_QUEUE_DEPTH>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Queues an event for the next tick.
    ///
    /// # Returns
    ///
    /// `false` if the event was suppressed as a duplicate.
    pub fn push(&mut self, event: SourceEvent) -> bool {
        if self.events.iter().any(|queued| *queued == event) {
            return false;
        }

        if self.events.is_full() {
            let _ = self.events.pop_front();
            crate::log_warn!("event queue full, dropped oldest");
        }

        // Cannot fail: a slot was freed above if needed
        let _ = self.events.push_back(event);
        true
    }

    /// Takes the oldest queued event.
    pub fn pop(&mut self) -> Option<SourceEvent> {
        self.events.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
