//! Event flag sets
//!
//! Charging restrictions and notable conditions are tracked as typed flag
//! sets rather than raw bitmask integers. Each set is owned by the component
//! that raises its bits (supervisor for current/misc, TX controller for tx)
//! and is only mutated behind that component's lock. Snapshots expose the
//! sets read-only.

use bitflags::bitflags;

bitflags! {
    /// Active charging-current restrictions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CurrentEvent: u16 {
        /// Charger IC thermal limit active (FCC capped, input voltage dropped)
        const CHG_LIMIT = 0b0000_0000_0001;
        /// Mixed battery + charger thermal limit active (ICL floored)
        const MIX_LIMIT = 0b0000_0000_0010;
        /// USB connector overheat, input suspended
        const USB_SUSPENDED = 0b0000_0000_0100;
        /// Cool-zone swelling restriction (reduced FCC, lowered float voltage)
        const SWELLING_COOL = 0b0000_0000_1000;
        /// Warm-zone swelling restriction (reduced FCC, lowered float voltage)
        const SWELLING_WARM = 0b0000_0001_0000;
        /// Slate mode, charging input suspended by policy
        const SLATE = 0b0000_0010_0000;
        /// Safety timer expired, charging terminated for this session
        const SAFETY_TIMER_EXPIRED = 0b0000_0100_0000;
        /// Aging-step float voltage reduction in effect
        const AGING_STEP = 0b0000_1000_0000;
    }
}

bitflags! {
    /// Miscellaneous battery conditions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MiscEvent: u16 {
        /// Store mode active (SOC window policing)
        const STORE_MODE = 0b0000_0001;
        /// Store mode has stopped charging at the high-SOC bound
        const FULL_CAPACITY = 0b0000_0010;
        /// Cable classified by timeout, type never resolved
        const TIMEOUT_CABLE = 0b0000_0100;
        /// Battery swelling detected in a cool or warm zone
        const SWELLING = 0b0000_1000;
    }
}

bitflags! {
    /// Wireless TX (reverse charging) conditions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TxEvent: u16 {
        /// TX output enabled
        const TX_STATUS = 0b0000_0001;
        /// Receiver detected on the pad
        const RX_CONNECT = 0b0000_0010;
        /// Misalignment fault (retryable)
        const TX_MISALIGN = 0b0000_0100;
        /// Overcurrent fault (retryable)
        const TX_OCP = 0b0000_1000;
        /// Retry budget exhausted, TX disabled until re-enabled externally
        const TX_RETRY_EXHAUSTED = 0b0001_0000;
        /// TX disabled because the battery left the allowed thermal window
        const TX_HIGH_TEMP = 0b0010_0000;
    }
}
