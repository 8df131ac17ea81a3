//! Wireless power chip interfaces
//!
//! One physical chip, two surfaces with different owners: the supervisor
//! drives the receive path through `WirelessSource`, the TX controller
//! drives the transmit path through `WirelessTxPort`. Splitting the trait
//! keeps each owner unable to touch the other's registers.

use super::Result;
use crate::cable::types::WirelessKind;

/// Which rail feeds the system while both sources are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerPath {
    /// Receiver output feeds the charger input
    Wireless,
    /// Wired input feeds the charger, receiver output parked
    Wired,
}

/// Receive-path surface of the wireless chip
#[allow(async_fn_in_trait)]
pub trait WirelessSource {
    /// True while a pad is energizing the coil
    async fn is_online(&mut self) -> Result<bool>;

    /// Select which rail powers the charger input
    async fn set_power_path(&mut self, path: PowerPath) -> Result<()>;

    /// Enable or disable the receiver output LDO
    async fn set_ldo_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Receiver class as currently negotiated, `None` before identification.
    ///
    /// Authentication can upgrade this mid-session (BPP pad proving EPP
    /// capability), so the supervisor re-reads it each tick while wireless
    /// power is active.
    async fn receiver_kind(&mut self) -> Result<Option<WirelessKind>>;

    /// Coil-side thermistor in tenths of a degree C
    async fn coil_temperature(&mut self) -> Result<i32>;
}

/// Transmit-path surface of the wireless chip
#[allow(async_fn_in_trait)]
pub trait WirelessTxPort {
    /// Energize or stop the TX coil
    async fn set_tx_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Measured TX output voltage in mV
    async fn vout_mv(&mut self) -> Result<i32>;

    /// Request a TX output voltage in mV
    async fn set_vout_mv(&mut self, mv: i32) -> Result<()>;

    /// Coil current limit toward the receiver in mA
    async fn set_tx_current_ma(&mut self, ma: i32) -> Result<()>;

    /// Measured operating frequency in kHz
    async fn operating_frequency_khz(&mut self) -> Result<i32>;

    /// True while a receiver is coupled to the coil
    async fn rx_connected(&mut self) -> Result<bool>;

    /// True when the receiver signalled charge-full (phase-hold request)
    async fn rx_charge_full(&mut self) -> Result<bool>;

    /// Misalignment fault latched since the last read
    async fn misalign_fault(&mut self) -> Result<bool>;

    /// Overcurrent fault latched since the last read
    async fn ocp_fault(&mut self) -> Result<bool>;
}
