//! Mock wireless chip implementations for testing

use crate::cable::types::WirelessKind;
use crate::devices::traits::{PowerPath, Result, WirelessSource, WirelessTxPort};
use core::cell::RefCell;
use heapless::Vec;

/// Recorded receive-path write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxWrite {
    Path(PowerPath),
    Ldo(bool),
}

/// Mock receive-path surface
#[derive(Debug)]
pub struct MockWirelessSource {
    writes: RefCell<Vec<RxWrite, 32>>,
    online: bool,
    kind: Option<WirelessKind>,
    coil_temperature: i32,
}

impl Default for MockWirelessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWirelessSource {
    pub fn new() -> Self {
        Self {
            writes: RefCell::new(Vec::new()),
            online: false,
            kind: None,
            coil_temperature: 250,
        }
    }

    /// Get the write log (for test verification)
    pub fn writes(&self) -> Vec<RxWrite, 32> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&mut self) {
        self.writes.borrow_mut().clear();
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn set_kind(&mut self, kind: Option<WirelessKind>) {
        self.kind = kind;
    }

    pub fn set_coil_temperature(&mut self, tenths_c: i32) {
        self.coil_temperature = tenths_c;
    }
}

impl WirelessSource for MockWirelessSource {
    async fn is_online(&mut self) -> Result<bool> {
        Ok(self.online)
    }

    async fn set_power_path(&mut self, path: PowerPath) -> Result<()> {
        let _ = self.writes.borrow_mut().push(RxWrite::Path(path));
        Ok(())
    }

    async fn set_ldo_enabled(&mut self, enabled: bool) -> Result<()> {
        let _ = self.writes.borrow_mut().push(RxWrite::Ldo(enabled));
        Ok(())
    }

    async fn receiver_kind(&mut self) -> Result<Option<WirelessKind>> {
        Ok(self.kind)
    }

    async fn coil_temperature(&mut self) -> Result<i32> {
        Ok(self.coil_temperature)
    }
}

/// Recorded transmit-path write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxWrite {
    Enable(bool),
    Vout(i32),
    Current(i32),
}

/// Mock transmit-path surface.
///
/// By default a vout request settles instantly, so `vout_mv` reads back the
/// requested value. Tests exercising the preset retry loop call
/// `set_vout_settles(false)` and advance the measured value themselves.
#[derive(Debug)]
pub struct MockWirelessTxPort {
    writes: RefCell<Vec<TxWrite, 64>>,
    measured_vout_mv: i32,
    vout_settles: bool,
    frequency_khz: i32,
    rx_connected: bool,
    rx_charge_full: bool,
    misalign: bool,
    ocp: bool,
}

impl Default for MockWirelessTxPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWirelessTxPort {
    pub fn new() -> Self {
        Self {
            writes: RefCell::new(Vec::new()),
            measured_vout_mv: 0,
            vout_settles: true,
            frequency_khz: 140,
            rx_connected: false,
            rx_charge_full: false,
            misalign: false,
            ocp: false,
        }
    }

    /// Get the write log (for test verification)
    pub fn writes(&self) -> Vec<TxWrite, 64> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&mut self) {
        self.writes.borrow_mut().clear();
    }

    pub fn set_vout_settles(&mut self, settles: bool) {
        self.vout_settles = settles;
    }

    pub fn set_measured_vout_mv(&mut self, mv: i32) {
        self.measured_vout_mv = mv;
    }

    pub fn set_frequency_khz(&mut self, khz: i32) {
        self.frequency_khz = khz;
    }

    pub fn set_rx_connected(&mut self, connected: bool) {
        self.rx_connected = connected;
    }

    pub fn set_rx_charge_full(&mut self, full: bool) {
        self.rx_charge_full = full;
    }

    pub fn set_misalign(&mut self, fault: bool) {
        self.misalign = fault;
    }

    pub fn set_ocp(&mut self, fault: bool) {
        self.ocp = fault;
    }
}

impl WirelessTxPort for MockWirelessTxPort {
    async fn set_tx_enabled(&mut self, enabled: bool) -> Result<()> {
        let _ = self.writes.borrow_mut().push(TxWrite::Enable(enabled));
        if !enabled {
            self.measured_vout_mv = 0;
        }
        Ok(())
    }

    async fn vout_mv(&mut self) -> Result<i32> {
        Ok(self.measured_vout_mv)
    }

    async fn set_vout_mv(&mut self, mv: i32) -> Result<()> {
        let _ = self.writes.borrow_mut().push(TxWrite::Vout(mv));
        if self.vout_settles {
            self.measured_vout_mv = mv;
        }
        Ok(())
    }

    async fn set_tx_current_ma(&mut self, ma: i32) -> Result<()> {
        let _ = self.writes.borrow_mut().push(TxWrite::Current(ma));
        Ok(())
    }

    async fn operating_frequency_khz(&mut self) -> Result<i32> {
        Ok(self.frequency_khz)
    }

    async fn rx_connected(&mut self) -> Result<bool> {
        Ok(self.rx_connected)
    }

    async fn rx_charge_full(&mut self) -> Result<bool> {
        Ok(self.rx_charge_full)
    }

    async fn misalign_fault(&mut self) -> Result<bool> {
        let fault = self.misalign;
        self.misalign = false;
        Ok(fault)
    }

    async fn ocp_fault(&mut self) -> Result<bool> {
        let fault = self.ocp;
        self.ocp = false;
        Ok(fault)
    }
}
