//! Mock charger implementation for testing

use crate::devices::traits::{
    ChargeMode, Charger, ChargerHealth, DeviceError, DirectChargeStatus, Result,
};
use core::cell::RefCell;
use heapless::Vec;

/// Recorded charger write for test verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerWrite {
    InputCurrent(i32),
    FastCharging(i32),
    FloatVoltage(i32),
    InputVoltage(i32),
    Topoff(i32),
    Mode(ChargeMode),
}

/// Mock charger
///
/// Records all writes and answers reads from programmable fields. Write
/// failures can be injected to exercise the retry path.
#[derive(Debug)]
pub struct MockCharger {
    writes: RefCell<Vec<ChargerWrite, 64>>,
    health: ChargerHealth,
    charging_done: bool,
    temperature: i32,
    direct_status: DirectChargeStatus,
    fail_writes: u8,
}

impl Default for MockCharger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCharger {
    pub fn new() -> Self {
        Self {
            writes: RefCell::new(Vec::new()),
            health: ChargerHealth::Good,
            charging_done: false,
            temperature: 250,
            direct_status: DirectChargeStatus::Off,
            fail_writes: 0,
        }
    }

    /// Get the write log (for test verification)
    pub fn writes(&self) -> Vec<ChargerWrite, 64> {
        self.writes.borrow().clone()
    }

    /// Clear the write log
    pub fn clear_writes(&mut self) {
        self.writes.borrow_mut().clear();
    }

    /// Fail the next `count` writes with a bus error
    pub fn set_fail_writes(&mut self, count: u8) {
        self.fail_writes = count;
    }

    pub fn set_health(&mut self, health: ChargerHealth) {
        self.health = health;
    }

    pub fn set_charging_done(&mut self, done: bool) {
        self.charging_done = done;
    }

    pub fn set_temperature(&mut self, tenths_c: i32) {
        self.temperature = tenths_c;
    }

    pub fn set_direct_status(&mut self, status: DirectChargeStatus) {
        self.direct_status = status;
    }

    fn record(&mut self, write: ChargerWrite) -> Result<()> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(DeviceError::Bus);
        }
        let _ = self.writes.borrow_mut().push(write);
        Ok(())
    }
}

impl Charger for MockCharger {
    async fn set_input_current_ma(&mut self, ma: i32) -> Result<()> {
        self.record(ChargerWrite::InputCurrent(ma))
    }

    async fn set_fast_charging_current_ma(&mut self, ma: i32) -> Result<()> {
        self.record(ChargerWrite::FastCharging(ma))
    }

    async fn set_float_voltage_mv(&mut self, mv: i32) -> Result<()> {
        self.record(ChargerWrite::FloatVoltage(mv))
    }

    async fn set_input_voltage_mv(&mut self, mv: i32) -> Result<()> {
        self.record(ChargerWrite::InputVoltage(mv))
    }

    async fn set_topoff_current_ma(&mut self, ma: i32) -> Result<()> {
        self.record(ChargerWrite::Topoff(ma))
    }

    async fn set_charge_mode(&mut self, mode: ChargeMode) -> Result<()> {
        self.record(ChargerWrite::Mode(mode))
    }

    async fn is_charging_done(&mut self) -> Result<bool> {
        Ok(self.charging_done)
    }

    async fn health(&mut self) -> Result<ChargerHealth> {
        Ok(self.health)
    }

    async fn temperature(&mut self) -> Result<i32> {
        Ok(self.temperature)
    }

    async fn direct_charge_status(&mut self) -> Result<DirectChargeStatus> {
        Ok(self.direct_status)
    }
}
