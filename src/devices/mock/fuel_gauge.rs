//! Mock fuel gauge implementation for testing

use crate::devices::traits::{FuelGauge, Result};

/// Mock fuel gauge with programmable telemetry.
///
/// Defaults describe a healthy battery at rest: 50 %, 3.9 V, room
/// temperature, no current flowing.
#[derive(Debug, Clone)]
pub struct MockFuelGauge {
    pub voltage_now_mv: i32,
    pub voltage_avg_mv: i32,
    pub voltage_ocv_mv: i32,
    pub current_now_ma: i32,
    pub current_avg_ma: i32,
    pub capacity_percent: u8,
    pub temperature: i32,
    pub usb_temperature: i32,
    pub sub_temperature: i32,
    pub cycle_count: u16,
    pub charge_full: bool,
    /// Number of times the engine cleared the full marker
    pub full_resets: u32,
}

impl Default for MockFuelGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFuelGauge {
    pub fn new() -> Self {
        Self {
            voltage_now_mv: 3900,
            voltage_avg_mv: 3900,
            voltage_ocv_mv: 3900,
            current_now_ma: 0,
            current_avg_ma: 0,
            capacity_percent: 50,
            temperature: 250,
            usb_temperature: 250,
            sub_temperature: 250,
            cycle_count: 0,
            charge_full: false,
            full_resets: 0,
        }
    }

    /// Program voltage now and average together
    pub fn set_voltage_mv(&mut self, mv: i32) {
        self.voltage_now_mv = mv;
        self.voltage_avg_mv = mv;
        self.voltage_ocv_mv = mv;
    }

    /// Program current now and average together
    pub fn set_current_ma(&mut self, ma: i32) {
        self.current_now_ma = ma;
        self.current_avg_ma = ma;
    }
}

impl FuelGauge for MockFuelGauge {
    async fn voltage_now_mv(&mut self) -> Result<i32> {
        Ok(self.voltage_now_mv)
    }

    async fn voltage_avg_mv(&mut self) -> Result<i32> {
        Ok(self.voltage_avg_mv)
    }

    async fn voltage_ocv_mv(&mut self) -> Result<i32> {
        Ok(self.voltage_ocv_mv)
    }

    async fn current_now_ma(&mut self) -> Result<i32> {
        Ok(self.current_now_ma)
    }

    async fn current_avg_ma(&mut self) -> Result<i32> {
        Ok(self.current_avg_ma)
    }

    async fn capacity_percent(&mut self) -> Result<u8> {
        Ok(self.capacity_percent)
    }

    async fn temperature(&mut self) -> Result<i32> {
        Ok(self.temperature)
    }

    async fn usb_temperature(&mut self) -> Result<i32> {
        Ok(self.usb_temperature)
    }

    async fn sub_temperature(&mut self) -> Result<i32> {
        Ok(self.sub_temperature)
    }

    async fn cycle_count(&mut self) -> Result<u16> {
        Ok(self.cycle_count)
    }

    async fn is_charge_full(&mut self) -> Result<bool> {
        Ok(self.charge_full)
    }

    async fn reset_charge_full(&mut self) -> Result<()> {
        self.charge_full = false;
        self.full_resets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gauge_reads_programmed_values() {
        let mut gauge = MockFuelGauge::new();
        gauge.set_voltage_mv(4200);
        gauge.set_current_ma(1500);
        gauge.capacity_percent = 85;

        assert_eq!(gauge.voltage_now_mv().await.unwrap(), 4200);
        assert_eq!(gauge.current_avg_ma().await.unwrap(), 1500);
        assert_eq!(gauge.capacity_percent().await.unwrap(), 85);
    }

    #[tokio::test]
    async fn test_mock_gauge_full_marker_reset() {
        let mut gauge = MockFuelGauge::new();
        gauge.charge_full = true;

        gauge.reset_charge_full().await.unwrap();
        assert!(!gauge.is_charge_full().await.unwrap());
        assert_eq!(gauge.full_resets, 1);
    }
}
