//! Adaptive output voltage loop for the transmit coil
//!
//! The transmitter tunes its coil voltage to the receiver's operating
//! point. A fresh session ramps the output in fixed steps up to the
//! start voltage (`Preset`), then services the coupling by nudging the
//! voltage whenever the operating frequency leaves the configured band
//! (`Monitor`). A receiver reporting charge-full parks the loop at the
//! baseline voltage with a reduced coil current (`Phm`) until it
//! resumes drawing power.

use crate::config::TxConfig;
use crate::devices::traits::{Result, WirelessTxPort};

/// Position of the output-voltage loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AovState {
    /// Coil de-energized
    None,
    /// Ramping the output toward the start voltage
    Preset,
    /// Holding the operating frequency inside the band
    Monitor,
    /// Receiver in phase hold, output parked at the baseline
    Phm,
    /// Transmission disabled after an unrecoverable condition
    Error,
}

/// Loop state plus the last requested output voltage.
///
/// The loop drives the port but never energizes or de-energizes the
/// coil itself. The controller owns enable state and fault handling.
#[derive(Debug)]
pub(crate) struct AovLoop {
    state: AovState,
    requested_mv: i32,
    /// Monitor nudges held off until this time after the ramp settles
    hold_until_ms: Option<u64>,
}

impl AovLoop {
    pub const fn new() -> Self {
        Self {
            state: AovState::None,
            requested_mv: 0,
            hold_until_ms: None,
        }
    }

    pub fn state(&self) -> AovState {
        self.state
    }

    /// Arms the ramp for a freshly energized coil
    pub fn begin(&mut self) {
        self.state = AovState::Preset;
        self.requested_mv = 0;
        self.hold_until_ms = None;
    }

    /// Coil de-energized in an orderly way
    pub fn stop(&mut self) {
        self.state = AovState::None;
        self.requested_mv = 0;
        self.hold_until_ms = None;
    }

    /// Latches the error state until the controller re-arms the loop
    pub fn fail(&mut self) {
        self.state = AovState::Error;
        self.hold_until_ms = None;
    }

    /// One control pass. Call only while the coil is energized.
    pub async fn step<P: WirelessTxPort>(
        &mut self,
        port: &mut P,
        config: &TxConfig,
        now_ms: u64,
    ) -> Result<()> {
        match self.state {
            AovState::Preset => self.step_preset(port, config, now_ms).await,
            AovState::Monitor => {
                // a phase-hold request preempts band steering
                if port.rx_charge_full().await? {
                    self.enter_phm(port, config).await
                } else {
                    self.step_monitor(port, config, now_ms).await
                }
            }
            AovState::Phm => {
                if port.rx_charge_full().await? {
                    Ok(())
                } else {
                    self.leave_phm(port, config).await
                }
            }
            AovState::None | AovState::Error => Ok(()),
        }
    }

    /// Steps the output one increment toward the start voltage.
    ///
    /// The next request always starts from the measured output, so a
    /// request the chip did not take is simply issued again.
    async fn step_preset<P: WirelessTxPort>(
        &mut self,
        port: &mut P,
        config: &TxConfig,
        now_ms: u64,
    ) -> Result<()> {
        let measured = port.vout_mv().await?;
        if measured >= config.aov_start_mv {
            self.settle(config, now_ms);
            return Ok(());
        }
        let next = (measured + config.aov_step_mv).min(config.aov_start_mv);
        self.requested_mv = next;
        port.set_vout_mv(next).await?;
        crate::log_trace!("aov: preset ramp to {} mV", next);
        if port.vout_mv().await? >= config.aov_start_mv {
            self.settle(config, now_ms);
        }
        Ok(())
    }

    fn settle(&mut self, config: &TxConfig, now_ms: u64) {
        self.state = AovState::Monitor;
        self.hold_until_ms = Some(now_ms + config.preset_settle_ms);
        crate::log_info!("aov: preset reached {} mV, monitoring", config.aov_start_mv);
    }

    /// Compares the operating frequency against the band and nudges the
    /// output voltage one step, clamped to the configured range.
    async fn step_monitor<P: WirelessTxPort>(
        &mut self,
        port: &mut P,
        config: &TxConfig,
        now_ms: u64,
    ) -> Result<()> {
        if let Some(until) = self.hold_until_ms {
            if now_ms < until {
                return Ok(());
            }
            self.hold_until_ms = None;
        }
        let freq = port.operating_frequency_khz().await?;
        let step = if freq < config.freq_low_khz {
            // below the band the receiver is short on margin
            config.aov_step_mv
        } else if freq > config.freq_high_khz {
            -config.aov_step_mv
        } else {
            return Ok(());
        };
        let next = (self.requested_mv + step).clamp(config.aov_min_mv, config.aov_max_mv);
        if next != self.requested_mv {
            self.requested_mv = next;
            port.set_vout_mv(next).await?;
            crate::log_debug!("aov: {} kHz, nudged to {} mV", freq, next);
        }
        Ok(())
    }

    /// Parks the coil for a receiver in phase hold
    async fn enter_phm<P: WirelessTxPort>(
        &mut self,
        port: &mut P,
        config: &TxConfig,
    ) -> Result<()> {
        let full = port.rx_charge_full().await?;
        let hold_ma = if full {
            config.tx_current_full_ma
        } else {
            config.tx_current_ma
        };
        port.set_tx_current_ma(hold_ma).await?;
        self.requested_mv = config.aov_baseline_mv;
        port.set_vout_mv(config.aov_baseline_mv).await?;
        self.state = AovState::Phm;
        self.hold_until_ms = None;
        crate::log_info!("aov: phase hold at {} mV, {} mA", config.aov_baseline_mv, hold_ma);
        Ok(())
    }

    /// Receiver resumed drawing, lift the hold
    async fn leave_phm<P: WirelessTxPort>(
        &mut self,
        port: &mut P,
        config: &TxConfig,
    ) -> Result<()> {
        let restore_ma = config.phm_exit_current_ma.unwrap_or(config.tx_current_ma);
        port.set_tx_current_ma(restore_ma).await?;
        let target = (config.aov_start_mv + config.aov_step_mv).min(config.aov_max_mv);
        self.requested_mv = target;
        port.set_vout_mv(target).await?;
        self.state = AovState::Monitor;
        crate::log_info!("aov: phase hold released, {} mV restored", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::{MockWirelessTxPort, TxWrite};

    fn energized() -> (AovLoop, MockWirelessTxPort, TxConfig) {
        let mut aov = AovLoop::new();
        aov.begin();
        (aov, MockWirelessTxPort::new(), TxConfig::default())
    }

    async fn ramp_to_monitor(
        aov: &mut AovLoop,
        port: &mut MockWirelessTxPort,
        config: &TxConfig,
        now_ms: u64,
    ) {
        for _ in 0..32 {
            if aov.state() == AovState::Monitor {
                return;
            }
            aov.step(port, config, now_ms).await.unwrap();
        }
        panic!("ramp never reached monitor");
    }

    #[tokio::test]
    async fn test_preset_reaches_monitor_in_minimum_steps() {
        let (mut aov, mut port, config) = energized();
        port.set_measured_vout_mv(5000);

        // 1000 mV to cover in 500 mV steps
        aov.step(&mut port, &config, 0).await.unwrap();
        assert_eq!(aov.state(), AovState::Preset);
        aov.step(&mut port, &config, 0).await.unwrap();
        assert_eq!(aov.state(), AovState::Monitor);

        let writes = port.writes();
        assert_eq!(writes[0], TxWrite::Vout(5500));
        assert_eq!(writes[1], TxWrite::Vout(6000));
    }

    #[tokio::test]
    async fn test_preset_from_cold_coil() {
        let (mut aov, mut port, config) = energized();

        let mut steps = 0;
        while aov.state() == AovState::Preset {
            aov.step(&mut port, &config, 0).await.unwrap();
            steps += 1;
            assert!(steps <= 12, "ramp overran the step budget");
        }
        assert_eq!(steps, 12);
        assert_eq!(aov.state(), AovState::Monitor);
    }

    #[tokio::test]
    async fn test_preset_retries_request_the_chip_ignored() {
        let (mut aov, mut port, config) = energized();
        port.set_vout_settles(false);
        port.set_measured_vout_mv(5000);

        aov.step(&mut port, &config, 0).await.unwrap();
        aov.step(&mut port, &config, 0).await.unwrap();
        assert_eq!(port.writes().as_slice(), [TxWrite::Vout(5500), TxWrite::Vout(5500)]);

        // once the chip catches up the ramp moves on
        port.set_measured_vout_mv(5500);
        aov.step(&mut port, &config, 0).await.unwrap();
        assert_eq!(port.writes().last(), Some(&TxWrite::Vout(6000)));
        assert_eq!(aov.state(), AovState::Preset);
    }

    #[tokio::test]
    async fn test_monitor_waits_out_the_settle_window() {
        let (mut aov, mut port, config) = energized();
        port.set_measured_vout_mv(5500);
        ramp_to_monitor(&mut aov, &mut port, &config, 1000).await;
        port.clear_writes();
        port.set_frequency_khz(150);

        // settle hold runs until 2000
        aov.step(&mut port, &config, 1500).await.unwrap();
        assert!(port.writes().is_empty());

        aov.step(&mut port, &config, 2000).await.unwrap();
        assert_eq!(port.writes().as_slice(), [TxWrite::Vout(5500)]);
    }

    #[tokio::test]
    async fn test_monitor_nudges_down_to_the_floor() {
        let (mut aov, mut port, config) = energized();
        ramp_to_monitor(&mut aov, &mut port, &config, 0).await;
        port.clear_writes();
        port.set_frequency_khz(150);

        aov.step(&mut port, &config, 2000).await.unwrap();
        aov.step(&mut port, &config, 3000).await.unwrap();
        assert_eq!(port.writes().as_slice(), [TxWrite::Vout(5500), TxWrite::Vout(5000)]);

        // at the clamp no further write is issued
        aov.step(&mut port, &config, 4000).await.unwrap();
        assert_eq!(port.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_monitor_nudges_up_to_the_ceiling() {
        let (mut aov, mut port, config) = energized();
        ramp_to_monitor(&mut aov, &mut port, &config, 0).await;
        port.clear_writes();
        port.set_frequency_khz(120);

        for t in 0..4 {
            aov.step(&mut port, &config, 2000 + t * 1000).await.unwrap();
        }
        assert_eq!(
            port.writes().as_slice(),
            [TxWrite::Vout(6500), TxWrite::Vout(7000), TxWrite::Vout(7500)]
        );
    }

    #[tokio::test]
    async fn test_in_band_frequency_leaves_output_alone() {
        let (mut aov, mut port, config) = energized();
        ramp_to_monitor(&mut aov, &mut port, &config, 0).await;
        port.clear_writes();
        port.set_frequency_khz(140);

        aov.step(&mut port, &config, 2000).await.unwrap();
        assert!(port.writes().is_empty());
    }

    #[tokio::test]
    async fn test_phase_hold_parks_and_releases() {
        let (mut aov, mut port, config) = energized();
        ramp_to_monitor(&mut aov, &mut port, &config, 0).await;
        port.clear_writes();

        port.set_rx_charge_full(true);
        aov.step(&mut port, &config, 2000).await.unwrap();
        assert_eq!(aov.state(), AovState::Phm);
        assert_eq!(port.writes().as_slice(), [TxWrite::Current(300), TxWrite::Vout(5000)]);

        // holding costs nothing
        port.clear_writes();
        aov.step(&mut port, &config, 3000).await.unwrap();
        assert!(port.writes().is_empty());

        port.set_rx_charge_full(false);
        aov.step(&mut port, &config, 4000).await.unwrap();
        assert_eq!(aov.state(), AovState::Monitor);
        assert_eq!(port.writes().as_slice(), [TxWrite::Current(1100), TxWrite::Vout(6500)]);
    }

    #[tokio::test]
    async fn test_phase_hold_exit_honors_override_current() {
        let (mut aov, mut port, mut config) = energized();
        config.phm_exit_current_ma = Some(900);
        ramp_to_monitor(&mut aov, &mut port, &config, 0).await;

        port.set_rx_charge_full(true);
        aov.step(&mut port, &config, 2000).await.unwrap();
        port.clear_writes();

        port.set_rx_charge_full(false);
        aov.step(&mut port, &config, 3000).await.unwrap();
        assert_eq!(port.writes().as_slice(), [TxWrite::Current(900), TxWrite::Vout(6500)]);
    }
}
