//! Wireless TX (power sharing) configuration

/// Adaptive output voltage loop and fault handling for reverse charging
#[derive(Debug, Clone)]
pub struct TxConfig {
    /// Output voltage the preset phase ramps toward (default: 6000 mV)
    pub aov_start_mv: i32,

    /// Voltage nudge per monitor step (default: 500 mV)
    pub aov_step_mv: i32,

    /// Lower clamp for the monitor loop (default: 5000 mV)
    pub aov_min_mv: i32,

    /// Upper clamp for the monitor loop (default: 7500 mV)
    pub aov_max_mv: i32,

    /// Output voltage while the receiver sits in phase-hold mode (default: 5000 mV)
    pub aov_baseline_mv: i32,

    /// Operating frequency below which vout steps up (default: 130 kHz)
    pub freq_low_khz: i32,

    /// Operating frequency above which vout steps down (default: 145 kHz)
    pub freq_high_khz: i32,

    /// Settle delay between reaching the preset target and the first
    /// monitor step (default: 1000 ms)
    pub preset_settle_ms: u64,

    /// TX coil current limit while the receiver charges (default: 1100 mA)
    pub tx_current_ma: i32,

    /// TX coil current limit once the receiver reports full (default: 300 mA)
    pub tx_current_full_ma: i32,

    /// Device-specific coil current applied on phase-hold exit instead of
    /// `tx_current_ma` (default: none)
    pub phm_exit_current_ma: Option<i32>,

    /// Fast-charge cap on the local battery while transmitting (default: 1000 mA)
    pub tx_fcc_limit_ma: i32,

    /// Input current cap on the local battery while transmitting (default: 800 mA)
    pub tx_icl_limit_ma: i32,

    /// Consecutive faults tolerated before TX turns off for good (default: 3)
    pub fault_retry_limit: u8,

    /// Cool-down after the retry budget is exhausted (default: 60 s)
    pub fault_cooldown_ms: u64,

    /// Battery SOC below which TX is refused or stopped (default: 30)
    pub tx_min_soc: u8,

    /// Coil or battery temp above which TX stops, tenths C (default: 450)
    pub tx_high_temp: i32,

    /// Temp at which TX may resume, tenths C (default: 400)
    pub tx_high_temp_recovery: i32,
}

impl TxConfig {
    pub(crate) fn validate(&self) -> bool {
        self.aov_min_mv <= self.aov_baseline_mv
            && self.aov_baseline_mv <= self.aov_start_mv
            && self.aov_start_mv <= self.aov_max_mv
            && self.aov_step_mv > 0
            && self.freq_low_khz < self.freq_high_khz
            && self.tx_current_ma > self.tx_current_full_ma
            && self.tx_current_full_ma > 0
            && self.fault_retry_limit >= 1
            && self.tx_min_soc <= 100
            && self.tx_high_temp_recovery < self.tx_high_temp
    }
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            aov_start_mv: 6000,
            aov_step_mv: 500,
            aov_min_mv: 5000,
            aov_max_mv: 7500,
            aov_baseline_mv: 5000,
            freq_low_khz: 130,
            freq_high_khz: 145,
            preset_settle_ms: 1000,
            tx_current_ma: 1100,
            tx_current_full_ma: 300,
            phm_exit_current_ma: None,
            tx_fcc_limit_ma: 1000,
            tx_icl_limit_ma: 800,
            fault_retry_limit: 3,
            fault_cooldown_ms: 60_000,
            tx_min_soc: 30,
            tx_high_temp: 450,
            tx_high_temp_recovery: 400,
        }
    }
}
