//! Thermal and safety evaluation
//!
//! Stateful monitors the supervisor runs each tick: thermal zone
//! classification, predicted battery temperature, full/recharge detection,
//! the charging safety timer and charger health fault tracking. Each owns
//! its debounce and hysteresis state; none touches hardware directly, all
//! consequences flow through arbiter votes.

pub mod full_charge;
pub mod health;
pub mod lrp;
pub mod safety_timer;
pub mod thermal;

pub use full_charge::{check_recharge, FullChargeDetector, FullChargeInputs, FullStage};
pub use health::HealthMonitor;
pub use lrp::LrpEstimator;
pub use safety_timer::SafetyTimer;
pub use thermal::{ThermalDecision, ThermalInputs, ThermalMonitor, ThermalZone};
