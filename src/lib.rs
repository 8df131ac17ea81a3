#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! charge_guard - Charging policy engine for battery-powered devices
//!
//! This library is the decision core of a battery/charging controller: it
//! turns power-source attach events, telemetry and policy requests into one
//! consistent set of charger parameters (input current limit, fast-charge
//! current, float voltage, input voltage, charge enable) and keeps the
//! physical charger inside its safety envelope.

// Core infrastructure (logging, event flags, shared-state access)
pub mod core;

// Static configuration tables
pub mod config;

// Collaborator device interfaces (charger, fuel gauge, wireless IC)
pub mod devices;

// Multi-source vote arbitration
pub mod vote;

// Power-source classification and the attach/detach event queue
pub mod cable;

// Thermal, full-charge, safety-timer and health evaluation
pub mod monitor;

// The periodic supervisory cycle and the published battery state
pub mod supervisor;

// Wireless power transmission (reverse charging) control loop
pub mod tx;
