//! Abstraction traits shared across the crate
//!
//! Contains the synchronized-state abstraction that lets policy code run
//! unchanged behind an interrupt-safe mutex on embedded targets and behind
//! a plain `RefCell` in host tests.

pub mod sync;

pub use sync::{MockState, SharedState};

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;
