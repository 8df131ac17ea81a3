//! Device interfaces and mock implementations
//!
//! `traits/` defines what the policy engine needs from the charger, fuel
//! gauge and wireless chip. `mock/` provides recording implementations for
//! host tests.

pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
