//! Core infrastructure
//!
//! This module contains the cross-cutting pieces of the charging engine:
//! logging macros, the event-flag sets surfaced to the platform, and the
//! shared-state access traits used by the supervisory and TX tasks.

pub mod events;
pub mod logging;
pub mod traits;
