//! Power source identity and classification

pub mod classifier;
pub mod types;

pub use classifier::{ClassifyOutcome, PdContract, PowerSourceClassifier};
pub use types::{CableType, EventQueue, SourceEvent, WirelessKind, CABLE_TYPE_COUNT};
