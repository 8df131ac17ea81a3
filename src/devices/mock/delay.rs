//! Mock delay implementation for testing

use crate::devices::traits::Delay;

/// Mock delay advancing simulated time instead of sleeping
#[derive(Debug, Default)]
pub struct MockDelay {
    elapsed_ms: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total simulated time spent delaying
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

impl Delay for MockDelay {
    async fn delay_ms(&mut self, ms: u64) {
        self.elapsed_ms = self.elapsed_ms.wrapping_add(ms);
    }
}
