//! Bounded asynchronous delay
//!
//! Settle waits inside multi-step hardware sequences go through this trait
//! so the sequences stay testable on the host with simulated time.

/// Asynchronous delay provider
#[allow(async_fn_in_trait)]
pub trait Delay {
    /// Suspend the caller for at least `ms` milliseconds
    async fn delay_ms(&mut self, ms: u64);
}

/// Embassy-backed delay for embedded targets
#[cfg(feature = "embassy")]
#[derive(Debug, Default)]
pub struct EmbassyDelay;

#[cfg(feature = "embassy")]
impl Delay for EmbassyDelay {
    async fn delay_ms(&mut self, ms: u64) {
        embassy_time::Timer::after_millis(ms).await;
    }
}
