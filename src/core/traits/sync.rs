//! Shared mutable state behind a platform-selected lock.
//!
//! Three pieces of state cross task boundaries in this crate: the vote
//! arbiter, the supervisor controls and the published battery snapshot.
//! All go through the `SharedState` trait so the same policy code runs
//! behind an Embassy critical-section mutex on target and behind a
//! `RefCell` in host tests.

/// Closure-scoped access to a shared value.
///
/// Implemented by `EmbassyState<T>` (critical-section mutex, target) and
/// `MockState<T>` (`RefCell`, host tests).
///
/// Closures passed to `with`/`with_mut` run with the lock held, so they must
/// stay short and must not perform device I/O. The vote apply path depends on
/// this: resolutions are computed under the lock, device writes happen after
/// it is released.
///
/// # Example
///
/// ```ignore
/// fn bump_tick_count<S: SharedState<u32>>(state: &S) -> u32 {
///     state.with_mut(|count| {
///         *count += 1;
///         *count
///     })
/// }
/// ```
pub trait SharedState<T> {
    /// Runs `f` with a shared borrow of the value.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Runs `f` with an exclusive borrow of the value.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

// ============================================================================
// Embassy Implementation
// ============================================================================

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Shared state under Embassy's critical-section mutex.
///
/// Interrupt-safe, so snapshot reads from other tasks and vote casts from
/// the TX controller may interleave freely with the supervisor tick.
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, core::cell::RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Const so a `static` can own one.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(core::cell::RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Single-threaded stand-in backed by a `RefCell`.
///
/// # Panics
///
/// Panics on a borrow violation, such as `with_mut` inside a live `with`
/// closure. That is a bug in the calling test, not a runtime condition.
///
/// # Example
///
/// ```
/// use charge_guard::core::traits::sync::{MockState, SharedState};
///
/// let state = MockState::new(42u32);
///
/// let value = state.with(|v| *v);
/// assert_eq!(value, 42);
///
/// state.with_mut(|v| *v += 1);
/// assert_eq!(state.with(|v| *v), 43);
/// ```
pub struct MockState<T> {
    inner: core::cell::RefCell<T>,
}

impl<T> MockState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: core::cell::RefCell::new(value),
        }
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
