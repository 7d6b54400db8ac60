//! Cancellable periodic and one-shot timers.
//!
//! Components never sleep or spawn on their own; they hold an
//! `Arc<dyn Timer>` and hand it callbacks. Two implementations exist:
//!
//! - [`ManualTimer`]: a virtual clock advanced explicitly by the caller.
//!   Everything fires synchronously on the caller's thread, which makes
//!   countdowns and reminder intervals testable without wall-clock delays.
//! - [`RuntimeTimer`]: one tokio task per handle.
//!
//! ## Cancellation
//!
//! A callback is taken out of the timer table while it runs and put back
//! afterwards only if its handle is still registered. `cancel` removes the
//! registration under the same lock, so once it returns no further tick of
//! that handle can start, even one that was already due. Callbacks may call
//! `cancel` or `schedule` (on any handle, including their own) freely.

mod manual;
mod runtime;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use manual::ManualTimer;
pub use runtime::RuntimeTimer;

/// What a periodic callback wants after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    /// Unregister the handle; the callback is dropped.
    Stop,
}

/// Boxed timer callback.
pub type TimerCallback = Box<dyn FnMut() -> TickFlow + Send + 'static>;

/// Opaque identifier of a scheduled callback. Never reused by a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait Timer: Send + Sync {
    /// Run `callback` every `interval`, first after one full interval.
    fn schedule(&self, interval: Duration, callback: TimerCallback) -> TimerHandle;

    /// Run `callback` once after `delay`. Its `TickFlow` is ignored.
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Unregister `handle`. Unknown or already finished handles are ignored.
    fn cancel(&self, handle: TimerHandle);

    /// Whether `handle` is still registered.
    fn is_active(&self, handle: TimerHandle) -> bool;
}

/// Smallest period accepted for periodic callbacks.
pub(crate) const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Largest period; longer ones would overflow clock arithmetic.
pub(crate) const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub(crate) fn clamp_period(interval: Duration) -> Duration {
    interval.clamp(MIN_PERIOD, MAX_PERIOD)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
