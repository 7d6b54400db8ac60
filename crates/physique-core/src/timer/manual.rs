//! Virtual-clock timer.
//!
//! ```ignore
//! let timer = ManualTimer::new();
//! let handle = timer.schedule(Duration::from_secs(1), Box::new(|| TickFlow::Continue));
//! timer.advance(Duration::from_secs(3)); // fires three times
//! timer.cancel(handle);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{clamp_period, lock, TickFlow, Timer, TimerCallback, TimerHandle};

struct Entry {
    due: Duration,
    period: Option<Duration>,
    /// `None` while the callback is running.
    callback: Option<TimerCallback>,
}

#[derive(Default)]
struct Inner {
    now: Duration,
    next_id: u64,
    entries: BTreeMap<u64, Entry>,
}

/// Timer driven by explicit [`ManualTimer::advance`] calls.
#[derive(Default)]
pub struct ManualTimer {
    inner: Mutex<Inner>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        lock(&self.inner).now
    }

    /// Number of registered handles.
    pub fn pending(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// Move the clock forward by `by`, firing every callback that falls due
    /// in deadline order (ties in scheduling order). Returns how many
    /// callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = lock(&self.inner).now.saturating_add(by);
        let mut fired = 0;

        loop {
            let (id, period, mut callback) = {
                let mut inner = lock(&self.inner);
                let next = inner
                    .entries
                    .iter()
                    .filter(|(_, e)| e.callback.is_some() && e.due <= target)
                    .min_by_key(|(id, e)| (e.due, **id))
                    .map(|(id, e)| (*id, e.due));

                let Some((id, due)) = next else {
                    inner.now = target;
                    break;
                };
                inner.now = inner.now.max(due);

                let Some(entry) = inner.entries.get_mut(&id) else {
                    continue;
                };
                let Some(callback) = entry.callback.take() else {
                    continue;
                };
                (id, entry.period, callback)
            };

            let flow = callback();
            fired += 1;

            let mut inner = lock(&self.inner);
            match (period, flow) {
                (Some(period), TickFlow::Continue) => {
                    if let Some(entry) = inner.entries.get_mut(&id) {
                        entry.callback = Some(callback);
                        entry.due = entry.due.saturating_add(period);
                    }
                }
                _ => {
                    inner.entries.remove(&id);
                }
            }
        }

        fired
    }

    fn insert(&self, after: Duration, period: Option<Duration>, callback: TimerCallback) -> TimerHandle {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        let due = inner.now.saturating_add(after);
        inner.entries.insert(
            id,
            Entry {
                due,
                period,
                callback: Some(callback),
            },
        );
        TimerHandle(id)
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, interval: Duration, callback: TimerCallback) -> TimerHandle {
        let period = clamp_period(interval);
        self.insert(period, Some(period), callback)
    }

    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        self.insert(delay, None, callback)
    }

    fn cancel(&self, handle: TimerHandle) {
        lock(&self.inner).entries.remove(&handle.0);
    }

    fn is_active(&self, handle: TimerHandle) -> bool {
        lock(&self.inner).entries.contains_key(&handle.0)
    }
}
