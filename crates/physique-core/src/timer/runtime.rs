//! Timer backed by tokio tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{clamp_period, lock, TickFlow, Timer, TimerCallback, TimerHandle};

struct Entry {
    /// `None` while the callback is running.
    callback: Option<TimerCallback>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: HashMap<u64, Entry>,
}

/// Spawns one task per handle on the given runtime.
pub struct RuntimeTimer {
    runtime: Handle,
    inner: Arc<Mutex<Inner>>,
}

impl RuntimeTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Timer on the runtime the caller is currently inside.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    fn register(&self, callback: TimerCallback) -> (u64, std::sync::MutexGuard<'_, Inner>) {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(
            id,
            Entry {
                callback: Some(callback),
                task: None,
            },
        );
        (id, inner)
    }
}

/// Runs one tick of `id`. Returns false once the handle is gone.
fn run_tick(inner: &Mutex<Inner>, id: u64) -> bool {
    let Some(mut callback) = ({
        let mut guard = lock(inner);
        guard.entries.get_mut(&id).and_then(|e| e.callback.take())
    }) else {
        return false;
    };

    let flow = callback();

    let mut guard = lock(inner);
    match (flow, guard.entries.get_mut(&id)) {
        (TickFlow::Continue, Some(entry)) => {
            entry.callback = Some(callback);
            true
        }
        _ => {
            guard.entries.remove(&id);
            false
        }
    }
}

impl Timer for RuntimeTimer {
    fn schedule(&self, interval: Duration, callback: TimerCallback) -> TimerHandle {
        let period = clamp_period(interval);
        let (id, mut guard) = self.register(callback);
        let inner = self.inner.clone();

        let task = self.runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !run_tick(&inner, id) {
                    break;
                }
            }
        });

        if let Some(entry) = guard.entries.get_mut(&id) {
            entry.task = Some(task);
        }
        TimerHandle(id)
    }

    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let (id, mut guard) = self.register(callback);
        let inner = self.inner.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if run_tick(&inner, id) {
                lock(&inner).entries.remove(&id);
            }
        });

        if let Some(entry) = guard.entries.get_mut(&id) {
            entry.task = Some(task);
        }
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let removed = lock(&self.inner).entries.remove(&handle.0);
        if let Some(task) = removed.and_then(|e| e.task) {
            task.abort();
        }
    }

    fn is_active(&self, handle: TimerHandle) -> bool {
        lock(&self.inner).entries.contains_key(&handle.0)
    }
}

impl Drop for RuntimeTimer {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.inner).entries.drain() {
            if let Some(task) = entry.task {
                task.abort();
            }
        }
    }
}
