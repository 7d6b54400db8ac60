//! Periodic "come back and train" reminders.
//!
//! One [`ReminderScheduler`] is built at startup and shared through an `Arc`
//! with everything that needs to pause or resume it. Several independent
//! callers (route changes, foreground/background, session start/finish) may
//! call `pause`/`resume` without knowing about each other, so every command
//! is idempotent and the final state depends only on the last effective
//! command, not on how many duplicates arrived.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -start-> Running -pause-> Paused -resume-> Running
//!    ^                                                  |
//!    +----------------------- stop ---------------------+
//! ```
//!
//! `pause` and `resume` only act on a started scheduler. A `pause` while
//! `Stopped` changes nothing, so a later `start` always delivers at once.

mod surface;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReminderError;
use crate::timer::{lock, TickFlow, Timer, TimerHandle};

pub use surface::{Notification, NotificationSurface, Permission, UnsupportedSurface};

pub const DEFAULT_REMINDER_TITLE: &str = "Time to get back to training";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    /// No tick source, but should be running again on resume.
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    pub interval: Duration,
    pub title: String,
    pub body: String,
    pub notification_id: i32,
    pub sound: Option<String>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            title: DEFAULT_REMINDER_TITLE.to_string(),
            body: String::new(),
            notification_id: 1,
            sound: Some("default".to_string()),
        }
    }
}

impl ReminderSettings {
    pub fn notification(&self) -> Notification {
        Notification {
            id: self.notification_id,
            title: self.title.clone(),
            body: self.body.clone(),
            sound: self.sound.clone(),
        }
    }
}

/// Snapshot of the scheduler for settings and diagnostics screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub run_state: RunState,
    pub permission_granted: bool,
    /// Set by `pause`, cleared by `resume` and `stop`.
    pub resume_pending: bool,
    /// Reminders delivered successfully since construction.
    pub delivered: u64,
}

struct Inner {
    run_state: RunState,
    permission_granted: bool,
    resume_pending: bool,
    tick: Option<TimerHandle>,
    epoch: u64,
    delivered: u64,
}

pub struct ReminderScheduler {
    timer: Arc<dyn Timer>,
    surface: Arc<dyn NotificationSurface>,
    settings: ReminderSettings,
    inner: Arc<Mutex<Inner>>,
}

impl ReminderScheduler {
    pub fn new(
        timer: Arc<dyn Timer>,
        surface: Arc<dyn NotificationSurface>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            timer,
            surface,
            settings,
            inner: Arc::new(Mutex::new(Inner {
                run_state: RunState::Stopped,
                permission_granted: false,
                resume_pending: false,
                tick: None,
                epoch: 0,
                delivered: 0,
            })),
        }
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    pub fn run_state(&self) -> RunState {
        lock(&self.inner).run_state
    }

    pub fn state(&self) -> SchedulerState {
        let inner = lock(&self.inner);
        SchedulerState {
            run_state: inner.run_state,
            permission_granted: inner.permission_granted,
            resume_pending: inner.resume_pending,
            delivered: inner.delivered,
        }
    }

    /// Whether the platform currently allows notifications. Never changes
    /// scheduler state.
    pub fn is_enabled(&self) -> bool {
        if !self.surface.is_supported() {
            return false;
        }
        match self.surface.check_permission() {
            Ok(permission) => permission == Permission::Granted,
            Err(err) => {
                tracing::warn!(%err, "cannot check notification permission");
                false
            }
        }
    }

    /// Obtain permission and start reminding. Failures leave the scheduler
    /// `Stopped`; there is no retry.
    pub fn initialize(&self) -> Result<(), ReminderError> {
        if !self.surface.is_supported() {
            tracing::info!("notifications are only supported on native platforms");
            return Err(ReminderError::PlatformUnsupported);
        }

        let permission = match self.surface.check_permission() {
            Ok(Permission::Undetermined) => self.surface.request_permission().unwrap_or_else(|err| {
                tracing::warn!(%err, "notification permission request failed");
                Permission::Denied
            }),
            Ok(permission) => permission,
            Err(err) => {
                tracing::warn!(%err, "cannot check notification permission");
                Permission::Denied
            }
        };

        if permission != Permission::Granted {
            tracing::warn!("notification permission was not granted");
            return Err(ReminderError::PermissionDenied);
        }

        lock(&self.inner).permission_granted = true;
        self.start()?;
        Ok(())
    }

    /// Deliver one reminder now and then every interval. Returns false when
    /// already running or paused.
    pub fn start(&self) -> Result<bool, ReminderError> {
        let mut inner = lock(&self.inner);
        if inner.run_state != RunState::Stopped {
            return Ok(false);
        }
        if !inner.permission_granted {
            return Err(ReminderError::PermissionDenied);
        }

        self.begin(&mut inner);
        tracing::info!(interval_secs = self.settings.interval.as_secs(), "reminders started");
        Ok(true)
    }

    /// Stop ticking but remember to restart on `resume`.
    pub fn pause(&self) -> bool {
        let mut inner = lock(&self.inner);
        match inner.run_state {
            RunState::Running => {
                self.cancel_tick(&mut inner);
                inner.run_state = RunState::Paused;
                inner.resume_pending = true;
                tracing::debug!("reminders paused");
                true
            }
            RunState::Stopped | RunState::Paused => false,
        }
    }

    /// Restart a paused scheduler, delivering immediately. Never starts a
    /// scheduler that was not started.
    pub fn resume(&self) -> bool {
        let mut inner = lock(&self.inner);
        match inner.run_state {
            RunState::Paused => {
                inner.resume_pending = false;
                self.begin(&mut inner);
                tracing::debug!("reminders resumed");
                true
            }
            RunState::Stopped | RunState::Running => false,
        }
    }

    pub fn stop(&self) {
        let mut inner = lock(&self.inner);
        self.cancel_tick(&mut inner);
        inner.resume_pending = false;
        if inner.run_state != RunState::Stopped {
            tracing::info!("reminders stopped");
        }
        inner.run_state = RunState::Stopped;
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Deliver now, replace the tick source, and mark running.
    fn begin(&self, inner: &mut Inner) {
        self.cancel_tick(inner);
        inner.epoch += 1;
        inner.run_state = RunState::Running;

        let notification = self.settings.notification();
        deliver(self.surface.as_ref(), &notification, inner);

        let epoch = inner.epoch;
        let weak = Arc::downgrade(&self.inner);
        let surface = self.surface.clone();
        let handle = self.timer.schedule(
            self.settings.interval,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return TickFlow::Stop;
                };
                let mut inner = lock(&shared);
                if inner.epoch != epoch || inner.run_state != RunState::Running {
                    return TickFlow::Stop;
                }
                deliver(surface.as_ref(), &notification, &mut inner);
                TickFlow::Continue
            }),
        );
        inner.tick = Some(handle);
    }

    fn cancel_tick(&self, inner: &mut Inner) {
        if let Some(handle) = inner.tick.take() {
            self.timer.cancel(handle);
        }
    }
}

fn deliver(surface: &dyn NotificationSurface, notification: &Notification, inner: &mut Inner) {
    match surface.deliver(notification) {
        Ok(()) => inner.delivered += 1,
        // A failed reminder never stops the schedule.
        Err(err) => tracing::warn!(%err, "reminder delivery failed"),
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.inner).tick.take() {
            self.timer.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeSurface {
        permission: Mutex<Permission>,
        answer: Permission,
        requests: AtomicUsize,
        fail: AtomicBool,
        delivered: Mutex<Vec<Notification>>,
    }

    impl FakeSurface {
        fn new(permission: Permission, answer: Permission) -> Arc<Self> {
            Arc::new(Self {
                permission: Mutex::new(permission),
                answer,
                requests: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delivered: Mutex::new(Vec::new()),
            })
        }

        fn granted() -> Arc<Self> {
            Self::new(Permission::Granted, Permission::Granted)
        }

        fn count(&self) -> usize {
            lock(&self.delivered).len()
        }
    }

    impl NotificationSurface for FakeSurface {
        fn check_permission(&self) -> Result<Permission, ReminderError> {
            Ok(*lock(&self.permission))
        }

        fn request_permission(&self) -> Result<Permission, ReminderError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            *lock(&self.permission) = self.answer;
            Ok(self.answer)
        }

        fn deliver(&self, notification: &Notification) -> Result<(), ReminderError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ReminderError::DeliveryFailure("offline".into()));
            }
            lock(&self.delivered).push(notification.clone());
            Ok(())
        }
    }

    const INTERVAL: Duration = Duration::from_secs(5);

    fn scheduler(surface: Arc<FakeSurface>) -> (ReminderScheduler, Arc<ManualTimer>) {
        let timer = Arc::new(ManualTimer::new());
        let settings = ReminderSettings {
            interval: INTERVAL,
            ..ReminderSettings::default()
        };
        (ReminderScheduler::new(timer.clone(), surface, settings), timer)
    }

    #[test]
    fn initialize_granted_starts_and_delivers_immediately() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());

        scheduler.initialize().unwrap();
        assert_eq!(scheduler.run_state(), RunState::Running);
        assert_eq!(surface.count(), 1);
        assert_eq!(lock(&surface.delivered)[0].title, DEFAULT_REMINDER_TITLE);

        timer.advance(INTERVAL * 3);
        assert_eq!(surface.count(), 4);
        assert_eq!(scheduler.state().delivered, 4);
    }

    #[test]
    fn initialize_denied_stays_stopped_without_asking() {
        let surface = FakeSurface::new(Permission::Denied, Permission::Granted);
        let (scheduler, timer) = scheduler(surface.clone());

        assert_eq!(scheduler.initialize(), Err(ReminderError::PermissionDenied));
        assert_eq!(scheduler.run_state(), RunState::Stopped);
        assert_eq!(surface.requests.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn initialize_requests_undetermined_permission() {
        let surface = FakeSurface::new(Permission::Undetermined, Permission::Granted);
        let (scheduler, _) = scheduler(surface.clone());
        scheduler.initialize().unwrap();
        assert_eq!(surface.requests.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.run_state(), RunState::Running);

        let refused = FakeSurface::new(Permission::Undetermined, Permission::Denied);
        let (scheduler, _) = self::scheduler(refused);
        assert_eq!(scheduler.initialize(), Err(ReminderError::PermissionDenied));
        assert_eq!(scheduler.run_state(), RunState::Stopped);
    }

    #[test]
    fn unsupported_platform_is_reported() {
        let timer = Arc::new(ManualTimer::new());
        let scheduler = ReminderScheduler::new(timer, Arc::new(UnsupportedSurface), ReminderSettings::default());
        assert_eq!(scheduler.initialize(), Err(ReminderError::PlatformUnsupported));
        assert!(!scheduler.is_enabled());
        assert_eq!(scheduler.run_state(), RunState::Stopped);
    }

    #[test]
    fn start_without_permission_fails() {
        let (scheduler, _) = scheduler(FakeSurface::granted());
        assert_eq!(scheduler.start(), Err(ReminderError::PermissionDenied));
        assert_eq!(scheduler.run_state(), RunState::Stopped);
    }

    #[test]
    fn start_twice_keeps_one_tick_source() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());
        scheduler.initialize().unwrap();
        assert_eq!(scheduler.start(), Ok(false));
        assert_eq!(timer.pending(), 1);
        assert_eq!(surface.count(), 1);
    }

    #[test]
    fn pause_is_idempotent_and_silences_reminders() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());
        scheduler.initialize().unwrap();

        assert!(scheduler.pause());
        assert!(!scheduler.pause());
        assert_eq!(scheduler.run_state(), RunState::Paused);
        assert_eq!(timer.pending(), 0);

        timer.advance(INTERVAL * 10);
        assert_eq!(surface.count(), 1);
    }

    #[test]
    fn resume_is_idempotent_and_delivers_immediately() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());
        scheduler.initialize().unwrap();
        scheduler.pause();

        assert!(scheduler.resume());
        assert!(!scheduler.resume());
        assert_eq!(scheduler.run_state(), RunState::Running);
        assert_eq!(surface.count(), 2);
        assert_eq!(timer.pending(), 1);

        timer.advance(INTERVAL);
        assert_eq!(surface.count(), 3);
    }

    #[test]
    fn resume_never_starts_unstarted_scheduler() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());
        assert!(!scheduler.resume());
        assert_eq!(scheduler.run_state(), RunState::Stopped);
        assert_eq!(timer.pending(), 0);
        assert_eq!(surface.count(), 0);
    }

    #[test]
    fn stop_from_any_state() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface);

        scheduler.stop();
        assert_eq!(scheduler.run_state(), RunState::Stopped);

        scheduler.initialize().unwrap();
        scheduler.stop();
        assert_eq!(scheduler.run_state(), RunState::Stopped);
        assert_eq!(timer.pending(), 0);

        scheduler.start().unwrap();
        scheduler.pause();
        scheduler.stop();
        assert_eq!(scheduler.run_state(), RunState::Stopped);
        assert!(!scheduler.resume());
        assert_eq!(scheduler.run_state(), RunState::Stopped);
    }

    #[test]
    fn pause_while_stopped_does_not_affect_start() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());

        assert!(!scheduler.pause());
        assert_eq!(scheduler.state().run_state, RunState::Stopped);
        assert!(!scheduler.state().resume_pending);

        scheduler.initialize().unwrap();
        assert_eq!(scheduler.run_state(), RunState::Running);
        assert_eq!(surface.count(), 1);
        assert_eq!(timer.pending(), 1);
    }

    #[test]
    fn resume_pending_tracks_pause_and_stop() {
        let (scheduler, _) = scheduler(FakeSurface::granted());
        scheduler.initialize().unwrap();

        scheduler.pause();
        assert!(scheduler.state().resume_pending);
        scheduler.resume();
        assert!(!scheduler.state().resume_pending);

        scheduler.pause();
        scheduler.stop();
        assert!(!scheduler.state().resume_pending);
        assert_eq!(scheduler.run_state(), RunState::Stopped);
    }

    #[test]
    fn delivery_failures_do_not_stop_ticking() {
        let surface = FakeSurface::granted();
        let (scheduler, timer) = scheduler(surface.clone());
        scheduler.initialize().unwrap();

        surface.fail.store(true, Ordering::SeqCst);
        timer.advance(INTERVAL * 2);
        assert_eq!(scheduler.run_state(), RunState::Running);
        assert_eq!(timer.pending(), 1);

        surface.fail.store(false, Ordering::SeqCst);
        timer.advance(INTERVAL);
        assert_eq!(surface.count(), 2);
        assert_eq!(scheduler.state().delivered, 2);
    }

    #[test]
    fn is_enabled_does_not_mutate() {
        let surface = FakeSurface::new(Permission::Undetermined, Permission::Granted);
        let (scheduler, _) = scheduler(surface.clone());
        assert!(!scheduler.is_enabled());
        assert_eq!(surface.requests.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.run_state(), RunState::Stopped);

        *lock(&surface.permission) = Permission::Granted;
        assert!(scheduler.is_enabled());
        assert!(!scheduler.state().permission_granted);
    }
}
