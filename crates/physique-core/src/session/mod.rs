//! Active training session controller.
//!
//! Owns the live session scratchpad: which plan is loaded, which sets are
//! done, which exercise the user is looking at, and the rest countdown
//! between exercises. Nothing here is persisted; finishing a session resets
//! it to a fresh `NotStarted` snapshot.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running <-> Paused
//!                  \          /
//!                   Finished -> NotStarted
//! ```
//!
//! ## Rest countdown
//!
//! Completing the last set of exercise `i` while running starts a countdown
//! towards exercise `i + 1`. Its length is exercise `i + 1`'s rest seconds,
//! or exercise `i`'s when the next one has none. It is ticked once per
//! `rest_tick` by the injected [`Timer`]. Each countdown carries an epoch; ticks from a replaced
//! or cancelled countdown are ignored.

mod progress;
mod provider;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::SessionError;
use crate::events::Event;
use crate::models::TrainingPlan;
use crate::timer::{lock, TickFlow, Timer, TimerHandle};

pub use progress::{ExerciseProgress, RestCountdown, SessionStatus, SessionView, SetToggle};
pub use provider::{AlwaysConfirm, ConfirmationPresenter, PlanProvider};

pub const DEFAULT_FINISH_PROMPT: &str = "Do you really want to finish the training?";

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Countdown tick period; one tick removes one second of rest.
    pub rest_tick: Duration,
    /// Message shown by the confirmation presenter before finishing.
    pub finish_prompt: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rest_tick: Duration::from_secs(1),
            finish_prompt: DEFAULT_FINISH_PROMPT.to_string(),
        }
    }
}

struct LiveCountdown {
    countdown: RestCountdown,
    handle: Option<TimerHandle>,
    epoch: u64,
}

struct SessionState {
    plan: Option<TrainingPlan>,
    exercises: Vec<ExerciseProgress>,
    status: SessionStatus,
    current_exercise_index: usize,
    countdown: Option<LiveCountdown>,
    epoch: u64,
}

impl SessionState {
    fn empty() -> Self {
        Self {
            plan: None,
            exercises: Vec::new(),
            status: SessionStatus::NotStarted,
            current_exercise_index: 0,
            countdown: None,
            epoch: 0,
        }
    }

    fn view(&self) -> SessionView {
        SessionView {
            plan: self.plan.clone(),
            status: self.status,
            current_exercise_index: self.current_exercise_index,
            exercises: self.exercises.clone(),
            countdown: self.countdown.as_ref().map(|live| live.countdown),
        }
    }
}

pub struct SessionController {
    provider: Arc<dyn PlanProvider>,
    timer: Arc<dyn Timer>,
    settings: SessionSettings,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<Event>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn PlanProvider>, timer: Arc<dyn Timer>) -> Self {
        Self::with_settings(provider, timer, SessionSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn PlanProvider>,
        timer: Arc<dyn Timer>,
        settings: SessionSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            timer,
            settings,
            state: Arc::new(Mutex::new(SessionState::empty())),
            events,
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn view(&self) -> SessionView {
        lock(&self.state).view()
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.state).status
    }

    pub fn current_exercise_index(&self) -> usize {
        lock(&self.state).current_exercise_index
    }

    pub fn current_exercise(&self) -> Option<ExerciseProgress> {
        let state = lock(&self.state);
        state.exercises.get(state.current_exercise_index).cloned()
    }

    pub fn countdown(&self) -> Option<RestCountdown> {
        lock(&self.state).countdown.as_ref().map(|live| live.countdown)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Load the provider's active plan.
    pub fn load_session(&self) -> Result<SessionView, SessionError> {
        let plan = self
            .provider
            .active_plan()?
            .ok_or(SessionError::NoActivePlan)?;
        self.load_plan(plan)
    }

    /// Load `plan` and build fresh progress for each of its exercises.
    pub fn load_plan(&self, plan: TrainingPlan) -> Result<SessionView, SessionError> {
        let mut exercises = self.provider.exercises_for_plan(&plan.id)?;
        exercises.sort_by_key(|e| e.order);

        let mut state = lock(&self.state);
        self.cancel_countdown(&mut state);
        state.exercises = exercises.into_iter().map(ExerciseProgress::new).collect();
        state.status = SessionStatus::NotStarted;
        state.current_exercise_index = 0;

        tracing::debug!(plan_id = %plan.id, exercises = state.exercises.len(), "session loaded");
        self.emit(Event::SessionLoaded {
            plan_id: plan.id.clone(),
            exercise_count: state.exercises.len(),
            at: Utc::now(),
        });
        state.plan = Some(plan);
        Ok(state.view())
    }

    /// Begin the session at the first exercise. Returns false when it is
    /// already running or paused.
    pub fn start(&self) -> Result<bool, SessionError> {
        let mut state = lock(&self.state);
        if state.exercises.is_empty() {
            return Err(SessionError::EmptyPlan);
        }
        match state.status {
            SessionStatus::NotStarted | SessionStatus::Finished => {
                state.status = SessionStatus::Running;
                state.current_exercise_index = 0;
                tracing::info!(exercises = state.exercises.len(), "training started");
                self.emit(Event::SessionStarted {
                    plan_id: state.plan.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
                    exercise_count: state.exercises.len(),
                    at: Utc::now(),
                });
                Ok(true)
            }
            SessionStatus::Running | SessionStatus::Paused => Ok(false),
        }
    }

    /// Continue a paused session where it left off.
    pub fn resume(&self) -> bool {
        let mut state = lock(&self.state);
        if state.status != SessionStatus::Paused {
            return false;
        }
        state.status = SessionStatus::Running;
        self.emit(Event::SessionResumed {
            exercise_index: state.current_exercise_index,
            at: Utc::now(),
        });
        true
    }

    /// Flip one set. Completing an exercise while running starts the rest
    /// countdown towards the next one, if either has a rest configured.
    ///
    /// Returns the new value of the set.
    pub fn toggle_set(&self, exercise_index: usize, set_index: usize) -> Result<bool, SessionError> {
        let mut state = lock(&self.state);
        let len = state.exercises.len();
        let progress = state
            .exercises
            .get_mut(exercise_index)
            .ok_or(SessionError::OutOfRange {
                collection: "exercises",
                index: exercise_index,
                len,
            })?;
        let toggle = progress.toggle(set_index)?;
        let exercise_completed = progress.is_completed();

        tracing::debug!(exercise_index, set_index, completed = toggle.completed, "set toggled");
        self.emit(Event::SetToggled {
            exercise_index,
            set_index,
            completed: toggle.completed,
            exercise_completed,
            at: Utc::now(),
        });

        let target = exercise_index + 1;
        if toggle.newly_completed && state.status == SessionStatus::Running && target < len {
            let rest = state.exercises[target]
                .exercise()
                .rest()
                .or_else(|| state.exercises[exercise_index].exercise().rest());
            if let Some(seconds) = rest {
                self.start_countdown(&mut state, target, seconds);
            }
        }
        Ok(toggle.completed)
    }

    /// Move to the next exercise. No-op on the last one.
    pub fn advance_exercise(&self) -> bool {
        let mut state = lock(&self.state);
        let from = state.current_exercise_index;
        if from + 1 >= state.exercises.len() {
            return false;
        }
        state.current_exercise_index = from + 1;
        self.emit(Event::ExerciseChanged {
            from,
            to: from + 1,
            at: Utc::now(),
        });
        true
    }

    /// Move to the previous exercise. No-op on the first one.
    pub fn retreat_exercise(&self) -> bool {
        let mut state = lock(&self.state);
        let from = state.current_exercise_index;
        if from == 0 || state.exercises.is_empty() {
            return false;
        }
        state.current_exercise_index = from - 1;
        self.emit(Event::ExerciseChanged {
            from,
            to: from - 1,
            at: Utc::now(),
        });
        true
    }

    /// Pause a running session, dropping any rest countdown.
    pub fn pause(&self) -> bool {
        let mut state = lock(&self.state);
        if state.status != SessionStatus::Running {
            return false;
        }
        self.cancel_countdown(&mut state);
        state.status = SessionStatus::Paused;
        self.emit(Event::SessionPaused {
            exercise_index: state.current_exercise_index,
            at: Utc::now(),
        });
        true
    }

    /// Finish the session after the user confirms. Progress is discarded and
    /// the controller returns to `NotStarted`. Returns whether it finished.
    pub fn finish(&self, presenter: &dyn ConfirmationPresenter) -> bool {
        // Ask without holding the lock; presenters may block on user input.
        if !presenter.confirm(&self.settings.finish_prompt) {
            tracing::debug!("finish declined");
            return false;
        }

        let mut state = lock(&self.state);
        self.cancel_countdown(&mut state);
        state.status = SessionStatus::Finished;

        let completed_exercises = state.exercises.iter().filter(|e| e.is_completed()).count();
        tracing::info!(completed_exercises, "training finished");
        self.emit(Event::SessionFinished {
            completed_exercises,
            total_exercises: state.exercises.len(),
            at: Utc::now(),
        });

        for progress in state.exercises.iter_mut() {
            progress.reset();
        }
        state.current_exercise_index = 0;
        state.status = SessionStatus::NotStarted;
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn cancel_countdown(&self, state: &mut SessionState) {
        let Some(live) = state.countdown.take() else {
            return;
        };
        if let Some(handle) = live.handle {
            self.timer.cancel(handle);
        }
        tracing::debug!(
            target_exercise = live.countdown.target_exercise_index,
            remaining = live.countdown.remaining_seconds,
            "rest cancelled"
        );
        self.emit(Event::RestCancelled {
            target_exercise_index: live.countdown.target_exercise_index,
            remaining_seconds: live.countdown.remaining_seconds,
            at: Utc::now(),
        });
    }

    fn start_countdown(&self, state: &mut SessionState, target: usize, seconds: u32) {
        self.cancel_countdown(state);
        state.epoch += 1;
        let epoch = state.epoch;

        let weak = Arc::downgrade(&self.state);
        let events = self.events.clone();
        let handle = self.timer.schedule(
            self.settings.rest_tick,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return TickFlow::Stop;
                };
                let mut guard = lock(&shared);
                tick_countdown(&mut guard, epoch, &events)
            }),
        );

        state.countdown = Some(LiveCountdown {
            countdown: RestCountdown::new(target, seconds),
            handle: Some(handle),
            epoch,
        });
        tracing::debug!(target_exercise = target, seconds, "rest started");
        self.emit(Event::RestStarted {
            target_exercise_index: target,
            seconds,
            at: Utc::now(),
        });
    }
}

fn tick_countdown(state: &mut SessionState, epoch: u64, events: &broadcast::Sender<Event>) -> TickFlow {
    let Some(live) = state.countdown.as_mut().filter(|live| live.epoch == epoch) else {
        return TickFlow::Stop;
    };

    if live.countdown.tick() {
        let target = live.countdown.target_exercise_index;
        state.countdown = None;
        tracing::info!(target_exercise = target, "rest over");
        let _ = events.send(Event::RestExpired {
            target_exercise_index: target,
            at: Utc::now(),
        });
        TickFlow::Stop
    } else {
        let _ = events.send(Event::RestTicked {
            target_exercise_index: live.countdown.target_exercise_index,
            remaining_seconds: live.countdown.remaining_seconds,
            at: Utc::now(),
        });
        TickFlow::Continue
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let handle = lock(&self.state)
            .countdown
            .take()
            .and_then(|live| live.handle);
        if let Some(handle) = handle {
            self.timer.cancel(handle);
        }
    }
}
