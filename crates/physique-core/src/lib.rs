//! # Physique Core Library
//!
//! Core logic of the Physique workout tracker: the live training session,
//! the rest countdown between exercises, and the periodic "get back to
//! training" reminder that runs while the app is in the background. The
//! `physique` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: cancellable periodic callbacks behind the [`Timer`] trait,
//!   with a tokio-backed [`RuntimeTimer`] and a virtual-clock [`ManualTimer`]
//! - **Session**: [`SessionController`] owning set progress, navigation and
//!   the rest countdown
//! - **Reminders**: [`ReminderScheduler`] delivering notifications through a
//!   [`NotificationSurface`]
//! - **Lifecycle**: [`LifecycleCoordinator`] pausing and resuming reminders
//!   from route, focus and session signals
//! - **Storage**: TOML configuration and the TOML plan store

pub mod error;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod reminder;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, PlanStoreError, ReminderError, SessionError};
pub use events::Event;
pub use lifecycle::{LifecycleCoordinator, LifecycleSignal, Reaction, SignalSource};
pub use models::{Exercise, PlanExercise, TrainingPlan};
pub use reminder::{
    Notification, NotificationSurface, Permission, ReminderScheduler, ReminderSettings, RunState,
};
pub use session::{
    ConfirmationPresenter, PlanProvider, RestCountdown, SessionController, SessionSettings,
    SessionStatus, SessionView,
};
pub use storage::{Config, PlanStore};
pub use timer::{ManualTimer, RuntimeTimer, TickFlow, Timer, TimerHandle};
