use crate::error::SessionError;
use crate::models::{PlanExercise, TrainingPlan};

/// Source of plans and their exercises (remote store, TOML file, ...).
pub trait PlanProvider: Send + Sync {
    /// The plan currently marked active, if any.
    fn active_plan(&self) -> Result<Option<TrainingPlan>, SessionError>;

    /// Exercises of `plan_id`. Callers sort by `order`.
    fn exercises_for_plan(&self, plan_id: &str) -> Result<Vec<PlanExercise>, SessionError>;
}

/// Asks the user before destructive actions such as finishing a session.
pub trait ConfirmationPresenter {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmationPresenter for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Confirms everything. For non-interactive hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationPresenter for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}
