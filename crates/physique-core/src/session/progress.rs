use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::models::{PlanExercise, TrainingPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Paused,
    /// Terminal; a finished session is immediately reset to `NotStarted`.
    Finished,
}

/// Outcome of flipping one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetToggle {
    /// New value of the set.
    pub completed: bool,
    /// The exercise went from incomplete to complete with this flip.
    pub newly_completed: bool,
}

/// Per-exercise progress inside a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProgress {
    exercise: PlanExercise,
    completed_sets: Vec<bool>,
    /// Derived from `completed_sets`; never assigned directly.
    is_completed: bool,
}

impl ExerciseProgress {
    pub fn new(exercise: PlanExercise) -> Self {
        let completed_sets = vec![false; exercise.sets as usize];
        let mut progress = Self {
            exercise,
            completed_sets,
            is_completed: false,
        };
        progress.recompute();
        progress
    }

    pub fn exercise(&self) -> &PlanExercise {
        &self.exercise
    }

    pub fn completed_sets(&self) -> &[bool] {
        &self.completed_sets
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn total_sets(&self) -> usize {
        self.completed_sets.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_sets.iter().filter(|&&done| done).count()
    }

    pub fn toggle(&mut self, set_index: usize) -> Result<SetToggle, SessionError> {
        let len = self.completed_sets.len();
        let set = self
            .completed_sets
            .get_mut(set_index)
            .ok_or(SessionError::OutOfRange {
                collection: "sets",
                index: set_index,
                len,
            })?;
        *set = !*set;
        let completed = *set;

        let was_completed = self.is_completed;
        self.recompute();
        Ok(SetToggle {
            completed,
            newly_completed: !was_completed && self.is_completed,
        })
    }

    /// Mark every set as not done.
    pub fn reset(&mut self) {
        self.completed_sets.fill(false);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.is_completed = self.completed_sets.iter().all(|&done| done);
    }
}

/// Rest between two exercises, counted down once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestCountdown {
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub target_exercise_index: usize,
}

impl RestCountdown {
    pub fn new(target_exercise_index: usize, seconds: u32) -> Self {
        Self {
            remaining_seconds: seconds,
            total_seconds: seconds,
            target_exercise_index,
        }
    }

    /// Decrement by one second. Returns true once the rest is over.
    pub fn tick(&mut self) -> bool {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds == 0
    }

    /// 0.0 .. 1.0 share of the rest already taken.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.total_seconds as f64)
    }
}

/// Read-only snapshot of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub plan: Option<TrainingPlan>,
    pub status: SessionStatus,
    pub current_exercise_index: usize,
    pub exercises: Vec<ExerciseProgress>,
    pub countdown: Option<RestCountdown>,
}

impl SessionView {
    pub fn current_exercise(&self) -> Option<&ExerciseProgress> {
        self.exercises.get(self.current_exercise_index)
    }

    pub fn completed_exercises(&self) -> usize {
        self.exercises.iter().filter(|e| e.is_completed()).count()
    }
}
