use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every session state change produces an Event.
/// UIs subscribe to them to refresh; the lifecycle coordinator maps the
/// start/finish events onto reminder pause/resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionLoaded {
        plan_id: String,
        exercise_count: usize,
        at: DateTime<Utc>,
    },
    SessionStarted {
        plan_id: String,
        exercise_count: usize,
        at: DateTime<Utc>,
    },
    SessionPaused {
        exercise_index: usize,
        at: DateTime<Utc>,
    },
    SessionResumed {
        exercise_index: usize,
        at: DateTime<Utc>,
    },
    SetToggled {
        exercise_index: usize,
        set_index: usize,
        completed: bool,
        exercise_completed: bool,
        at: DateTime<Utc>,
    },
    ExerciseChanged {
        from: usize,
        to: usize,
        at: DateTime<Utc>,
    },
    RestStarted {
        target_exercise_index: usize,
        seconds: u32,
        at: DateTime<Utc>,
    },
    RestTicked {
        target_exercise_index: usize,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    /// Countdown dropped before reaching zero (pause, finish, reload or a
    /// newer countdown).
    RestCancelled {
        target_exercise_index: usize,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    /// Rest is over; the user should start the target exercise.
    RestExpired {
        target_exercise_index: usize,
        at: DateTime<Utc>,
    },
    SessionFinished {
        completed_exercises: usize,
        total_exercises: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine-readable name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionLoaded { .. } => "SessionLoaded",
            Event::SessionStarted { .. } => "SessionStarted",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::SetToggled { .. } => "SetToggled",
            Event::ExerciseChanged { .. } => "ExerciseChanged",
            Event::RestStarted { .. } => "RestStarted",
            Event::RestTicked { .. } => "RestTicked",
            Event::RestCancelled { .. } => "RestCancelled",
            Event::RestExpired { .. } => "RestExpired",
            Event::SessionFinished { .. } => "SessionFinished",
        }
    }
}
