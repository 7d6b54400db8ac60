//! TOML-backed training plan store.
//!
//! ```toml
//! [[plans]]
//! id = "push"
//! name = "Push day"
//! is_active = true
//!
//! [[plans.exercises]]
//! id = "push-1"
//! sets = 3
//! reps = 8
//! rest_seconds = 90
//! order = 0
//! exercise = { id = "bench", name = "Bench Press" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PlanStoreError, SessionError};
use crate::models::{PlanExercise, TrainingPlan};
use crate::session::PlanProvider;

/// A plan together with its prescribed exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    #[serde(flatten)]
    pub plan: TrainingPlan,
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlanFile {
    #[serde(default)]
    plans: Vec<PlanEntry>,
}

/// Plans loaded from a single TOML file.
#[derive(Debug)]
pub struct PlanStore {
    path: PathBuf,
    entries: Vec<PlanEntry>,
}

impl PlanStore {
    /// Read `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PlanStoreError> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "plan file missing, starting empty");
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(PlanStoreError::Io { path, source }),
        };

        let file: PlanFile = toml::from_str(&content).map_err(|e| PlanStoreError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let mut store = Self {
            path,
            entries: file.plans,
        };
        store.normalize();
        debug!(plans = store.entries.len(), "plan store loaded");
        Ok(store)
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the store back to its file.
    pub fn save(&self) -> Result<(), PlanStoreError> {
        let file = PlanFile {
            plans: self.entries.clone(),
        };
        let content =
            toml::to_string_pretty(&file).map_err(|e| PlanStoreError::Serialize(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PlanStoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| PlanStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn plans(&self) -> impl Iterator<Item = &TrainingPlan> {
        self.entries.iter().map(|entry| &entry.plan)
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn plan(&self, id: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|entry| entry.plan.id == id)
    }

    pub fn active(&self) -> Option<&PlanEntry> {
        self.entries.iter().find(|entry| entry.plan.is_active)
    }

    /// Exercises of `plan_id` ordered by `order`.
    pub fn exercises(&self, plan_id: &str) -> Result<Vec<PlanExercise>, PlanStoreError> {
        let entry = self
            .plan(plan_id)
            .ok_or_else(|| PlanStoreError::UnknownPlan(plan_id.to_string()))?;
        let mut exercises = entry.exercises.clone();
        exercises.sort_by_key(|e| e.order);
        Ok(exercises)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Mark `id` active and every other plan inactive.
    pub fn set_active(&mut self, id: &str) -> Result<(), PlanStoreError> {
        if self.plan(id).is_none() {
            return Err(PlanStoreError::UnknownPlan(id.to_string()));
        }
        for entry in &mut self.entries {
            entry.plan.is_active = entry.plan.id == id;
        }
        info!(plan_id = id, "active plan changed");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn normalize(&mut self) {
        for entry in &mut self.entries {
            for exercise in &mut entry.exercises {
                if exercise.plan_id.is_empty() {
                    exercise.plan_id = entry.plan.id.clone();
                }
            }
        }
    }
}

impl PlanProvider for PlanStore {
    fn active_plan(&self) -> Result<Option<TrainingPlan>, SessionError> {
        Ok(self.active().map(|entry| entry.plan.clone()))
    }

    fn exercises_for_plan(&self, plan_id: &str) -> Result<Vec<PlanExercise>, SessionError> {
        Ok(self.exercises(plan_id)?)
    }
}
