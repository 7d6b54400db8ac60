//! Core error types for physique-core.
//!
//! Every failure the core can produce is recoverable: hosts degrade the
//! feature (no session, silent reminders) instead of aborting.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for physique-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Training session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Reminder scheduler errors
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan store errors
    #[error("Plan store error: {0}")]
    PlanStore(#[from] PlanStoreError),
}

/// Errors raised by the session controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The plan provider has no plan marked active.
    #[error("no active training plan")]
    NoActivePlan,

    /// The loaded plan has no exercises (or nothing is loaded).
    #[error("training plan has no exercises")]
    EmptyPlan,

    /// A set or exercise index outside the loaded session.
    #[error("index {index} out of bounds for {collection} (length: {len})")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    /// The plan provider failed.
    #[error("plan provider failed: {0}")]
    Provider(String),
}

/// Errors raised by the reminder scheduler and notification surfaces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// The user denied (or never granted) notification permission.
    #[error("notification permission denied")]
    PermissionDenied,

    /// The host platform cannot deliver notifications.
    #[error("notifications are not supported on this platform")]
    PlatformUnsupported,

    /// A single reminder could not be delivered.
    #[error("failed to deliver reminder: {0}")]
    DeliveryFailure(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not name a config field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No usable data directory
    #[error("cannot create data directory {path}: {source}")]
    NoDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Plan store errors.
#[derive(Error, Debug)]
pub enum PlanStoreError {
    #[error("cannot access plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse plan file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize plans: {0}")]
    Serialize(String),

    #[error("no plan with id '{0}'")]
    UnknownPlan(String),
}

impl From<PlanStoreError> for SessionError {
    fn from(err: PlanStoreError) -> Self {
        SessionError::Provider(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
