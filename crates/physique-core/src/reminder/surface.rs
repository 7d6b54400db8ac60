use serde::{Deserialize, Serialize};

use crate::error::ReminderError;

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// One platform notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Platform id; reusing it replaces the previous notification.
    pub id: i32,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub sound: Option<String>,
}

/// Platform notification delivery.
///
/// Implementations must not call back into the reminder scheduler; it holds
/// its state lock while delivering.
pub trait NotificationSurface: Send + Sync {
    /// Whether this platform can show notifications at all.
    fn is_supported(&self) -> bool {
        true
    }

    fn check_permission(&self) -> Result<Permission, ReminderError>;

    /// Ask the user. Only `Granted` or `Denied` are meaningful answers.
    fn request_permission(&self) -> Result<Permission, ReminderError>;

    fn deliver(&self, notification: &Notification) -> Result<(), ReminderError>;
}

/// Surface for hosts without notification support (headless, browser).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSurface;

impl NotificationSurface for UnsupportedSurface {
    fn is_supported(&self) -> bool {
        false
    }

    fn check_permission(&self) -> Result<Permission, ReminderError> {
        Err(ReminderError::PlatformUnsupported)
    }

    fn request_permission(&self) -> Result<Permission, ReminderError> {
        Err(ReminderError::PlatformUnsupported)
    }

    fn deliver(&self, _notification: &Notification) -> Result<(), ReminderError> {
        Err(ReminderError::PlatformUnsupported)
    }
}
