use std::sync::Arc;

use clap::Subcommand;
use physique_core::reminder::UnsupportedSurface;
use physique_core::timer::ManualTimer;
use physique_core::{
    Config, Notification, NotificationSurface, Permission, ReminderError, ReminderScheduler,
};

use super::CommandResult;

#[derive(Subcommand)]
pub enum RemindersAction {
    /// Show whether reminders can be delivered and how often
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Prints reminders to stderr. Permission follows `reminders.enabled`.
pub struct ConsoleSurface {
    enabled: bool,
}

impl ConsoleSurface {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

impl NotificationSurface for ConsoleSurface {
    fn check_permission(&self) -> Result<Permission, ReminderError> {
        Ok(self.permission())
    }

    fn request_permission(&self) -> Result<Permission, ReminderError> {
        Ok(self.permission())
    }

    fn deliver(&self, notification: &Notification) -> Result<(), ReminderError> {
        let bell = if notification.sound.is_some() { "\x07" } else { "" };
        if notification.body.is_empty() {
            eprintln!("{bell}[reminder] {}", notification.title);
        } else {
            eprintln!("{bell}[reminder] {}: {}", notification.title, notification.body);
        }
        Ok(())
    }
}

/// Surface for a `train` run.
pub fn surface_for(config: &Config, disabled: bool) -> Arc<dyn NotificationSurface> {
    if disabled {
        Arc::new(UnsupportedSurface)
    } else {
        Arc::new(ConsoleSurface::new(config.reminders.enabled))
    }
}

pub fn run(action: RemindersAction) -> CommandResult {
    let config = Config::load()?;

    match action {
        RemindersAction::Status { json } => {
            let scheduler = ReminderScheduler::new(
                Arc::new(ManualTimer::new()),
                surface_for(&config, false),
                config.reminder_settings(),
            );
            let settings = scheduler.settings();
            let enabled = scheduler.is_enabled();

            if json {
                let value = serde_json::json!({
                    "enabled": enabled,
                    "interval_secs": settings.interval.as_secs(),
                    "notification": settings.notification(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("enabled:  {enabled}");
                println!("interval: {}s", settings.interval.as_secs());
                println!("title:    {}", settings.title);
            }
        }
    }
    Ok(())
}
