pub mod config;
pub mod plan;
pub mod reminders;
pub mod train;

use physique_core::{Config, PlanStore};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Plan store named by the config.
pub fn open_store(config: &Config) -> Result<PlanStore, Box<dyn std::error::Error>> {
    Ok(PlanStore::load(config.plans_path()?)?)
}
