use clap::Subcommand;
use physique_core::{Config, PlanStore};

use super::{open_store, CommandResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// List all training plans
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a plan and its exercises (defaults to the active plan)
    Show {
        /// Plan ID
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a plan the active one
    Activate {
        /// Plan ID
        id: String,
    },
}

pub fn run(action: PlanAction) -> CommandResult {
    let config = Config::load()?;
    let mut store = open_store(&config)?;

    match action {
        PlanAction::List { json } => {
            if json {
                let plans: Vec<_> = store.plans().collect();
                println!("{}", serde_json::to_string_pretty(&plans)?);
                return Ok(());
            }
            if store.entries().is_empty() {
                println!("no plans in {}", store.path().display());
                return Ok(());
            }
            for entry in store.entries() {
                let marker = if entry.plan.is_active { "*" } else { " " };
                println!(
                    "{marker} {:<16} {} ({} exercises)",
                    entry.plan.id,
                    entry.plan.name,
                    entry.exercises.len()
                );
            }
        }
        PlanAction::Show { id, json } => show(&store, id.as_deref(), json)?,
        PlanAction::Activate { id } => {
            store.set_active(&id)?;
            store.save()?;
            println!("active plan: {id}");
        }
    }
    Ok(())
}

fn show(store: &PlanStore, id: Option<&str>, json: bool) -> CommandResult {
    let entry = match id {
        Some(id) => store.plan(id).ok_or_else(|| format!("no plan with id '{id}'"))?,
        None => store.active().ok_or("no active plan")?,
    };
    let exercises = store.exercises(&entry.plan.id)?;

    if json {
        let value = serde_json::json!({
            "plan": entry.plan,
            "exercises": exercises,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} ({})", entry.plan.name, entry.plan.id);
    if let Some(description) = &entry.plan.description {
        println!("  {description}");
    }
    for (index, item) in exercises.iter().enumerate() {
        let weight = item.weight.map(|w| format!(" @ {w}kg")).unwrap_or_default();
        let rest = item.rest().map(|s| format!(", rest {s}s")).unwrap_or_default();
        println!(
            "  {}. {}: {}x{}{weight}{rest}",
            index + 1,
            item.exercise.name,
            item.sets,
            item.reps
        );
    }
    Ok(())
}
