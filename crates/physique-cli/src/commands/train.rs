//! Interactive training session on stdin.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use physique_core::lifecycle::forward_session_events;
use physique_core::session::SessionView;
use physique_core::{
    Config, Event, LifecycleCoordinator, LifecycleSignal, ReminderScheduler, RuntimeTimer,
    SessionController, Timer,
};
use tokio::sync::{broadcast, mpsc};

use super::reminders::surface_for;
use super::{open_store, CommandResult};

const PRINTER_DRAIN: Duration = Duration::from_secs(2);

const HELP: &str = "\
commands:
  toggle E S    flip set S of exercise E (1-based)
  next | prev   move between exercises
  pause         pause the session
  resume        resume the session
  status        show progress
  finish        finish the training
  route R       simulate navigating to route R
  background    simulate the app going to the background
  foreground    simulate the app coming back
  quit          leave without finishing";

#[derive(Args)]
pub struct TrainArgs {
    /// Do not send training reminders
    #[arg(long)]
    no_reminders: bool,
}

enum Command {
    Toggle(usize, usize),
    Next,
    Prev,
    Pause,
    Resume,
    Status,
    Finish,
    Signal(LifecycleSignal),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::Help);
    };
    let command = match head {
        "toggle" | "t" => {
            let mut index = |name: &str| -> Result<usize, String> {
                let raw = words.next().ok_or_else(|| format!("missing {name}"))?;
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(n - 1),
                    _ => Err(format!("invalid {name}: {raw}")),
                }
            };
            let exercise = index("exercise")?;
            let set = index("set")?;
            Command::Toggle(exercise, set)
        }
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "status" | "s" => Command::Status,
        "finish" => Command::Finish,
        "route" => {
            let route = words.next().ok_or("missing route")?;
            Command::Signal(LifecycleSignal::RouteChanged(route.to_string()))
        }
        "background" => Command::Signal(LifecycleSignal::Background),
        "foreground" => Command::Signal(LifecycleSignal::Foreground),
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(command)
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::SessionStarted { exercise_count, .. } => {
            format!("training started ({exercise_count} exercises)")
        }
        Event::SessionPaused { .. } => "training paused".to_string(),
        Event::SessionResumed { .. } => "training resumed".to_string(),
        Event::SetToggled {
            exercise_index,
            set_index,
            completed,
            exercise_completed,
            ..
        } => {
            let mark = if *completed { "done" } else { "open" };
            let suffix = if *exercise_completed { ", exercise complete" } else { "" };
            format!("exercise {} set {}: {mark}{suffix}", exercise_index + 1, set_index + 1)
        }
        Event::ExerciseChanged { to, .. } => format!("now on exercise {}", to + 1),
        Event::RestStarted {
            target_exercise_index,
            seconds,
            ..
        } => format!("rest {seconds}s before exercise {}", target_exercise_index + 1),
        Event::RestTicked {
            remaining_seconds, ..
        } if remaining_seconds % 10 == 0 => format!("rest: {remaining_seconds}s left"),
        Event::RestCancelled { .. } => "rest cancelled".to_string(),
        Event::RestExpired {
            target_exercise_index,
            ..
        } => format!("rest over, go for exercise {}", target_exercise_index + 1),
        Event::SessionFinished {
            completed_exercises,
            total_exercises,
            ..
        } => format!("training finished: {completed_exercises}/{total_exercises} exercises"),
        _ => return None,
    };
    Some(line)
}

async fn print_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = describe(&event) {
                    println!("> {line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_status(view: &SessionView) {
    let name = view.plan.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
    println!("{name} [{:?}]", view.status);
    for (index, progress) in view.exercises.iter().enumerate() {
        let cursor = if index == view.current_exercise_index { ">" } else { " " };
        let sets: String = progress
            .completed_sets()
            .iter()
            .map(|&done| if done { 'x' } else { '.' })
            .collect();
        println!(
            "{cursor} {}. {:<24} [{sets}] {}/{}",
            index + 1,
            progress.exercise().exercise.name,
            progress.completed_count(),
            progress.total_sets()
        );
    }
    if let Some(countdown) = &view.countdown {
        println!(
            "  resting: {}s of {}s",
            countdown.remaining_seconds, countdown.total_seconds
        );
    }
}

/// Ask on stdin; anything but y/yes declines.
fn confirm_on_stdin(message: &str) -> bool {
    print!("{message} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn run(args: TrainArgs) -> CommandResult {
    let config = Config::load()?;
    let store = Arc::new(open_store(&config)?);
    let runtime = tokio::runtime::Runtime::new()?;

    let timer: Arc<dyn Timer> = Arc::new(RuntimeTimer::new(runtime.handle().clone()));
    let controller =
        SessionController::with_settings(store, timer.clone(), config.session_settings());
    let scheduler = Arc::new(ReminderScheduler::new(
        timer,
        surface_for(&config, args.no_reminders),
        config.reminder_settings(),
    ));

    if !args.no_reminders {
        if let Err(err) = scheduler.initialize() {
            tracing::warn!(%err, "training reminders disabled");
        }
    }

    let (signals, signal_rx) = mpsc::unbounded_channel();
    let coordinator = LifecycleCoordinator::new(scheduler.clone(), config.session.screen_route.clone());
    let coordinator_task = runtime.spawn(coordinator.run(signal_rx));
    runtime.spawn(forward_session_events(controller.subscribe(), signals.clone()));
    let printer = runtime.spawn(print_events(controller.subscribe()));

    let view = controller.load_session()?;
    let _ = signals.send(LifecycleSignal::RouteChanged(config.session.screen_route.clone()));
    print_status(&view);
    controller.start()?;
    println!("type 'help' for commands");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Toggle(exercise, set) => {
                if let Err(err) = controller.toggle_set(exercise, set) {
                    eprintln!("{err}");
                }
            }
            Command::Next => {
                if !controller.advance_exercise() {
                    eprintln!("already at the last exercise");
                }
            }
            Command::Prev => {
                if !controller.retreat_exercise() {
                    eprintln!("already at the first exercise");
                }
            }
            Command::Pause => {
                controller.pause();
            }
            Command::Resume => {
                controller.resume();
            }
            Command::Status => print_status(&controller.view()),
            Command::Finish => {
                if controller.finish(&confirm_on_stdin) {
                    break;
                }
            }
            Command::Signal(signal) => {
                let _ = signals.send(signal);
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    let _ = signals.send(LifecycleSignal::Shutdown);
    drop(signals);
    runtime.block_on(coordinator_task)?;

    // Dropping the controller closes the event channel once its countdown is
    // cancelled; the printer then drains what is left and exits.
    drop(controller);
    runtime.block_on(async {
        if tokio::time::timeout(PRINTER_DRAIN, printer).await.is_err() {
            tracing::debug!("event printer did not finish in time");
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_based_toggle() {
        assert!(matches!(parse_command("toggle 2 3"), Ok(Command::Toggle(1, 2))));
        assert!(matches!(parse_command("t 1 1\n"), Ok(Command::Toggle(0, 0))));
        assert!(parse_command("toggle 0 1").is_err());
        assert!(parse_command("toggle 1").is_err());
    }

    #[test]
    fn parses_lifecycle_commands() {
        assert!(matches!(
            parse_command("route /profile"),
            Ok(Command::Signal(LifecycleSignal::RouteChanged(route))) if route == "/profile"
        ));
        assert!(matches!(
            parse_command("background"),
            Ok(Command::Signal(LifecycleSignal::Background))
        ));
        assert!(matches!(parse_command("dance"), Err(_)));
        assert!(matches!(parse_command(""), Ok(Command::Help)));
    }

    #[test]
    fn quiet_rest_ticks_are_skipped() {
        let at = chrono::Utc::now();
        let tick = |remaining_seconds| Event::RestTicked {
            target_exercise_index: 1,
            remaining_seconds,
            at,
        };
        assert!(describe(&tick(7)).is_none());
        assert_eq!(describe(&tick(30)).as_deref(), Some("rest: 30s left"));
    }
}
