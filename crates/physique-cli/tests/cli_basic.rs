//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway config directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const PLANS: &str = r#"
[[plans]]
id = "push"
name = "Push day"
is_active = true

[[plans.exercises]]
id = "push-1"
sets = 3
reps = 8
rest_seconds = 90
order = 0
exercise = { id = "bench", name = "Bench Press" }

[[plans.exercises]]
id = "push-2"
sets = 2
reps = 12
order = 1
exercise = { id = "dips", name = "Dips" }

[[plans]]
id = "pull"
name = "Pull day"
"#;

fn command(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_physique"));
    cmd.env("PHYSIQUE_CONFIG_DIR", dir).env_remove("PHYSIQUE_LOG");
    cmd
}

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = command(dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn with_plans() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("plans.toml"), PLANS).unwrap();
    dir
}

#[test]
fn test_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "reminders.interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "reminders.interval_secs", "10"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "reminders.interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["reminders"]["interval_secs"], 10);
}

#[test]
fn test_config_set_plans_file() {
    let dir = tempfile::tempdir().unwrap();
    let plans_dir = with_plans();
    let plans_path = plans_dir.path().join("plans.toml");
    let plans_path = plans_path.to_str().unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "plans_file", plans_path]);
    assert_eq!(code, 0, "{stderr}");
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "plans_file"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), plans_path);

    let (code, stdout, _) = run_cli(dir.path(), &["plan", "list", "--json"]);
    assert_eq!(code, 0);
    let plans: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(plans.as_array().unwrap().len(), 2);
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "reminders.volume", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_plan_list_json() {
    let dir = with_plans();
    let (code, stdout, _) = run_cli(dir.path(), &["plan", "list", "--json"]);
    assert_eq!(code, 0);
    let plans: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<_> = plans
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["push", "pull"]);
}

#[test]
fn test_plan_list_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["plan", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no plans"));
}

#[test]
fn test_plan_activate() {
    let dir = with_plans();
    let (code, _, _) = run_cli(dir.path(), &["plan", "activate", "pull"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["plan", "show", "--json"]);
    assert_eq!(code, 0);
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["plan"]["id"], "pull");

    let (code, _, _) = run_cli(dir.path(), &["plan", "activate", "legs"]);
    assert_eq!(code, 1);
}

#[test]
fn test_plan_show_orders_exercises() {
    let dir = with_plans();
    let (code, stdout, _) = run_cli(dir.path(), &["plan", "show", "push"]);
    assert_eq!(code, 0);
    let bench = stdout.find("Bench Press").unwrap();
    let dips = stdout.find("Dips").unwrap();
    assert!(bench < dips);
    assert!(stdout.contains("3x8, rest 90s"));
}

#[test]
fn test_reminders_status_json() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["reminders", "status", "--json"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["enabled"], true);
    assert_eq!(status["interval_secs"], 5);
    assert_eq!(status["notification"]["id"], 1);
}

#[test]
fn test_train_session_from_stdin() {
    let dir = with_plans();
    let mut child = command(dir.path())
        .args(["train", "--no-reminders"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"toggle 1 1\nstatus\nfinish\ny\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("Push day"));
    assert!(stdout.contains("[x..] 1/3"));
    assert!(stdout.contains("> training finished: 0/2 exercises"));
}

#[test]
fn test_train_without_active_plan_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["train", "--no-reminders"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no active training plan"));
}
