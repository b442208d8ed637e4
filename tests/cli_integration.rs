//! CLI integration tests for taskdag
//!
//! These tests drive the binary end to end: initialization, task creation,
//! dependency edits and the graph queries that read them back.

use predicates::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the taskdag binary
fn taskdag_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("taskdag"));
    cmd.env_remove("TASKDAG_LOG");
    cmd
}

/// Create a temporary directory and initialize a taskdag project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    taskdag_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

fn add_task(dir: &TempDir, id: &str, title: &str) {
    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "add", title, "--id", id])
        .assert()
        .success();
}

fn add_dep(dir: &TempDir, prerequisite: &str, dependent: &str) {
    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", prerequisite, dependent])
        .assert()
        .success();
}

/// Project with A -> B, A -> C, B -> D, C -> D
fn setup_diamond() -> TempDir {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");
    add_task(&dir, "C", "Write frontend");
    add_task(&dir, "D", "Ship");
    add_dep(&dir, "A", "B");
    add_dep(&dir, "A", "C");
    add_dep(&dir, "B", "D");
    add_dep(&dir, "C", "D");
    dir
}

fn json_stdout(cmd: &mut assert_cmd::Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    taskdag_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized taskdag project"));

    assert!(dir.path().join(".taskdag").is_dir());
    assert!(dir.path().join(".taskdag/config.toml").is_file());
    assert!(dir.path().join(".taskdag/.gitignore").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    taskdag_cmd().arg("init").arg(dir.path()).assert().success();
    taskdag_cmd().arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_not_in_project_error() {
    let dir = TempDir::new().unwrap();

    taskdag_cmd()
        .current_dir(dir.path())
        .arg("ready")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a taskdag project"));
}

// =============================================================================
// Task Tests
// =============================================================================

#[test]
fn test_task_add_generates_id() {
    let dir = setup_project();

    let value = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "task", "add", "Write docs"]),
    );

    let id = value["id"].as_str().unwrap();
    assert!(id.starts_with("t-"));
    assert_eq!(value["status"], "pending");

    let stored = fs::read_to_string(dir.path().join(".taskdag/tasks.jsonl")).unwrap();
    assert!(stored.contains(id));
}

#[test]
fn test_task_add_rejects_duplicate_id() {
    let dir = setup_project();
    add_task(&dir, "A", "First");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "Second", "--id", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_task_list_shows_tasks() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Design schema"))
        .stdout(predicate::str::contains("Write backend"));
}

#[test]
fn test_task_status_rejects_unknown_status() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "A", "finished-ish"])
        .assert()
        .failure();
}

// =============================================================================
// Dependency Tests
// =============================================================================

#[test]
fn test_dep_add_persists_edge() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "A", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B now waits for A"));

    let stored = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();
    assert_eq!(stored.lines().count(), 1);
}

#[test]
fn test_dep_add_rejects_cycle() {
    let dir = setup_diamond();
    let before = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "D", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A cannot wait for D"));

    let after = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_dep_add_rejects_self_loop() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "A", "A"])
        .assert()
        .failure();
}

#[test]
fn test_dep_add_rejects_unknown_task() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "add", "A", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_dep_add_duplicate_is_idempotent() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");
    add_dep(&dir, "A", "B");
    add_dep(&dir, "A", "B");

    let stored = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();
    assert_eq!(stored.lines().count(), 1);
}

#[test]
fn test_dep_rm_unblocks_dependent() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");
    add_dep(&dir, "A", "B");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "rm", "A", "B"])
        .assert()
        .success();

    let ready = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "ready"]),
    );
    assert_eq!(ready.as_array().unwrap().len(), 2);
}

#[test]
fn test_dep_rm_missing_edge_fails() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["dep", "rm", "A", "B"])
        .assert()
        .failure();
}

#[test]
fn test_dep_check_does_not_write() {
    let dir = setup_diamond();
    let before = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();

    let value = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "dep", "check", "D", "A"]),
    );
    assert_eq!(value["allowed"], false);

    let value = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "dep", "check", "A", "D"]),
    );
    assert_eq!(value["allowed"], true);

    let after = fs::read_to_string(dir.path().join(".taskdag/dependencies.jsonl")).unwrap();
    assert_eq!(before, after);
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_ready_and_completion_unlocks_dependents() {
    let dir = setup_diamond();

    let ready = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "ready"]),
    );
    let ids: Vec<_> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["A"]);

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "A", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 new tasks unlocked: B, C"));

    taskdag_cmd()
        .current_dir(dir.path())
        .arg("ready")
        .assert()
        .success()
        .stdout(predicate::str::contains("Write backend"))
        .stdout(predicate::str::contains("Write frontend"))
        .stdout(predicate::str::contains("Ship").not());
}

#[test]
fn test_blocked_lists_waiting_tasks() {
    let dir = setup_diamond();

    taskdag_cmd()
        .current_dir(dir.path())
        .arg("blocked")
        .assert()
        .success()
        .stdout(predicate::str::contains("waiting on B, C"));
}

#[test]
fn test_levels_groups_diamond() {
    let dir = setup_diamond();

    let value = json_stdout(
        taskdag_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "levels"]),
    );
    let buckets: Vec<BTreeSet<String>> = value["levels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|bucket| {
            bucket
                .as_array()
                .unwrap()
                .iter()
                .map(|id| id.as_str().unwrap().to_string())
                .collect()
        })
        .collect();

    let expected: Vec<BTreeSet<String>> = vec![
        ["A"].iter().map(|s| s.to_string()).collect(),
        ["B", "C"].iter().map(|s| s.to_string()).collect(),
        ["D"].iter().map(|s| s.to_string()).collect(),
    ];
    assert_eq!(buckets, expected);
}

#[test]
fn test_show_displays_neighbours() {
    let dir = setup_diamond();

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["show", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Write backend"))
        .stdout(predicate::str::contains("Level:    1"))
        .stdout(predicate::str::contains("Prerequisites:"))
        .stdout(predicate::str::contains("Dependents:"));
}

#[test]
fn test_verify_reports_ok() {
    let dir = setup_diamond();

    taskdag_cmd()
        .current_dir(dir.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 tasks, 4 dependencies"));
}

#[test]
fn test_verify_detects_cycle_written_outside_the_cli() {
    let dir = setup_diamond();
    let path = dir.path().join(".taskdag/dependencies.jsonl");
    let mut stored = fs::read_to_string(&path).unwrap();
    stored.push_str("{\"workspace\":\"default\",\"prerequisite\":\"D\",\"dependent\":\"A\"}\n");
    fs::write(&path, stored).unwrap();

    taskdag_cmd()
        .current_dir(dir.path())
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn test_verbose_flag() {
    let dir = setup_project();

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["--verbose", "ready"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_repeated_completion_reports_no_new_unlocks() {
    let dir = setup_project();
    add_task(&dir, "A", "Design schema");
    add_task(&dir, "B", "Write backend");
    add_dep(&dir, "A", "B");

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "A", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new task unlocked: B"));

    taskdag_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "A", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlocked").not());
}
