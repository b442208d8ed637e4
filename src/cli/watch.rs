//! Watch command
//!
//! Rebuilds the graph whenever the store files change and reports how the
//! ready set moved.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;

use super::output::Output;
use crate::domain::TaskId;
use crate::storage::Project;

pub fn run(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let data_dir = project.data_dir();
    let debounce_ms = project.config().project.watch.debounce_ms;

    let coordinator = project.coordinator()?;
    let mut ready = coordinator.ready_tasks();

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)?;
    debouncer
        .watcher()
        .watch(&data_dir, RecursiveMode::NonRecursive)?;

    tracing::info!(dir = %data_dir.display(), debounce_ms, "watching for changes");
    if !output.is_json() {
        println!(
            "Watching {} ({} ready). Press Ctrl-C to stop.",
            data_dir.display(),
            ready.len()
        );
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = events.iter().filter(|e| is_store_file(&e.path)).count();
                if changed == 0 {
                    continue;
                }
                tracing::debug!(changed, "store files changed");

                if let Err(err) = coordinator.rebuild_from_store() {
                    // Previous snapshot stays published
                    tracing::warn!(error = %err, "rebuild failed");
                    output.error(&err.describe());
                    continue;
                }

                let next = coordinator.ready_tasks();
                let (added, removed) = ready_changes(&ready, &next);
                if !added.is_empty() || !removed.is_empty() {
                    report(output, &added, &removed);
                }
                ready = next;
            }
            Ok(Err(error)) => {
                tracing::warn!(?error, "watch error");
            }
            Err(e) => {
                tracing::debug!(error = %e, "watch channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// Returns true for the files the graph is loaded from
fn is_store_file(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("tasks.jsonl") | Some("dependencies.jsonl")
    )
}

/// Returns `(became_ready, no_longer_ready)`
fn ready_changes(
    before: &BTreeSet<TaskId>,
    after: &BTreeSet<TaskId>,
) -> (Vec<TaskId>, Vec<TaskId>) {
    (
        after.difference(before).cloned().collect(),
        before.difference(after).cloned().collect(),
    )
}

fn report(output: &Output, added: &[TaskId], removed: &[TaskId]) {
    if output.is_json() {
        output.data(&serde_json::json!({
            "ready": added,
            "not_ready": removed,
        }));
        return;
    }
    for id in added {
        println!("+ {} is ready", id);
    }
    for id in removed {
        println!("- {} is no longer ready", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> BTreeSet<TaskId> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    #[test]
    fn only_store_files_trigger_rebuilds() {
        assert!(is_store_file(Path::new(".taskdag/tasks.jsonl")));
        assert!(is_store_file(Path::new(".taskdag/dependencies.jsonl")));

        assert!(!is_store_file(Path::new(".taskdag/tasks.jsonl.lock")));
        assert!(!is_store_file(Path::new(".taskdag/dependencies.jsonl.tmp")));
        assert!(!is_store_file(Path::new(".taskdag/config.toml")));
        assert!(!is_store_file(Path::new(".taskdag/.gitignore")));
    }

    #[test]
    fn ready_changes_split_both_ways() {
        let (added, removed) = ready_changes(&ids(&["A", "B"]), &ids(&["B", "C", "D"]));
        assert_eq!(added, ids(&["C", "D"]).into_iter().collect::<Vec<_>>());
        assert_eq!(removed, ids(&["A"]).into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn no_changes_when_sets_match() {
        let (added, removed) = ready_changes(&ids(&["A"]), &ids(&["A"]));
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }
}
