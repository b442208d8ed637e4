//! Read-only graph queries

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use super::output::Output;
use crate::domain::{readiness, TaskId, TaskRecord};
use crate::storage::Project;

fn titles(project: &Project) -> Result<BTreeMap<TaskId, TaskRecord>> {
    Ok(project.task_store().read_all()?)
}

fn title_of<'a>(tasks: &'a BTreeMap<TaskId, TaskRecord>, id: &TaskId) -> &'a str {
    tasks.get(id).map(|t| t.title.as_str()).unwrap_or("")
}

pub fn ready(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let coordinator = project.coordinator()?;
    let ready = coordinator.ready_tasks();
    let tasks = titles(&project)?;

    if output.is_json() {
        let items: Vec<_> = ready
            .iter()
            .map(|id| serde_json::json!({ "id": id, "title": title_of(&tasks, id) }))
            .collect();
        output.data(&items);
    } else if ready.is_empty() {
        println!("No tasks ready.");
    } else {
        for id in &ready {
            println!("{:<14} {}", id, title_of(&tasks, id));
        }
    }

    Ok(())
}

pub fn blocked(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let coordinator = project.coordinator()?;
    let blocked = coordinator.blocked_tasks();
    let tasks = titles(&project)?;

    if output.is_json() {
        let items: Vec<_> = blocked
            .iter()
            .map(|(id, blockers)| {
                serde_json::json!({
                    "id": id,
                    "title": title_of(&tasks, id),
                    "waiting_on": blockers,
                })
            })
            .collect();
        output.data(&items);
    } else if blocked.is_empty() {
        println!("No blocked tasks.");
    } else {
        for (id, blockers) in &blocked {
            let ids: Vec<_> = blockers.iter().map(TaskId::as_str).collect();
            println!(
                "{:<14} {} (waiting on {})",
                id,
                title_of(&tasks, id),
                ids.join(", ")
            );
        }
    }

    Ok(())
}

pub fn levels(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let coordinator = project.coordinator()?;
    let partition = coordinator.level_partition()?;
    let tasks = titles(&project)?;

    if output.is_json() {
        output.data(&partition);
    } else if partition.is_empty() {
        println!("No tasks found.");
    } else {
        for (level, bucket) in partition.iter() {
            println!("Level {}:", level);
            for id in bucket {
                println!("  {:<14} {}", id, title_of(&tasks, id));
            }
        }
    }

    Ok(())
}

pub fn show(output: &Output, id_str: &str) -> Result<()> {
    let project = Project::open_current()?;
    let task_id: TaskId = id_str.parse()?;
    let task = project.task_store().get(&task_id)?;

    let coordinator = project.coordinator()?;
    let prerequisites = coordinator.prerequisites(&task_id)?;
    let dependents = coordinator.dependents(&task_id)?;
    let snapshot = coordinator.snapshot();
    let level = snapshot.levels()?.level_of(&task_id);
    let blockers = readiness::blockers_of(snapshot.graph(), &task_id);
    let ready = readiness::is_ready(snapshot.graph(), &task_id);

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "level": level,
            "ready": ready,
            "prerequisites": prerequisites,
            "dependents": dependents,
            "waiting_on": blockers,
        }));
        return Ok(());
    }

    let tasks = titles(&project)?;
    println!("{} {}", task.status.marker(), task.title);
    println!("ID:       {}", task.id);
    println!("Status:   {}", task.status);
    println!("Priority: {}", task.priority);
    if let Some(level) = level {
        println!("Level:    {}", level);
    }
    if ready {
        println!("Ready to start");
    } else if !blockers.is_empty() {
        let ids: Vec<_> = blockers.iter().map(TaskId::as_str).collect();
        println!("Waiting on: {}", ids.join(", "));
    }

    if !prerequisites.is_empty() {
        println!("\nPrerequisites:");
        for id in &prerequisites {
            println!("  {:<14} {}", id, title_of(&tasks, id));
        }
    }
    if !dependents.is_empty() {
        println!("\nDependents:");
        for id in &dependents {
            println!("  {:<14} {}", id, title_of(&tasks, id));
        }
    }

    Ok(())
}

pub fn verify(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let coordinator = project.coordinator()?;

    // Opening already rebuilt and ran level assignment; check the rest
    let graph = coordinator.rebuild_from_store()?;
    if !graph.check_consistency() {
        bail!("Graph adjacency is inconsistent");
    }
    let order = graph.topological_order()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "ok": true,
            "tasks": graph.node_count(),
            "edges": graph.edge_count(),
            "order": order,
        }));
    } else {
        output.success(&format!(
            "Graph OK: {} tasks, {} dependencies, no cycles",
            graph.node_count(),
            graph.edge_count()
        ));
    }

    Ok(())
}
