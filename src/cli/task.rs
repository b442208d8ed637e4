//! Task CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Priority, TaskId, TaskRecord, TaskStatus};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskdag task add "Write migration"
    ///   taskdag task add "Deploy" --priority high --id deploy
    Add {
        /// Task title
        title: String,

        /// Priority (low, medium, high, urgent)
        #[arg(long, short, default_value = "medium")]
        priority: String,

        /// Explicit task ID (generated from the title if omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// List tasks in the workspace
    List,

    /// Set a task's status
    ///
    /// Completing a task reports which dependents it unlocked.
    Status {
        /// Task ID
        id: String,

        /// New status (pending, in_progress, completed, cancelled, blocked)
        status: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            priority,
            id,
        } => add_task(output, &title, &priority, id.as_deref()),
        TaskCommands::List => list_tasks(output),
        TaskCommands::Status { id, status } => set_status(output, &id, &status),
    }
}

fn add_task(output: &Output, title: &str, priority: &str, id: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();
    let priority: Priority = priority.parse()?;

    let mut task = match id {
        Some(id) => {
            let id: TaskId = id.parse()?;
            if store.read_all()?.contains_key(&id) {
                anyhow::bail!("Task already exists: {}", id);
            }
            TaskRecord::with_id(id, project.workspace().clone(), title)
        }
        None => TaskRecord::new(project.workspace().clone(), title),
    };
    task.priority = priority;

    store.append(&task)?;
    tracing::info!(task = %task.id, "task created");

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "title": task.title,
            "status": task.status,
            "priority": task.priority,
        }));
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let tasks = project.task_store().read_all()?;
    let coordinator = project.coordinator()?;
    let ready = coordinator.ready_tasks();

    let tasks: Vec<_> = tasks
        .values()
        .filter(|t| &t.workspace == project.workspace())
        .collect();

    if output.is_json() {
        let items: Vec<_> = tasks
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "status": t.status,
                    "priority": t.priority,
                    "ready": ready.contains(&t.id),
                })
            })
            .collect();
        output.data(&items);
    } else if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{:<4} {:<14} {:<8} TITLE", "", "ID", "PRIORITY");
        println!("{}", "-".repeat(60));
        for task in tasks {
            println!(
                "{:<4} {:<14} {:<8} {}",
                task.status.marker(),
                task.id,
                task.priority,
                task.title
            );
        }
    }

    Ok(())
}

fn set_status(output: &Output, id_str: &str, status_str: &str) -> Result<()> {
    let project = Project::open_current()?;
    let task_id: TaskId = id_str.parse()?;
    let status: TaskStatus = status_str.parse()?;

    let coordinator = project.coordinator()?;
    coordinator
        .task_store()
        .set_status(&task_id, status)
        .with_context(|| format!("Failed to update task {}", task_id))?;

    let unlocked = coordinator.refresh_status(&task_id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task_id,
            "status": status,
            "unlocked": unlocked,
        }));
    } else {
        output.success(&format!("{} is now {}", task_id, status));
        if !unlocked.is_empty() {
            let ids: Vec<_> = unlocked.iter().map(TaskId::as_str).collect();
            println!(
                "{} new task{} unlocked: {}",
                unlocked.len(),
                if unlocked.len() == 1 { "" } else { "s" },
                ids.join(", ")
            );
        }
    }

    Ok(())
}
