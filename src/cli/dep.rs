//! Dependency CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{levels, GraphError, TaskId};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum DepCommands {
    /// Make DEPENDENT wait for PREREQUISITE
    ///
    /// Rejected if it would create a cycle.
    ///
    /// Examples:
    ///   taskdag dep add t-a1b2c3d t-e4f5a6b
    Add {
        /// Task that must finish first
        prerequisite: String,

        /// Task that waits
        dependent: String,
    },

    /// Remove a dependency
    #[command(alias = "remove")]
    Rm {
        prerequisite: String,
        dependent: String,
    },

    /// Check whether a dependency could be added, without adding it
    Check {
        prerequisite: String,
        dependent: String,
    },
}

pub fn run(cmd: DepCommands, output: &Output) -> Result<()> {
    match cmd {
        DepCommands::Add {
            prerequisite,
            dependent,
        } => add(output, &prerequisite, &dependent),
        DepCommands::Rm {
            prerequisite,
            dependent,
        } => remove(output, &prerequisite, &dependent),
        DepCommands::Check {
            prerequisite,
            dependent,
        } => check(output, &prerequisite, &dependent),
    }
}

fn parse_pair(prerequisite: &str, dependent: &str) -> Result<(TaskId, TaskId)> {
    Ok((prerequisite.parse()?, dependent.parse()?))
}

/// Turns a rejection into a user-facing error
fn rejected(err: GraphError) -> anyhow::Error {
    if err.is_retryable() {
        anyhow::anyhow!("{} (try again)", err)
    } else {
        anyhow::anyhow!(err.describe())
    }
}

fn add(output: &Output, prerequisite: &str, dependent: &str) -> Result<()> {
    let project = Project::open_current()?;
    let (prerequisite, dependent) = parse_pair(prerequisite, dependent)?;
    let coordinator = project.coordinator()?;

    let graph = coordinator
        .add_dependency(&prerequisite, &dependent)
        .map_err(rejected)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "prerequisite": prerequisite,
            "dependent": dependent,
            "edges": graph.edge_count(),
        }));
    } else {
        output.success(&format!("{} now waits for {}", dependent, prerequisite));
    }

    Ok(())
}

fn remove(output: &Output, prerequisite: &str, dependent: &str) -> Result<()> {
    let project = Project::open_current()?;
    let (prerequisite, dependent) = parse_pair(prerequisite, dependent)?;
    let coordinator = project.coordinator()?;

    let graph = coordinator
        .remove_dependency(&prerequisite, &dependent)
        .map_err(rejected)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "prerequisite": prerequisite,
            "dependent": dependent,
            "edges": graph.edge_count(),
        }));
    } else {
        output.success(&format!(
            "{} no longer waits for {}",
            dependent, prerequisite
        ));
    }

    Ok(())
}

fn check(output: &Output, prerequisite: &str, dependent: &str) -> Result<()> {
    let project = Project::open_current()?;
    let (prerequisite, dependent) = parse_pair(prerequisite, dependent)?;
    let coordinator = project.coordinator()?;

    match coordinator.preview_add_dependency(&prerequisite, &dependent) {
        Ok(preview) => {
            let depth = levels::assign_levels(&preview)?.depth();
            if output.is_json() {
                output.data(&serde_json::json!({
                    "allowed": true,
                    "depth": depth,
                }));
            } else {
                println!(
                    "OK: {} can wait for {} (graph depth would be {})",
                    dependent, prerequisite, depth
                );
            }
            Ok(())
        }
        Err(err) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "allowed": false,
                    "reason": err.describe(),
                }));
                Ok(())
            } else {
                Err(rejected(err))
            }
        }
    }
}
