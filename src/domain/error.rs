//! Errors raised by the graph engine

use std::fmt;

use thiserror::Error;

use super::edge::DependencyEdge;
use super::id::TaskId;

/// Why an edge was rejected while loading a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidEdgeReason {
    SelfLoop,
    Duplicate,
    UnknownPrerequisite,
    UnknownDependent,
}

impl fmt::Display for InvalidEdgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidEdgeReason::SelfLoop => "task depends on itself",
            InvalidEdgeReason::Duplicate => "edge appears more than once",
            InvalidEdgeReason::UnknownPrerequisite => "prerequisite task does not exist",
            InvalidEdgeReason::UnknownDependent => "dependent task does not exist",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Self-dependency not allowed: {0}")]
    SelfLoop(TaskId),

    #[error("Task not found: {0}")]
    UnknownNode(TaskId),

    /// The edge already exists. Callers adding an edge treat this as success.
    #[error("Dependency already exists: {0}")]
    DuplicateEdge(DependencyEdge),

    /// With `exact`, `path` runs from the would-be dependent to the would-be
    /// prerequisite along existing edges; the new edge closes the loop.
    /// Without it, `path` lists every task left unprocessed by level
    /// assignment, a superset of the cycle members.
    #[error("Dependency cycle detected: {}", format_cycle(path, *exact))]
    CycleDetected { path: Vec<TaskId>, exact: bool },

    #[error("Dependency not found: {0}")]
    EdgeNotFound(DependencyEdge),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid edge {edge}: {reason}")]
    InvalidEdge {
        edge: DependencyEdge,
        reason: InvalidEdgeReason,
    },

    #[error("Task listed more than once: {0}")]
    DuplicateNode(TaskId),

    #[error("Store returned data that could not be decoded: {0}")]
    CorruptStore(String),
}

fn format_cycle(path: &[TaskId], exact: bool) -> String {
    let ids: Vec<&str> = path.iter().map(TaskId::as_str).collect();
    if exact {
        match path.first() {
            Some(first) => format!("{} -> {}", ids.join(" -> "), first),
            None => String::new(),
        }
    } else {
        format!("unresolved tasks {{{}}}", ids.join(", "))
    }
}

impl GraphError {
    /// Returns true if the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::StoreUnavailable(_))
    }

    /// Returns true if the desired state already holds
    pub fn is_idempotent_success(&self) -> bool {
        matches!(self, GraphError::DuplicateEdge(_))
    }

    /// Renders a sentence suitable for end users
    pub fn describe(&self) -> String {
        match self {
            GraphError::CycleDetected { path, exact: true } if path.len() >= 2 => {
                let dependent = &path[0];
                let prerequisite = &path[path.len() - 1];
                let via: Vec<&str> = path.iter().map(TaskId::as_str).collect();
                format!(
                    "{} cannot wait for {}: {} already depends on {} ({})",
                    dependent,
                    prerequisite,
                    prerequisite,
                    dependent,
                    via.join(" -> ")
                )
            }
            other => other.to_string(),
        }
    }
}
