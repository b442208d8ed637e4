//! Domain models for the task dependency graph
//!
//! Contains the graph engine without any I/O concerns: the graph value
//! itself, the cycle guard, level assignment and readiness evaluation.

mod id;
mod task;
mod edge;
mod error;
pub(crate) mod graph;
pub mod cycle;
pub mod levels;
pub mod readiness;

pub use id::{IdError, TaskId, WorkspaceId};
pub use task::{Priority, TaskNode, TaskRecord, TaskStatus};
pub use edge::DependencyEdge;
pub use error::{GraphError, InvalidEdgeReason};
pub use graph::Graph;
pub use levels::{assign_levels, LevelPartition};
