//! taskdag - a local-first task dependency graph engine
//!
//! Tasks wait on prerequisites. taskdag keeps the prerequisite relation a
//! DAG, lays tasks out in topological levels, and tells you which tasks are
//! ready to start.

pub mod domain;
pub mod engine;
pub mod storage;
pub mod logging;
pub mod cli;

pub use domain::{DependencyEdge, Graph, GraphError, LevelPartition, TaskId, TaskNode, TaskStatus};
pub use engine::{Coordinator, LevelMode};
