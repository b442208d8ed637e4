//! Store interfaces consumed by the graph engine
//!
//! The engine reads tasks through [`TaskStore`] and reads/writes edges through
//! [`DependencyStore`]. Implementations must reject a second insert of the
//! same `(prerequisite, dependent)` pair with [`StoreError::Conflict`].

use std::fs::File;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;

use crate::domain::{DependencyEdge, GraphError, TaskId, TaskNode, TaskStatus, WorkspaceId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Transient failure; the caller may retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness constraint on `(prerequisite, dependent)` hit
    #[error("Dependency already stored: {0}")]
    Conflict(DependencyEdge),

    #[error("Dependency not stored: {0}")]
    EdgeNotFound(DependencyEdge),

    #[error("Task not stored: {0}")]
    TaskNotFound(TaskId),

    /// Stored data could not be decoded
    #[error("Corrupt store data: {0}")]
    Corrupt(String),
}

impl From<StoreError> for GraphError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => GraphError::StoreUnavailable(msg),
            StoreError::Conflict(edge) => GraphError::DuplicateEdge(edge),
            StoreError::EdgeNotFound(edge) => GraphError::EdgeNotFound(edge),
            StoreError::TaskNotFound(id) => GraphError::UnknownNode(id),
            StoreError::Corrupt(msg) => GraphError::CorruptStore(msg),
        }
    }
}

/// Exclusive right to mutate one workspace's dependencies
///
/// Held by the coordinator across reload, validation and write. Dropping the
/// lease releases it.
#[derive(Debug)]
pub struct WriteLease {
    lock: Option<File>,
}

impl WriteLease {
    /// A lease that guards nothing, for stores serialized elsewhere
    pub fn none() -> Self {
        Self { lock: None }
    }

    /// A lease backed by an exclusive file lock that is already held
    pub fn file(file: File) -> Self {
        Self { lock: Some(file) }
    }

    pub fn is_file_backed(&self) -> bool {
        self.lock.is_some()
    }
}

impl Drop for WriteLease {
    fn drop(&mut self) {
        if let Some(file) = self.lock.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

/// Durable task records
pub trait TaskStore: Send + Sync {
    /// Lists every task in a workspace
    fn list_tasks(&self, workspace: &WorkspaceId) -> Result<Vec<TaskNode>, StoreError>;

    /// Reads the current status of one task
    fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus, StoreError>;
}

/// Durable dependency edges
pub trait DependencyStore: Send + Sync {
    fn list_edges(&self, workspace: &WorkspaceId) -> Result<Vec<DependencyEdge>, StoreError>;

    /// Inserts an edge; fails with `Conflict` if it already exists
    fn insert_edge(&self, workspace: &WorkspaceId, edge: &DependencyEdge)
        -> Result<(), StoreError>;

    /// Deletes an edge; fails with `EdgeNotFound` if it does not exist
    fn delete_edge(&self, workspace: &WorkspaceId, edge: &DependencyEdge)
        -> Result<(), StoreError>;

    /// Acquires the single-writer lease for a workspace
    fn lease(&self, _workspace: &WorkspaceId) -> Result<WriteLease, StoreError> {
        Ok(WriteLease::none())
    }
}

impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    fn list_tasks(&self, workspace: &WorkspaceId) -> Result<Vec<TaskNode>, StoreError> {
        (**self).list_tasks(workspace)
    }

    fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus, StoreError> {
        (**self).get_task_status(task_id)
    }
}

impl<S: DependencyStore + ?Sized> DependencyStore for Arc<S> {
    fn list_edges(&self, workspace: &WorkspaceId) -> Result<Vec<DependencyEdge>, StoreError> {
        (**self).list_edges(workspace)
    }

    fn insert_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        (**self).insert_edge(workspace, edge)
    }

    fn delete_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        (**self).delete_edge(workspace, edge)
    }

    fn lease(&self, workspace: &WorkspaceId) -> Result<WriteLease, StoreError> {
        (**self).lease(workspace)
    }
}
