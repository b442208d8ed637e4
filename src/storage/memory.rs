//! In-memory task and dependency store
//!
//! Implements both store traits behind one mutex. Used by tests and by
//! embedders that keep their own persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::store::{DependencyStore, StoreError, TaskStore};
use crate::domain::{DependencyEdge, TaskId, TaskNode, TaskRecord, TaskStatus, WorkspaceId};

#[derive(Debug, Default)]
struct Inner {
    tasks: BTreeMap<TaskId, TaskRecord>,
    edges: BTreeMap<WorkspaceId, BTreeSet<DependencyEdge>>,
}

/// Store holding tasks and edges in memory
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Simulates the store going offline or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful edge writes (inserts and deletes)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Adds or replaces a task
    pub fn put_task(&self, task: TaskRecord) -> Result<(), StoreError> {
        self.lock()?.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Changes the status of a stored task
    pub fn set_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))?;
        task.set_status(status);
        Ok(())
    }

    /// Stores an edge without any uniqueness or validity check
    ///
    /// Simulates rows written by something other than the engine.
    pub fn force_edge(
        &self,
        workspace: &WorkspaceId,
        edge: DependencyEdge,
    ) -> Result<(), StoreError> {
        self.lock()?
            .edges
            .entry(workspace.clone())
            .or_default()
            .insert(edge);
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    fn list_tasks(&self, workspace: &WorkspaceId) -> Result<Vec<TaskNode>, StoreError> {
        Ok(self
            .lock()?
            .tasks
            .values()
            .filter(|t| &t.workspace == workspace)
            .map(TaskRecord::node)
            .collect())
    }

    fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus, StoreError> {
        self.lock()?
            .tasks
            .get(task_id)
            .map(|t| t.status)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))
    }
}

impl DependencyStore for MemoryStore {
    fn list_edges(&self, workspace: &WorkspaceId) -> Result<Vec<DependencyEdge>, StoreError> {
        Ok(self
            .lock()?
            .edges
            .get(workspace)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn insert_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let inserted = inner
            .edges
            .entry(workspace.clone())
            .or_default()
            .insert(edge.clone());
        if !inserted {
            return Err(StoreError::Conflict(edge.clone()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let removed = inner
            .edges
            .get_mut(workspace)
            .map(|set| set.remove(edge))
            .unwrap_or(false);
        if !removed {
            return Err(StoreError::EdgeNotFound(edge.clone()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
