//! Graph mutation coordinator
//!
//! The only path through which dependency edges are added or removed. Every
//! mutation runs as one serialized unit:
//!
//! 1. take the in-process writer lock and the store's [`WriteLease`]
//! 2. reload the graph from the stores (freshest committed state)
//! 3. validate against that graph
//! 4. write to the Dependency Store
//! 5. swap in the new snapshot
//!
//! If any step fails the published snapshot is left as it was. Readers grab
//! the current `Arc<Snapshot>` and never block writers.
//!
//! [`WriteLease`]: crate::storage::WriteLease

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::snapshot::Snapshot;
use super::LevelMode;
use crate::domain::{
    assign_levels, cycle, readiness, DependencyEdge, Graph, GraphError, LevelPartition, TaskId,
    WorkspaceId,
};
use crate::storage::{DependencyStore, StoreError, TaskStore};

/// Validates and commits dependency changes for one workspace
pub struct Coordinator<T, D> {
    tasks: T,
    deps: D,
    workspace: WorkspaceId,
    mode: LevelMode,
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl<T: TaskStore, D: DependencyStore> Coordinator<T, D> {
    /// Creates a coordinator holding an empty graph
    ///
    /// Call [`Coordinator::rebuild_from_store`] before use, or use
    /// [`Coordinator::open`].
    pub fn new(tasks: T, deps: D, workspace: WorkspaceId, mode: LevelMode) -> Self {
        Self {
            tasks,
            deps,
            workspace,
            mode,
            current: RwLock::new(Arc::new(Snapshot::new(Graph::empty()))),
            writer: Mutex::new(()),
        }
    }

    /// Creates a coordinator and loads the graph from the stores
    pub fn open(
        tasks: T,
        deps: D,
        workspace: WorkspaceId,
        mode: LevelMode,
    ) -> Result<Self, GraphError> {
        let coordinator = Self::new(tasks, deps, workspace, mode);
        coordinator.rebuild_from_store()?;
        Ok(coordinator)
    }

    pub fn workspace(&self) -> &WorkspaceId {
        &self.workspace
    }

    pub fn level_mode(&self) -> LevelMode {
        self.mode
    }

    pub fn task_store(&self) -> &T {
        &self.tasks
    }

    pub fn dependency_store(&self) -> &D {
        &self.deps
    }

    /// Returns the current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Graph> {
        if self.mode == LevelMode::Eager {
            // Result is cached on the snapshot; errors surface on read
            let _ = snapshot.levels();
        }
        let graph = snapshot.graph().clone();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        graph
    }

    /// Reads tasks and edges and builds a graph, without publishing it
    fn load_from_store(&self) -> Result<Graph, GraphError> {
        let tasks = self.tasks.list_tasks(&self.workspace)?;
        let edges = self.deps.list_edges(&self.workspace)?;
        debug!(
            workspace = %self.workspace,
            tasks = tasks.len(),
            edges = edges.len(),
            "loaded graph from store"
        );
        Graph::load(tasks, edges)
    }

    /// Fully reloads the graph from the stores
    ///
    /// Level assignment runs as a global acyclicity check; a cyclic edge set
    /// in the store is rejected and the previous snapshot kept.
    pub fn rebuild_from_store(&self) -> Result<Arc<Graph>, GraphError> {
        let _guard = self.lock_writer();
        self.rebuild_locked()
    }

    fn rebuild_locked(&self) -> Result<Arc<Graph>, GraphError> {
        let graph = self.load_from_store()?;
        let levels = assign_levels(&graph)?;
        info!(
            workspace = %self.workspace,
            tasks = graph.node_count(),
            edges = graph.edge_count(),
            depth = levels.depth(),
            "graph rebuilt"
        );
        Ok(self.publish(Snapshot::with_levels(graph, Ok(levels))))
    }

    /// Adds `prerequisite -> dependent`
    ///
    /// Re-validates against freshly loaded store state even if the caller
    /// checked earlier. Adding an edge that already exists succeeds without a
    /// write.
    pub fn add_dependency(
        &self,
        prerequisite: &TaskId,
        dependent: &TaskId,
    ) -> Result<Arc<Graph>, GraphError> {
        let _guard = self.lock_writer();
        let _lease = self.deps.lease(&self.workspace)?;
        let fresh = self.load_from_store()?;

        match cycle::validate_insert(&fresh, prerequisite, dependent) {
            Ok(()) => {}
            Err(err) if err.is_idempotent_success() => {
                debug!(%prerequisite, %dependent, "dependency already present");
                return Ok(self.publish(Snapshot::new(fresh)));
            }
            Err(err) => {
                warn!(%prerequisite, %dependent, error = %err, "dependency rejected");
                return Err(err);
            }
        }

        let edge = DependencyEdge::new(prerequisite.clone(), dependent.clone());
        match self.deps.insert_edge(&self.workspace, &edge) {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // Written by someone outside the lease; pick it up
                warn!(%edge, "store already held dependency, rebuilding");
                return self.rebuild_locked();
            }
            Err(err) => {
                warn!(%edge, error = %err, "dependency write failed");
                return Err(err.into());
            }
        }

        let next = fresh.with_edge(&edge)?;
        info!(workspace = %self.workspace, %edge, "dependency added");
        Ok(self.publish(Snapshot::new(next)))
    }

    /// Removes `prerequisite -> dependent`
    pub fn remove_dependency(
        &self,
        prerequisite: &TaskId,
        dependent: &TaskId,
    ) -> Result<Arc<Graph>, GraphError> {
        let _guard = self.lock_writer();
        let _lease = self.deps.lease(&self.workspace)?;
        let fresh = self.load_from_store()?;

        let edge = DependencyEdge::new(prerequisite.clone(), dependent.clone());
        let next = fresh.without_edge(&edge)?;

        if let Err(err) = self.deps.delete_edge(&self.workspace, &edge) {
            warn!(%edge, error = %err, "dependency delete failed");
            return Err(err.into());
        }

        info!(workspace = %self.workspace, %edge, "dependency removed");
        Ok(self.publish(Snapshot::new(next)))
    }

    /// Re-reads one task's status and returns the dependents it unlocked
    ///
    /// Only a transition into `completed` unlocks anything; refreshing a task
    /// that was already completed returns an empty set. Graph structure is
    /// unchanged, so already computed levels carry over.
    pub fn refresh_status(&self, task_id: &TaskId) -> Result<BTreeSet<TaskId>, GraphError> {
        let _guard = self.lock_writer();
        let status = self.tasks.get_task_status(task_id)?;

        let current = self.snapshot();
        let was_complete = current
            .graph()
            .status(task_id)
            .is_some_and(|s| s.is_complete());
        let next = current.graph().with_status(task_id, status)?;
        let unlocked = if was_complete {
            BTreeSet::new()
        } else {
            readiness::dependents_unlocked_by(&next, task_id)
        };

        let snapshot = match current.cached_levels() {
            Some(levels) => Snapshot::with_levels(next, levels.clone()),
            None => Snapshot::new(next),
        };
        self.publish(snapshot);

        debug!(%task_id, %status, unlocked = unlocked.len(), "status refreshed");
        Ok(unlocked)
    }

    /// Applies an insert to a scratch copy of the current graph
    ///
    /// Neither the store nor the published snapshot changes. Use for
    /// optimistic feedback; the change is durable only once
    /// [`Coordinator::add_dependency`] succeeds.
    pub fn preview_add_dependency(
        &self,
        prerequisite: &TaskId,
        dependent: &TaskId,
    ) -> Result<Graph, GraphError> {
        let snapshot = self.snapshot();
        let graph = snapshot.graph();

        match cycle::validate_insert(graph, prerequisite, dependent) {
            Ok(()) => {
                graph.with_edge(&DependencyEdge::new(prerequisite.clone(), dependent.clone()))
            }
            Err(err) if err.is_idempotent_success() => Ok(Graph::clone(graph)),
            Err(err) => Err(err),
        }
    }

    /// Applies a removal to a scratch copy of the current graph
    pub fn preview_remove_dependency(
        &self,
        prerequisite: &TaskId,
        dependent: &TaskId,
    ) -> Result<Graph, GraphError> {
        self.snapshot()
            .graph()
            .without_edge(&DependencyEdge::new(prerequisite.clone(), dependent.clone()))
    }

    /// Returns the topological levels of the current graph
    pub fn level_partition(&self) -> Result<LevelPartition, GraphError> {
        self.snapshot().levels().cloned()
    }

    /// Returns the tasks that can be started now
    pub fn ready_tasks(&self) -> BTreeSet<TaskId> {
        self.snapshot().ready_tasks()
    }

    /// Returns startable tasks waiting on prerequisites
    pub fn blocked_tasks(&self) -> BTreeMap<TaskId, Vec<TaskId>> {
        self.snapshot().blocked_tasks()
    }

    /// Returns the direct prerequisites of a task
    pub fn prerequisites(&self, task_id: &TaskId) -> Result<BTreeSet<TaskId>, GraphError> {
        let snapshot = self.snapshot();
        let graph = snapshot.graph();
        if !graph.contains(task_id) {
            return Err(GraphError::UnknownNode(task_id.clone()));
        }
        Ok(graph.prerequisites_of(task_id).clone())
    }

    /// Returns the direct dependents of a task
    pub fn dependents(&self, task_id: &TaskId) -> Result<BTreeSet<TaskId>, GraphError> {
        let snapshot = self.snapshot();
        let graph = snapshot.graph();
        if !graph.contains(task_id) {
            return Err(GraphError::UnknownNode(task_id.clone()));
        }
        Ok(graph.dependents_of(task_id).clone())
    }
}
