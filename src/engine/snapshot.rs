//! Immutable graph snapshots with a per-snapshot level cache

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use crate::domain::{assign_levels, readiness, Graph, GraphError, LevelPartition, TaskId};

/// A graph as of one committed state
///
/// Snapshots are never mutated; the coordinator swaps in a new one after each
/// commit. Levels are computed at most once per snapshot.
#[derive(Debug)]
pub struct Snapshot {
    graph: Arc<Graph>,
    levels: OnceLock<Result<LevelPartition, GraphError>>,
}

impl Snapshot {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
            levels: OnceLock::new(),
        }
    }

    /// Creates a snapshot whose levels are already known
    pub fn with_levels(graph: Graph, levels: Result<LevelPartition, GraphError>) -> Self {
        let snapshot = Self::new(graph);
        let _ = snapshot.levels.set(levels);
        snapshot
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Returns the level partition, computing it on first use
    pub fn levels(&self) -> Result<&LevelPartition, GraphError> {
        self.levels
            .get_or_init(|| assign_levels(&self.graph))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns true once levels have been computed for this snapshot
    pub fn levels_computed(&self) -> bool {
        self.levels.get().is_some()
    }

    /// Returns the computed levels without triggering computation
    pub(crate) fn cached_levels(&self) -> Option<&Result<LevelPartition, GraphError>> {
        self.levels.get()
    }

    pub fn ready_tasks(&self) -> BTreeSet<TaskId> {
        readiness::ready_tasks(&self.graph)
    }

    pub fn blocked_tasks(&self) -> BTreeMap<TaskId, Vec<TaskId>> {
        readiness::blocked_tasks(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::tests::diamond;

    #[test]
    fn levels_are_computed_lazily_once() {
        let snapshot = Snapshot::new(diamond());
        assert!(!snapshot.levels_computed());

        let first = snapshot.levels().unwrap().clone();
        assert!(snapshot.levels_computed());
        assert_eq!(snapshot.levels().unwrap(), &first);
    }

    #[test]
    fn preseeded_levels_are_used() {
        let graph = diamond();
        let levels = assign_levels(&graph);
        let snapshot = Snapshot::with_levels(graph, levels);

        assert!(snapshot.levels_computed());
        assert_eq!(snapshot.levels().unwrap().depth(), 3);
    }
}
