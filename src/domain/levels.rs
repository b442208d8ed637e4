//! Topological level assignment
//!
//! `level(n) = 0` for tasks without prerequisites, otherwise one more than the
//! deepest prerequisite. Computed with Kahn's algorithm: a task is only
//! dequeued once every prerequisite has been finalized, so its level is
//! already the maximum over all incoming paths. Tasks that never reach
//! in-degree zero sit on or behind a cycle.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

use super::error::GraphError;
use super::graph::Graph;
use super::id::TaskId;

/// Tasks bucketed by level
///
/// Every task appears in exactly one bucket. Order within a bucket carries no
/// meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelPartition {
    levels: Vec<Vec<TaskId>>,
    #[serde(skip)]
    index: BTreeMap<TaskId, usize>,
}

impl LevelPartition {
    /// Returns the level of a task
    pub fn level_of(&self, task_id: &TaskId) -> Option<usize> {
        self.index.get(task_id).copied()
    }

    /// Returns the tasks at a level
    pub fn bucket(&self, level: usize) -> &[TaskId] {
        self.levels.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates `(level, tasks)` from level 0 upward
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[TaskId])> {
        self.levels.iter().enumerate().map(|(i, b)| (i, b.as_slice()))
    }

    /// Number of levels (the longest chain length)
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Number of tasks covered
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Partitions all tasks into topological levels in O(V + E)
///
/// Fails with a non-exact `CycleDetected` listing the tasks left unprocessed.
pub fn assign_levels(graph: &Graph) -> Result<LevelPartition, GraphError> {
    let mut in_degree: BTreeMap<&TaskId, usize> = graph
        .task_ids()
        .map(|id| (id, graph.prerequisites_of(id).len()))
        .collect();
    let mut level: BTreeMap<&TaskId, usize> = BTreeMap::new();
    let mut queue: VecDeque<&TaskId> = VecDeque::new();

    for (&id, &degree) in &in_degree {
        if degree == 0 {
            level.insert(id, 0);
            queue.push_back(id);
        }
    }

    let mut partition = LevelPartition::default();

    while let Some(current) = queue.pop_front() {
        let current_level = level.get(current).copied().unwrap_or(0);

        if partition.levels.len() <= current_level {
            partition.levels.resize_with(current_level + 1, Vec::new);
        }
        partition.levels[current_level].push(current.clone());
        partition.index.insert(current.clone(), current_level);

        for dependent in graph.dependents_of(current) {
            let candidate = current_level + 1;
            let entry = level.entry(dependent).or_insert(candidate);
            if *entry < candidate {
                *entry = candidate;
            }

            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if partition.len() < graph.node_count() {
        let residual: Vec<TaskId> = graph
            .task_ids()
            .filter(|id| !partition.index.contains_key(*id))
            .cloned()
            .collect();
        tracing::warn!(
            unresolved = residual.len(),
            "level assignment stalled on a dependency cycle"
        );
        return Err(GraphError::CycleDetected {
            path: residual,
            exact: false,
        });
    }

    Ok(partition)
}
