//! Ready-task evaluation
//!
//! A task is ready when its own status allows starting (`pending` or
//! `blocked`) and every prerequisite is `completed`. Cancelled prerequisites
//! do not count as satisfied.

use std::collections::{BTreeMap, BTreeSet};

use super::graph::Graph;
use super::id::TaskId;

fn is_satisfied(graph: &Graph, prerequisite: &TaskId) -> bool {
    graph
        .status(prerequisite)
        .map(|s| s.is_complete())
        .unwrap_or(false)
}

/// Returns true if the task can be started right now
pub fn is_ready(graph: &Graph, task_id: &TaskId) -> bool {
    let Some(node) = graph.node(task_id) else {
        return false;
    };

    node.status.is_startable()
        && graph
            .prerequisites_of(task_id)
            .iter()
            .all(|p| is_satisfied(graph, p))
}

/// Returns every ready task
pub fn ready_tasks(graph: &Graph) -> BTreeSet<TaskId> {
    graph
        .task_ids()
        .filter(|id| is_ready(graph, id))
        .cloned()
        .collect()
}

/// Returns the prerequisites of a task that are not yet completed
pub fn blockers_of(graph: &Graph, task_id: &TaskId) -> Vec<TaskId> {
    graph
        .prerequisites_of(task_id)
        .iter()
        .filter(|p| !is_satisfied(graph, p))
        .cloned()
        .collect()
}

/// Returns startable tasks held back by prerequisites, with what blocks them
pub fn blocked_tasks(graph: &Graph) -> BTreeMap<TaskId, Vec<TaskId>> {
    graph
        .nodes()
        .filter(|node| node.status.is_startable())
        .filter_map(|node| {
            let blockers = blockers_of(graph, &node.id);
            if blockers.is_empty() {
                None
            } else {
                Some((node.id.clone(), blockers))
            }
        })
        .collect()
}

/// Returns the direct dependents that became ready because `completed` finished
///
/// Only looks at the neighbourhood of `completed`, so it is cheap to call
/// after every status change. Returns nothing if `completed` is not actually
/// in the `completed` state.
pub fn dependents_unlocked_by(graph: &Graph, completed: &TaskId) -> BTreeSet<TaskId> {
    if !is_satisfied(graph, completed) {
        return BTreeSet::new();
    }

    graph
        .dependents_of(completed)
        .iter()
        .filter(|d| is_ready(graph, d))
        .cloned()
        .collect()
}
