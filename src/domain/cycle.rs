//! Cycle guard for new dependency edges
//!
//! Inserting `prerequisite -> dependent` closes a cycle exactly when the
//! prerequisite is already reachable from the dependent along forward edges.

use std::collections::{HashMap, HashSet};

use super::edge::DependencyEdge;
use super::error::GraphError;
use super::graph::Graph;
use super::id::TaskId;

/// Depth-first search from `from` over forward edges, stopping at `to`
///
/// Returns the path `from ..= to` reconstructed from parent pointers.
/// Each node is visited at most once, so the search is O(V + E).
fn find_path(graph: &Graph, from: &TaskId, to: &TaskId) -> Option<Vec<TaskId>> {
    let mut parent: HashMap<&TaskId, &TaskId> = HashMap::new();
    let mut visited: HashSet<&TaskId> = HashSet::new();
    let mut stack: Vec<&TaskId> = vec![from];
    visited.insert(from);

    while let Some(current) = stack.pop() {
        if current == to {
            let mut path = vec![current.clone()];
            let mut cursor = current;
            while let Some(&prev) = parent.get(cursor) {
                path.push(prev.clone());
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        // Reverse so lower IDs are explored first
        for next in graph.dependents_of(current).iter().rev() {
            if visited.insert(next) {
                parent.insert(next, current);
                stack.push(next);
            }
        }
    }

    None
}

/// Returns true if adding `prerequisite -> dependent` would create a cycle
pub fn would_create_cycle(graph: &Graph, prerequisite: &TaskId, dependent: &TaskId) -> bool {
    find_path(graph, dependent, prerequisite).is_some()
}

/// Validates a candidate edge against the current graph
///
/// `DuplicateEdge` means the edge is already present; callers adding an edge
/// treat it as success.
pub fn validate_insert(
    graph: &Graph,
    prerequisite: &TaskId,
    dependent: &TaskId,
) -> Result<(), GraphError> {
    if prerequisite == dependent {
        return Err(GraphError::SelfLoop(prerequisite.clone()));
    }

    for id in [prerequisite, dependent] {
        if !graph.contains(id) {
            return Err(GraphError::UnknownNode(id.clone()));
        }
    }

    let edge = DependencyEdge::new(prerequisite.clone(), dependent.clone());
    if graph.has_edge(&edge) {
        return Err(GraphError::DuplicateEdge(edge));
    }

    if let Some(path) = find_path(graph, dependent, prerequisite) {
        return Err(GraphError::CycleDetected { path, exact: true });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::tests::{diamond, edge, id, pending};
    use proptest::prelude::*;

    #[test]
    fn detects_transitive_cycle() {
        let graph = diamond();

        assert!(would_create_cycle(&graph, &id("D"), &id("A")));
        assert!(would_create_cycle(&graph, &id("B"), &id("A")));
        assert!(!would_create_cycle(&graph, &id("A"), &id("D")));
        assert!(!would_create_cycle(&graph, &id("B"), &id("C")));
    }

    #[test]
    fn cycle_error_carries_path() {
        let graph = diamond();
        let err = validate_insert(&graph, &id("D"), &id("A")).unwrap_err();

        match err {
            GraphError::CycleDetected { path, exact } => {
                assert!(exact);
                assert!(
                    path == vec![id("A"), id("B"), id("D")]
                        || path == vec![id("A"), id("C"), id("D")],
                    "unexpected path {:?}",
                    path
                );
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn two_node_cycle_path() {
        let graph = Graph::load(pending(&["A", "B"]), vec![edge("A", "B")]).unwrap();
        assert_eq!(
            validate_insert(&graph, &id("B"), &id("A")),
            Err(GraphError::CycleDetected {
                path: vec![id("A"), id("B")],
                exact: true,
            })
        );
    }

    #[test]
    fn self_loop_rejected() {
        let graph = diamond();
        assert_eq!(
            validate_insert(&graph, &id("A"), &id("A")),
            Err(GraphError::SelfLoop(id("A")))
        );
    }

    #[test]
    fn unknown_node_rejected() {
        let graph = diamond();
        assert_eq!(
            validate_insert(&graph, &id("A"), &id("Z")),
            Err(GraphError::UnknownNode(id("Z")))
        );
        assert_eq!(
            validate_insert(&graph, &id("Z"), &id("A")),
            Err(GraphError::UnknownNode(id("Z")))
        );
    }

    #[test]
    fn duplicate_is_reported_as_idempotent() {
        let graph = diamond();
        let err = validate_insert(&graph, &id("A"), &id("B")).unwrap_err();
        assert!(err.is_idempotent_success());
    }

    #[test]
    fn valid_insert_passes() {
        let graph = diamond();
        assert_eq!(validate_insert(&graph, &id("B"), &id("C")), Ok(()));
    }

    #[test]
    fn long_chain_cycle() {
        let ids: Vec<String> = (0..500).map(|i| format!("n{:03}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges = refs.windows(2).map(|w| edge(w[0], w[1])).collect::<Vec<_>>();
        let graph = Graph::load(pending(&refs), edges).unwrap();

        assert!(would_create_cycle(&graph, &id("n499"), &id("n000")));
        match validate_insert(&graph, &id("n499"), &id("n000")) {
            Err(GraphError::CycleDetected { path, .. }) => assert_eq!(path.len(), 500),
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    /// Plain reachability by repeated expansion, independent of the DFS
    fn reachable(graph: &Graph, from: &TaskId, to: &TaskId) -> bool {
        let mut seen: HashSet<TaskId> = HashSet::new();
        let mut frontier = vec![from.clone()];
        while let Some(next) = frontier.pop() {
            if &next == to {
                return true;
            }
            if seen.insert(next.clone()) {
                frontier.extend(graph.dependents_of(&next).iter().cloned());
            }
        }
        false
    }

    /// Random DAG: edges only go from lower to higher index
    fn arb_dag() -> impl Strategy<Value = Graph> {
        (2usize..12).prop_flat_map(|n| {
            proptest::collection::vec((0..n, 0..n), 0..30).prop_map(move |pairs| {
                let names: Vec<String> = (0..n).map(|i| format!("t{:02}", i)).collect();
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                let mut graph = Graph::load(pending(&refs), vec![]).unwrap();
                for (a, b) in pairs {
                    let (lo, hi) = (a.min(b), a.max(b));
                    if lo != hi {
                        if let Ok(next) = graph.with_edge(&edge(&names[lo], &names[hi])) {
                            graph = next;
                        }
                    }
                }
                graph
            })
        })
    }

    proptest! {
        #[test]
        fn cycle_iff_reverse_path_exists(graph in arb_dag(), a in 0usize..12, b in 0usize..12) {
            let ids: Vec<TaskId> = graph.task_ids().cloned().collect();
            let p = &ids[a % ids.len()];
            let d = &ids[b % ids.len()];
            if p != d {
                prop_assert_eq!(would_create_cycle(&graph, p, d), reachable(&graph, d, p));
            }
        }
    }
}
