//! Dependency graph for tasks
//!
//! Holds a snapshot of task nodes with forward (prerequisite -> dependents)
//! and reverse (dependent -> prerequisites) adjacency. A `Graph` is a value:
//! [`Graph::with_edge`] and friends return a new graph and leave the original
//! untouched, so readers holding a snapshot never see a half-applied change.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::edge::DependencyEdge;
use super::error::{GraphError, InvalidEdgeReason};
use super::id::TaskId;
use super::task::{TaskNode, TaskStatus};

type Adjacency = BTreeMap<TaskId, BTreeSet<TaskId>>;

static EMPTY: BTreeSet<TaskId> = BTreeSet::new();

/// An immutable dependency graph snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<TaskId, TaskNode>,

    /// prerequisite -> dependents
    forward: Adjacency,

    /// dependent -> prerequisites
    reverse: Adjacency,
}

impl Graph {
    /// Creates an empty graph
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a graph from task nodes and edges
    ///
    /// Fails on the first self-loop, duplicate or dangling edge rather than
    /// skipping it. Acyclicity is not checked here; see
    /// [`super::levels::assign_levels`].
    pub fn load(
        tasks: impl IntoIterator<Item = TaskNode>,
        edges: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::empty();

        // First pass: add all nodes
        for task in tasks {
            if graph.nodes.contains_key(&task.id) {
                return Err(GraphError::DuplicateNode(task.id));
            }
            graph.forward.insert(task.id.clone(), BTreeSet::new());
            graph.reverse.insert(task.id.clone(), BTreeSet::new());
            graph.nodes.insert(task.id.clone(), task);
        }

        // Second pass: add all edges
        for edge in edges {
            let reason = if edge.is_self_loop() {
                Some(InvalidEdgeReason::SelfLoop)
            } else if !graph.contains(&edge.prerequisite) {
                Some(InvalidEdgeReason::UnknownPrerequisite)
            } else if !graph.contains(&edge.dependent) {
                Some(InvalidEdgeReason::UnknownDependent)
            } else if graph.has_edge(&edge) {
                Some(InvalidEdgeReason::Duplicate)
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(GraphError::InvalidEdge { edge, reason });
            }
            graph.link(&edge);
        }

        Ok(graph)
    }

    fn link(&mut self, edge: &DependencyEdge) {
        self.forward
            .entry(edge.prerequisite.clone())
            .or_default()
            .insert(edge.dependent.clone());
        self.reverse
            .entry(edge.dependent.clone())
            .or_default()
            .insert(edge.prerequisite.clone());
    }

    fn unlink(&mut self, edge: &DependencyEdge) {
        if let Some(set) = self.forward.get_mut(&edge.prerequisite) {
            set.remove(&edge.dependent);
        }
        if let Some(set) = self.reverse.get_mut(&edge.dependent) {
            set.remove(&edge.prerequisite);
        }
    }

    /// Returns a copy of this graph with `edge` added
    ///
    /// Checks the structural invariants only (self-loop, endpoints, duplicate).
    /// Cycle checks belong to [`super::cycle::validate_insert`].
    pub fn with_edge(&self, edge: &DependencyEdge) -> Result<Self, GraphError> {
        if edge.is_self_loop() {
            return Err(GraphError::SelfLoop(edge.prerequisite.clone()));
        }
        for id in [&edge.prerequisite, &edge.dependent] {
            if !self.contains(id) {
                return Err(GraphError::UnknownNode(id.clone()));
            }
        }
        if self.has_edge(edge) {
            return Err(GraphError::DuplicateEdge(edge.clone()));
        }

        let mut next = self.clone();
        next.link(edge);
        Ok(next)
    }

    /// Returns a copy of this graph without `edge`
    pub fn without_edge(&self, edge: &DependencyEdge) -> Result<Self, GraphError> {
        if !self.has_edge(edge) {
            return Err(GraphError::EdgeNotFound(edge.clone()));
        }

        let mut next = self.clone();
        next.unlink(edge);
        Ok(next)
    }

    /// Returns a copy of this graph with one node's status replaced
    pub fn with_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<Self, GraphError> {
        let mut next = self.clone();
        let node = next
            .nodes
            .get_mut(task_id)
            .ok_or_else(|| GraphError::UnknownNode(task_id.clone()))?;
        node.status = status;
        Ok(next)
    }

    /// Returns the direct prerequisites of a task
    pub fn prerequisites_of(&self, task_id: &TaskId) -> &BTreeSet<TaskId> {
        self.reverse.get(task_id).unwrap_or(&EMPTY)
    }

    /// Returns the direct dependents of a task (tasks that wait on it)
    pub fn dependents_of(&self, task_id: &TaskId) -> &BTreeSet<TaskId> {
        self.forward.get(task_id).unwrap_or(&EMPTY)
    }

    /// Returns the node for a task
    pub fn node(&self, task_id: &TaskId) -> Option<&TaskNode> {
        self.nodes.get(task_id)
    }

    /// Returns the status of a task
    pub fn status(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.nodes.get(task_id).map(|n| n.status)
    }

    /// Iterates all nodes in ID order
    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    /// Returns all task IDs in the graph
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.nodes.keys()
    }

    /// Returns every edge, ordered by prerequisite then dependent
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.forward
            .iter()
            .flat_map(|(prerequisite, dependents)| {
                dependents.iter().map(move |dependent| {
                    DependencyEdge::new(prerequisite.clone(), dependent.clone())
                })
            })
            .collect()
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.nodes.contains_key(task_id)
    }

    pub fn has_edge(&self, edge: &DependencyEdge) -> bool {
        self.dependents_of(&edge.prerequisite)
            .contains(&edge.dependent)
    }

    /// Returns the number of tasks in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Verifies that forward and reverse adjacency mirror each other
    pub fn check_consistency(&self) -> bool {
        let forward_edges = self.edge_count();
        let reverse_edges: usize = self.reverse.values().map(BTreeSet::len).sum();
        if forward_edges != reverse_edges {
            return false;
        }

        self.forward.iter().all(|(prerequisite, dependents)| {
            self.contains(prerequisite)
                && dependents.iter().all(|dependent| {
                    self.contains(dependent)
                        && self.prerequisites_of(dependent).contains(prerequisite)
                })
        })
    }

    /// Builds a petgraph view with edges pointing prerequisite -> dependent
    fn to_digraph(&self) -> DiGraph<TaskId, ()> {
        let mut graph = DiGraph::with_capacity(self.node_count(), self.edge_count());
        let mut index: HashMap<&TaskId, NodeIndex> = HashMap::with_capacity(self.node_count());

        for id in self.nodes.keys() {
            index.insert(id, graph.add_node(id.clone()));
        }
        for (prerequisite, dependents) in &self.forward {
            for dependent in dependents {
                if let (Some(&from), Some(&to)) = (index.get(prerequisite), index.get(dependent)) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        graph
    }

    /// Returns all tasks in topological order (prerequisites before dependents)
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
        let graph = self.to_digraph();
        match toposort(&graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let at = graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .into_iter()
                    .collect();
                Err(GraphError::CycleDetected {
                    path: at,
                    exact: false,
                })
            }
        }
    }
}
