//! Workflow dependency graph.
//!
//! A thin wrapper around petgraph's `DiGraph` keyed by workflow-pipeline
//! UUIDs. Built fresh from a workflow's live nodes and edges whenever the
//! graph is validated or walked.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};

/// A directed graph over the live workflow pipelines of one workflow.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph; node weights are workflow-pipeline ids.
    graph: DiGraph<Uuid, ()>,
    /// Mapping from workflow-pipeline id to petgraph's NodeIndex.
    node_indices: HashMap<Uuid, NodeIndex>,
}

impl DependencyGraph {
    /// Builds a graph from node ids and directed edges.
    ///
    /// Nodes are inserted in slice order, which keeps walks deterministic.
    /// An edge referencing an id outside `nodes` is rejected.
    pub fn new(nodes: &[Uuid], edges: &[(Uuid, Uuid)]) -> WorkflowResult<Self> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_indices = HashMap::with_capacity(nodes.len());

        for &node in nodes {
            let index = graph.add_node(node);
            node_indices.insert(node, index);
        }

        for &(from, to) in edges {
            let from_index = *node_indices
                .get(&from)
                .ok_or(WorkflowError::UnknownNode(from))?;
            let to_index = *node_indices
                .get(&to)
                .ok_or(WorkflowError::UnknownNode(to))?;
            graph.add_edge(from_index, to_index, ());
        }

        Ok(Self {
            graph,
            node_indices,
        })
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns whether a node is part of the graph.
    pub fn contains_node(&self, id: Uuid) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Verifies the graph is acyclic.
    pub fn ensure_acyclic(&self) -> WorkflowResult<()> {
        if is_cyclic_directed(&self.graph) {
            Err(WorkflowError::CycleDetected)
        } else {
            Ok(())
        }
    }

    /// Verifies the graph stays acyclic after adding a candidate edge.
    ///
    /// The candidate edge is only probed, never retained.
    pub fn ensure_acyclic_with(&self, from: Uuid, to: Uuid) -> WorkflowResult<()> {
        let mut probe = self.graph.clone();

        let from_index = *self
            .node_indices
            .get(&from)
            .ok_or(WorkflowError::UnknownNode(from))?;
        let to_index = *self
            .node_indices
            .get(&to)
            .ok_or(WorkflowError::UnknownNode(to))?;

        probe.add_edge(from_index, to_index, ());

        if is_cyclic_directed(&probe) {
            Err(WorkflowError::CycleDetected)
        } else {
            Ok(())
        }
    }

    /// Returns the nodes with no incoming edges, in insertion order.
    pub fn roots(&self) -> Vec<Uuid> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .edges_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|index| self.graph[index])
            .collect()
    }

    /// Returns the direct predecessors of a node.
    pub fn predecessors(&self, id: Uuid) -> Vec<Uuid> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the direct successors of a node.
    pub fn successors(&self, id: Uuid) -> Vec<Uuid> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Returns every node transitively reachable from `id`, excluding `id`.
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let Some(&start) = self.node_indices.get(&id) else {
            return Vec::new();
        };

        let mut dfs = Dfs::new(&self.graph, start);
        let mut reachable = Vec::new();
        while let Some(index) = dfs.next(&self.graph) {
            if index != start {
                reachable.push(self.graph[index]);
            }
        }

        reachable
    }

    fn neighbors(&self, id: Uuid, direction: Direction) -> Vec<Uuid> {
        let Some(&index) = self.node_indices.get(&id) else {
            return Vec::new();
        };

        let mut neighbors: Vec<Uuid> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| match direction {
                Direction::Incoming => self.graph[edge.source()],
                Direction::Outgoing => self.graph[edge.target()],
            })
            .collect();

        // petgraph yields edges newest-first; flip back to insertion order.
        neighbors.reverse();
        neighbors.dedup();
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn empty_graph_is_acyclic() {
        let graph = DependencyGraph::new(&[], &[]).unwrap();
        assert!(graph.is_empty());
        assert!(graph.ensure_acyclic().is_ok());
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn rejects_edge_to_unknown_node() {
        let nodes = ids(1);
        let stranger = Uuid::new_v4();
        let result = DependencyGraph::new(&nodes, &[(nodes[0], stranger)]);
        assert_eq!(result.unwrap_err(), WorkflowError::UnknownNode(stranger));
    }

    #[test]
    fn detects_existing_cycle() {
        let n = ids(3);
        let graph =
            DependencyGraph::new(&n, &[(n[0], n[1]), (n[1], n[2]), (n[2], n[0])]).unwrap();
        assert_eq!(graph.ensure_acyclic(), Err(WorkflowError::CycleDetected));
    }

    #[test]
    fn rejects_candidate_edge_closing_a_cycle() {
        let n = ids(3);
        let graph = DependencyGraph::new(&n, &[(n[0], n[1]), (n[1], n[2])]).unwrap();
        assert!(graph.ensure_acyclic().is_ok());
        assert_eq!(
            graph.ensure_acyclic_with(n[2], n[0]),
            Err(WorkflowError::CycleDetected)
        );
        // Probing must not mutate the graph.
        assert!(graph.ensure_acyclic().is_ok());
        assert!(graph.ensure_acyclic_with(n[0], n[2]).is_ok());
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let n = ids(1);
        let graph = DependencyGraph::new(&n, &[]).unwrap();
        assert_eq!(
            graph.ensure_acyclic_with(n[0], n[0]),
            Err(WorkflowError::CycleDetected)
        );
    }

    #[test]
    fn roots_are_nodes_without_predecessors() {
        let n = ids(4);
        // n0 -> n2, n1 -> n2, n2 -> n3
        let graph =
            DependencyGraph::new(&n, &[(n[0], n[2]), (n[1], n[2]), (n[2], n[3])]).unwrap();
        assert_eq!(graph.roots(), vec![n[0], n[1]]);
    }

    #[test]
    fn neighbors_follow_edge_direction() {
        let n = ids(4);
        let graph =
            DependencyGraph::new(&n, &[(n[0], n[1]), (n[0], n[2]), (n[1], n[3]), (n[2], n[3])])
                .unwrap();

        assert_eq!(graph.successors(n[0]), vec![n[1], n[2]]);
        assert_eq!(graph.predecessors(n[3]), vec![n[1], n[2]]);
        assert!(graph.predecessors(n[0]).is_empty());
        assert!(graph.successors(n[3]).is_empty());
    }

    #[test]
    fn descendants_are_transitive() {
        let n = ids(4);
        let graph =
            DependencyGraph::new(&n, &[(n[0], n[1]), (n[1], n[2])]).unwrap();

        let mut reachable = graph.descendants(n[0]);
        reachable.sort();
        let mut expected = vec![n[1], n[2]];
        expected.sort();
        assert_eq!(reachable, expected);
        assert!(graph.descendants(n[3]).is_empty());
    }
}
