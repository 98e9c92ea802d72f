use std::collections::HashMap;

use petgraph::{
    Direction,
    algo::{has_path_connecting, toposort},
    graph::{DiGraph, EdgeIndex, NodeIndex},
};

use crate::{Delay, Edge, NodeId};

/// A directed graph of same-step dependencies between nodes.
///
/// An edge `a -> b` means `b` reads a value `a` produces within the same step,
/// so `a` must be stepped first. Shifted edges are never part of this graph:
/// they deliver the previous step's value and impose no ordering. The graph is
/// kept acyclic; a same-step edge that would close a cycle is rejected before
/// it is added.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the dependency graph of a finished edge set.
    ///
    /// Every node in `nodes` is included, in order, even if no same-step edge
    /// touches it.
    pub fn from_edges<'a>(
        nodes: impl IntoIterator<Item = &'a NodeId>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.get_or_add_node(node);
        }
        for edge in edges {
            if edge.delay == Delay::SameStep {
                graph.add_dependency(&edge.source.node, &edge.destination.node);
            }
        }
        graph
    }

    /// Returns `true` if a same-step edge `from -> to` would close a cycle.
    ///
    /// A self-loop always does.
    #[must_use]
    pub fn would_close_cycle(&self, from: &NodeId, to: &NodeId) -> bool {
        if from == to {
            return true;
        }
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, to, from, None),
            _ => false,
        }
    }

    /// Records that `to` depends on `from` within a step.
    pub fn add_dependency(&mut self, from: &NodeId, to: &NodeId) -> EdgeIndex {
        let from = self.get_or_add_node(from);
        let to = self.get_or_add_node(to);
        self.graph.add_edge(from, to, ())
    }

    /// Removes a dependency previously returned by [`add_dependency`].
    ///
    /// Dependencies must be removed in reverse order of addition, since the
    /// underlying graph reuses indices.
    ///
    /// [`add_dependency`]: DependencyGraph::add_dependency
    pub(crate) fn remove_dependency(&mut self, index: EdgeIndex) {
        self.graph.remove_edge(index);
    }

    /// Returns nodes in an order where each node comes after everything it
    /// depends on within a step.
    ///
    /// Returns `None` if the graph contains a cycle.
    #[must_use]
    pub fn step_order(&self) -> Option<Vec<&NodeId>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|index| &self.graph[index]).collect())
    }

    /// Returns the nodes that `node` depends on within a step.
    pub fn dependencies(&self, node: &str) -> impl Iterator<Item = &NodeId> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Returns the nodes that depend on `node` within a step.
    pub fn dependents(&self, node: &str) -> impl Iterator<Item = &NodeId> {
        self.neighbors(node, Direction::Outgoing)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, node: &str, direction: Direction) -> impl Iterator<Item = &NodeId> {
        self.node_map
            .get(node)
            .into_iter()
            .flat_map(move |&index| self.graph.neighbors_directed(index, direction))
            .map(|index| &self.graph[index])
    }

    /// Returns the index of a node, adding it to the graph if it does not exist.
    fn get_or_add_node(&mut self, node: &NodeId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(node) {
            return index;
        }
        let index = self.graph.add_node(node.clone());
        self.node_map.insert(node.clone(), index);
        index
    }
}
