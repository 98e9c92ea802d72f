use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::{DependencyGraph, DuplicateEdgeWarning, Edge, Kind, Node, NodeId, StyleRegistry};

/// A finished, immutable co-simulation topology.
///
/// This is the hand-off to the simulation kernel: every node, every edge with
/// its delay and seed, and the style registry of each visualization sink.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "K: Kind"))]
pub struct Topology<K> {
    nodes: Vec<Node<K>>,
    edges: Arc<[Edge]>,
    styles: BTreeMap<NodeId, StyleRegistry>,
    #[serde(skip)]
    warnings: Vec<DuplicateEdgeWarning>,
}

impl<K: Kind> Topology<K> {
    pub(crate) fn new(
        nodes: Vec<Node<K>>,
        edges: Arc<[Edge]>,
        styles: BTreeMap<NodeId, StyleRegistry>,
        warnings: Vec<DuplicateEdgeWarning>,
    ) -> Self {
        Self {
            nodes,
            edges,
            styles,
            warnings,
        }
    }

    /// All nodes, in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<K>] {
        &self.nodes
    }

    /// All edges, in declaration order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// A shared handle to the sealed edge set.
    #[must_use]
    pub fn shared_edges(&self) -> Arc<[Edge]> {
        Arc::clone(&self.edges)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node<K>> {
        self.nodes.iter().find(|node| node.id().as_str() == id)
    }

    /// Edges delivering into `node`.
    pub fn incoming<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |edge| edge.destination.node.as_str() == node)
    }

    /// Edges reading from `node`.
    pub fn outgoing<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source.node.as_str() == node)
    }

    /// Edges that deliver one step late.
    pub fn delayed_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| edge.is_shifted())
    }

    /// The style registry of a visualization sink, if styles were registered for it.
    #[must_use]
    pub fn styles(&self, sink: &str) -> Option<&StyleRegistry> {
        self.styles.get(sink)
    }

    /// Duplicate edge declarations seen during assembly.
    #[must_use]
    pub fn warnings(&self) -> &[DuplicateEdgeWarning] {
        &self.warnings
    }

    /// An order in which the kernel can step nodes within one step.
    ///
    /// Every node comes after all nodes it reads from over same-step edges.
    /// Assembly rejects same-step cycles, so an order always exists.
    #[must_use]
    pub fn call_order(&self) -> Vec<NodeId> {
        let graph = DependencyGraph::from_edges(self.nodes.iter().map(Node::id), self.edges.iter());
        graph
            .step_order()
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect()
    }
}
