//! Workflow graph implementation.
//!
//! The graph is stored exactly as the editor produces it: a list of nodes
//! and a list of edges, in editor order. Nothing is checked on construction;
//! that is the validator's job. Algorithms work on a petgraph view built by
//! [`WorkflowGraph::dependency_graph`].

use crate::edge::Edge;
use crate::node::{ControlRole, Node, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A workflow graph as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes in editor order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in editor order.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Petgraph view of a [`WorkflowGraph`].
///
/// Node index `i` is `nodes[i]`, and edge indices follow editor order, so
/// iterating either in index order reproduces the authored order. Edges with
/// an unknown endpoint are left out. When IDs repeat, edges attach to the
/// first node carrying the ID.
pub type DependencyGraph<'a> = DiGraph<&'a NodeId, &'a Edge>;

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node. Chainable, for building graphs in code.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends an edge. Chainable.
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Appends an edge between two node IDs, deriving the edge ID.
    #[must_use]
    pub fn connect(self, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        self.with_edge(Edge::between(source, target))
    }

    /// Returns the first node with the given ID.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == node_id)
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns every control node with the given role.
    pub fn control_nodes(&self, role: ControlRole) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.control_role() == Some(role))
            .collect()
    }

    /// Returns edges whose source or target names no node, paired with the
    /// missing ID.
    pub fn dangling_edges(&self) -> Vec<(&Edge, &NodeId)> {
        let index = self.first_index();
        let mut dangling = Vec::new();
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !index.contains_key(endpoint) {
                    dangling.push((edge, endpoint));
                }
            }
        }
        dangling
    }

    /// Returns IDs carried by more than one node, each reported once.
    pub fn duplicate_ids(&self) -> Vec<&NodeId> {
        let mut counts: HashMap<&NodeId, usize> = HashMap::new();
        for node in &self.nodes {
            *counts.entry(&node.id).or_default() += 1;
        }
        let mut duplicates: Vec<_> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        duplicates.sort();
        duplicates
    }

    /// Builds the petgraph view used by the orderer and the validator.
    #[must_use]
    pub fn dependency_graph(&self) -> DependencyGraph<'_> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(&node.id);
        }

        let index = self.first_index();
        for edge in &self.edges {
            let endpoints = (index.get(&edge.source), index.get(&edge.target));
            if let (Some(&source), Some(&target)) = endpoints {
                graph.add_edge(source, target, edge);
            }
        }
        graph
    }

    fn first_index(&self) -> HashMap<&NodeId, NodeIndex> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (position, node) in self.nodes.iter().enumerate() {
            index.entry(&node.id).or_insert(NodeIndex::new(position));
        }
        index
    }
}
