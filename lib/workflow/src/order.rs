//! Topological ordering of workflow graphs.
//!
//! Kahn's algorithm over the petgraph view. The queue is FIFO, seeded with
//! zero in-degree nodes in node-array order, and successors are released in
//! edge-insertion order, so the result is fully determined by the authored
//! order of nodes and edges.

use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::VecDeque;

/// Result of ordering a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ordering {
    /// Node IDs in execution order. Partial when `has_cycle` is set.
    pub sequence: Vec<NodeId>,
    /// Set when some nodes could never be released (cycle members and their
    /// descendants).
    pub has_cycle: bool,
}

impl Ordering {
    /// Returns the IDs of nodes left out of the sequence.
    #[must_use]
    pub fn unordered<'a>(&self, graph: &'a WorkflowGraph) -> Vec<&'a NodeId> {
        let mut remaining: Vec<&NodeId> = self.sequence.iter().collect();
        graph
            .nodes
            .iter()
            .map(|node| &node.id)
            .filter(|id| match remaining.iter().position(|seen| seen == id) {
                Some(position) => {
                    remaining.swap_remove(position);
                    false
                }
                None => true,
            })
            .collect()
    }
}

/// Orders the nodes of `graph` so every edge points forward.
#[must_use]
pub fn order(graph: &WorkflowGraph) -> Ordering {
    let dag = graph.dependency_graph();

    let mut in_degree: Vec<usize> = dag
        .node_indices()
        .map(|index| dag.edges_directed(index, Direction::Incoming).count())
        .collect();

    let mut queue: VecDeque<_> = dag
        .node_indices()
        .filter(|index| in_degree[index.index()] == 0)
        .collect();

    let mut sequence = Vec::with_capacity(dag.node_count());
    while let Some(index) = queue.pop_front() {
        sequence.push(dag[index].clone());

        // petgraph walks adjacency lists newest-first
        let mut outgoing: Vec<_> = dag.edges_directed(index, Direction::Outgoing).collect();
        outgoing.sort_by_key(|edge| edge.id());

        for edge in outgoing {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                queue.push_back(target);
            }
        }
    }

    let has_cycle = sequence.len() != dag.node_count();
    Ordering { sequence, has_cycle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CoreAction, Node, NodeKind, VaultActionConfig};

    fn action(id: &str) -> Node {
        Node::new(
            id,
            id,
            NodeKind::CoreAction(CoreAction::Supply(VaultActionConfig::default())),
        )
    }

    fn ids(ordering: &Ordering) -> Vec<&str> {
        ordering.sequence.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn linear_chain() {
        let graph = WorkflowGraph::new()
            .with_node(Node::end("e"))
            .with_node(action("b"))
            .with_node(action("a"))
            .with_node(Node::start("s"))
            .connect("s", "a")
            .connect("a", "b")
            .connect("b", "e");

        let ordering = order(&graph);
        assert!(!ordering.has_cycle);
        assert_eq!(ids(&ordering), ["s", "a", "b", "e"]);
    }

    #[test]
    fn fan_out_follows_edge_order() {
        let graph = WorkflowGraph::new()
            .with_node(Node::start("s"))
            .with_node(action("x"))
            .with_node(action("y"))
            .connect("s", "y")
            .connect("s", "x");

        assert_eq!(ids(&order(&graph)), ["s", "y", "x"]);
    }

    #[test]
    fn roots_seed_in_node_order() {
        let graph = WorkflowGraph::new()
            .with_node(action("b"))
            .with_node(action("a"))
            .with_node(action("c"))
            .connect("b", "c");

        assert_eq!(ids(&order(&graph)), ["b", "a", "c"]);
    }

    #[test]
    fn diamond_waits_for_all_parents() {
        let graph = WorkflowGraph::new()
            .with_node(Node::start("s"))
            .with_node(action("l"))
            .with_node(action("r"))
            .with_node(action("j"))
            .connect("s", "l")
            .connect("s", "r")
            .connect("l", "j")
            .connect("r", "j");

        let ordering = order(&graph);
        assert_eq!(ids(&ordering), ["s", "l", "r", "j"]);
    }

    #[test]
    fn parallel_edges_counted_per_edge() {
        let graph = WorkflowGraph::new()
            .with_node(action("a"))
            .with_node(action("b"))
            .connect("a", "b")
            .connect("a", "b");

        let ordering = order(&graph);
        assert!(!ordering.has_cycle);
        assert_eq!(ids(&ordering), ["a", "b"]);
    }

    #[test]
    fn cycle_is_flagged_with_partial_sequence() {
        let graph = WorkflowGraph::new()
            .with_node(Node::start("s"))
            .with_node(action("a"))
            .with_node(action("b"))
            .with_node(action("c"))
            .connect("s", "a")
            .connect("a", "b")
            .connect("b", "a")
            .connect("b", "c");

        let ordering = order(&graph);
        assert!(ordering.has_cycle);
        assert_eq!(ids(&ordering), ["s"]);

        let unordered: Vec<_> = ordering
            .unordered(&graph)
            .into_iter()
            .map(NodeId::as_str)
            .collect();
        assert_eq!(unordered, ["a", "b", "c"]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = WorkflowGraph::new().with_node(action("a")).connect("a", "a");
        assert!(order(&graph).has_cycle);
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let graph = WorkflowGraph::new()
            .with_node(action("a"))
            .connect("ghost", "a");

        let ordering = order(&graph);
        assert!(!ordering.has_cycle);
        assert_eq!(ids(&ordering), ["a"]);
    }

    #[test]
    fn every_edge_points_forward() {
        let graph = WorkflowGraph::new()
            .with_node(action("d"))
            .with_node(action("c"))
            .with_node(action("b"))
            .with_node(action("a"))
            .connect("a", "b")
            .connect("a", "c")
            .connect("c", "d")
            .connect("b", "d");

        let ordering = order(&graph);
        let position = |id: &NodeId| ordering.sequence.iter().position(|n| n == id).unwrap();
        for edge in &graph.edges {
            assert!(position(&edge.source) < position(&edge.target));
        }
        assert_eq!(ordering.sequence.len(), graph.node_count());
    }
}
