//! Edge types for workflow graphs.
//!
//! An edge `source -> target` means `source` must run before `target`.
//! Edges carry no data; ordering is their only meaning.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Edge identifier, used in validation messages.
    pub id: String,
    /// The node that runs first.
    pub source: NodeId,
    /// The node that runs after `source`.
    pub target: NodeId,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Creates an edge whose ID is derived from its endpoints.
    #[must_use]
    pub fn between(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{source}->{target}"),
            source,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_derives_id() {
        let edge = Edge::between("a", "b");
        assert_eq!(edge.id, "a->b");
        assert_eq!(edge.source, NodeId::new("a"));
        assert_eq!(edge.target, NodeId::new("b"));
    }

    #[test]
    fn serde_shape() {
        let edge: Edge = serde_json::from_str(r#"{"id":"e1","source":"s","target":"n1"}"#)
            .expect("deserialize");
        assert_eq!(edge, Edge::new("e1", "s", "n1"));
    }
}
