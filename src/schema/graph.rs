use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::{Node, NodeId};

/// Composite catalog key: scene context plus persona variant,
/// e.g. `emotion` + `compassionate_friend`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphKey {
    pub context: String,
    pub variant: String,
}

impl GraphKey {
    pub fn new(context: &str, variant: &str) -> Self {
        Self {
            context: context.to_string(),
            variant: variant.to_string(),
        }
    }
}

impl fmt::Display for GraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.context, self.variant)
    }
}

/// An authored chamber narrative: a directed graph of dialogue nodes
/// for one (context, variant) pair.
///
/// Graphs are plain data. The catalog checks their structural
/// invariants before publishing them, and after that they are only
/// handed out behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeGraph {
    pub key: GraphKey,
    pub nodes: FxHashMap<NodeId, Node>,
    pub start: NodeId,
    pub completion: FxHashSet<NodeId>,
}

impl NarrativeGraph {
    /// Assemble a graph from a node list. Later nodes replace earlier ones
    /// with the same ID; use the RON loader for duplicate detection.
    pub fn new(
        key: GraphKey,
        start: &str,
        completion: &[&str],
        nodes: impl IntoIterator<Item = Node>,
    ) -> Self {
        Self {
            key,
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            start: NodeId::from(start),
            completion: completion.iter().map(|id| NodeId::from(*id)).collect(),
        }
    }

    pub fn context(&self) -> &str {
        &self.key.context
    }

    pub fn variant(&self) -> &str {
        &self.key.variant
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.get(&self.start)
    }

    pub fn is_completion(&self, id: &NodeId) -> bool {
        self.completion.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node IDs in sorted order, for stable reporting.
    pub fn sorted_node_ids(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::choice::Choice;
    use crate::schema::node::NodeKind;

    fn two_node_graph() -> NarrativeGraph {
        NarrativeGraph::new(
            GraphKey::new("emotion", "compassionate_friend"),
            "a",
            &["b"],
            vec![
                Node::new("a", NodeKind::Dialogue, "Hello.")
                    .with_choice(Choice::new("c1", "Hi", "b")),
                Node::new("b", NodeKind::Completion, "Bye."),
            ],
        )
    }

    #[test]
    fn accessors() {
        let g = two_node_graph();
        assert_eq!(g.context(), "emotion");
        assert_eq!(g.variant(), "compassionate_friend");
        assert_eq!(g.start_node().map(|n| n.text.as_str()), Some("Hello."));
        assert!(g.is_completion(&NodeId::from("b")));
        assert!(!g.is_completion(&NodeId::from("a")));
        assert_eq!(g.node_count(), 2);
        assert!(g.node(&NodeId::from("zzz")).is_none());
    }

    #[test]
    fn key_display() {
        let key = GraphKey::new("emotion", "wise_detective");
        assert_eq!(key.to_string(), "emotion/wise_detective");
    }

    #[test]
    fn sorted_ids_are_stable() {
        let g = two_node_graph();
        let ids: Vec<&str> = g.sorted_node_ids().iter().map(|n| n.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
