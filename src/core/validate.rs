//! Structural checks run on every graph before the catalog publishes it.

use std::fmt;

use crate::core::catalog::CatalogError;
use crate::schema::graph::NarrativeGraph;
use crate::schema::node::NodeId;

/// A single broken invariant inside one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The designated start node is not in the node map.
    MissingStart(NodeId),
    /// A completion node is not in the node map.
    MissingCompletion(NodeId),
    /// A node-map key disagrees with the node's own ID.
    MismatchedId { key: NodeId, id: NodeId },
    /// The same node ID was authored twice.
    DuplicateNode(NodeId),
    /// A node carries both choices and a `next` successor.
    AmbiguousRouting { node: NodeId },
    /// Two choices on one node share an ID.
    DuplicateChoice { node: NodeId, choice: String },
    /// A choice targets a node that does not exist.
    DanglingChoice {
        node: NodeId,
        choice: String,
        target: NodeId,
    },
    /// A `next` successor points at a node that does not exist.
    DanglingNext { node: NodeId, target: NodeId },
    /// An authored effect could not be turned into a typed effect.
    InvalidEffect {
        node: NodeId,
        choice: String,
        reason: String,
    },
}

impl Violation {
    /// The node the violation is attributed to.
    pub fn node(&self) -> &NodeId {
        match self {
            Self::MissingStart(id) | Self::MissingCompletion(id) | Self::DuplicateNode(id) => id,
            Self::MismatchedId { key, .. } => key,
            Self::AmbiguousRouting { node }
            | Self::DuplicateChoice { node, .. }
            | Self::DanglingChoice { node, .. }
            | Self::DanglingNext { node, .. }
            | Self::InvalidEffect { node, .. } => node,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart(id) => write!(f, "start node '{id}' does not exist"),
            Self::MissingCompletion(id) => write!(f, "completion node '{id}' does not exist"),
            Self::MismatchedId { key, id } => {
                write!(f, "node stored under '{key}' declares id '{id}'")
            }
            Self::DuplicateNode(id) => write!(f, "node '{id}' is defined more than once"),
            Self::AmbiguousRouting { node } => {
                write!(f, "node '{node}' has both choices and a next node")
            }
            Self::DuplicateChoice { node, choice } => {
                write!(f, "node '{node}' has more than one choice '{choice}'")
            }
            Self::DanglingChoice {
                node,
                choice,
                target,
            } => write!(
                f,
                "choice '{choice}' on node '{node}' targets missing node '{target}'"
            ),
            Self::DanglingNext { node, target } => {
                write!(f, "node '{node}' continues to missing node '{target}'")
            }
            Self::InvalidEffect {
                node,
                choice,
                reason,
            } => write!(f, "choice '{choice}' on node '{node}': {reason}"),
        }
    }
}

/// Collect every violation in a graph, in a stable order
/// (graph-level checks first, then nodes sorted by ID).
pub fn violations(graph: &NarrativeGraph) -> Vec<Violation> {
    let mut found = Vec::new();

    if graph.node(&graph.start).is_none() {
        found.push(Violation::MissingStart(graph.start.clone()));
    }

    let mut completion: Vec<&NodeId> = graph.completion.iter().collect();
    completion.sort();
    for id in completion {
        if graph.node(id).is_none() {
            found.push(Violation::MissingCompletion(id.clone()));
        }
    }

    for key in graph.sorted_node_ids() {
        let Some(node) = graph.node(key) else {
            continue;
        };

        if &node.id != key {
            found.push(Violation::MismatchedId {
                key: key.clone(),
                id: node.id.clone(),
            });
        }

        if node.has_choices() && node.next.is_some() {
            found.push(Violation::AmbiguousRouting {
                node: key.clone(),
            });
        }

        for (i, choice) in node.choices.iter().enumerate() {
            if node.choices[..i].iter().any(|c| c.id == choice.id) {
                found.push(Violation::DuplicateChoice {
                    node: key.clone(),
                    choice: choice.id.clone(),
                });
            }
            if graph.node(&choice.target).is_none() {
                found.push(Violation::DanglingChoice {
                    node: key.clone(),
                    choice: choice.id.clone(),
                    target: choice.target.clone(),
                });
            }
        }

        if let Some(ref next) = node.next {
            if graph.node(next).is_none() {
                found.push(Violation::DanglingNext {
                    node: key.clone(),
                    target: next.clone(),
                });
            }
        }
    }

    found
}

/// Fail with the first violation found, attributed to the graph.
pub fn validate_graph(graph: &NarrativeGraph) -> Result<(), CatalogError> {
    match violations(graph).into_iter().next() {
        Some(violation) => Err(CatalogError::InvalidGraph {
            graph: graph.key.clone(),
            violation,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::choice::Choice;
    use crate::schema::graph::GraphKey;
    use crate::schema::node::{Node, NodeKind};

    fn key() -> GraphKey {
        GraphKey::new("emotion", "compassionate_friend")
    }

    fn valid_graph() -> NarrativeGraph {
        NarrativeGraph::new(
            key(),
            "a",
            &["c"],
            vec![
                Node::new("a", NodeKind::Dialogue, "Hello.").with_next("b"),
                Node::new("b", NodeKind::Choice, "How do you feel?")
                    .with_choice(Choice::new("calm", "Calm", "c"))
                    .with_choice(Choice::new("again", "Ask again", "b")),
                Node::new("c", NodeKind::Completion, "Take care."),
            ],
        )
    }

    #[test]
    fn valid_graph_passes() {
        assert!(violations(&valid_graph()).is_empty());
        assert!(validate_graph(&valid_graph()).is_ok());
    }

    #[test]
    fn missing_start_and_completion() {
        let mut g = valid_graph();
        g.start = NodeId::from("nowhere");
        g.completion.insert(NodeId::from("gone"));
        let found = violations(&g);
        assert_eq!(found[0], Violation::MissingStart(NodeId::from("nowhere")));
        assert_eq!(found[1], Violation::MissingCompletion(NodeId::from("gone")));
    }

    #[test]
    fn dangling_choice_names_node_and_choice() {
        let mut g = valid_graph();
        if let Some(b) = g.nodes.get_mut(&NodeId::from("b")) {
            b.choices.push(Choice::new("lost", "Wander off", "void"));
        }
        let err = validate_graph(&g).unwrap_err();
        match err {
            CatalogError::InvalidGraph { graph, violation } => {
                assert_eq!(graph, key());
                assert_eq!(
                    violation,
                    Violation::DanglingChoice {
                        node: NodeId::from("b"),
                        choice: "lost".to_string(),
                        target: NodeId::from("void"),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dangling_next() {
        let mut g = valid_graph();
        if let Some(a) = g.nodes.get_mut(&NodeId::from("a")) {
            a.next = Some(NodeId::from("void"));
        }
        let found = violations(&g);
        assert_eq!(
            found,
            vec![Violation::DanglingNext {
                node: NodeId::from("a"),
                target: NodeId::from("void"),
            }]
        );
    }

    #[test]
    fn ambiguous_routing_rejected() {
        let mut g = valid_graph();
        if let Some(b) = g.nodes.get_mut(&NodeId::from("b")) {
            b.next = Some(NodeId::from("c"));
        }
        assert!(violations(&g).contains(&Violation::AmbiguousRouting {
            node: NodeId::from("b")
        }));
    }

    #[test]
    fn duplicate_choice_ids_rejected() {
        let mut g = valid_graph();
        if let Some(b) = g.nodes.get_mut(&NodeId::from("b")) {
            b.choices.push(Choice::new("calm", "Calm again", "c"));
        }
        assert!(violations(&g).contains(&Violation::DuplicateChoice {
            node: NodeId::from("b"),
            choice: "calm".to_string(),
        }));
    }

    #[test]
    fn mismatched_key_detected() {
        let mut g = valid_graph();
        let node = Node::new("other", NodeKind::Insight, "Hmm.");
        g.nodes.insert(NodeId::from("x"), node);
        assert!(violations(&g).contains(&Violation::MismatchedId {
            key: NodeId::from("x"),
            id: NodeId::from("other"),
        }));
    }

    #[test]
    fn display_mentions_node() {
        let v = Violation::DanglingNext {
            node: NodeId::from("a"),
            target: NodeId::from("void"),
        };
        assert_eq!(v.node(), &NodeId::from("a"));
        assert!(v.to_string().contains("'a'"));
        assert!(v.to_string().contains("'void'"));
    }
}
