use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::choice::Choice;
use super::value::Value;

/// Newtype wrapper for node IDs. Unique within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// What kind of beat a node represents. Renderers switch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A line spoken by the persona.
    Dialogue,
    /// A prompt that waits for the user to pick an option.
    Choice,
    /// A reflective takeaway surfaced to the user.
    Insight,
    /// A closing beat.
    Completion,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Choice => "choice",
            Self::Insight => "insight",
            Self::Completion => "completion",
        }
    }
}

/// A single authored beat in a chamber graph.
///
/// Routing is either an ordered list of choices or a single `next`
/// successor, never both. A node with neither is a terminal leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub next: Option<NodeId>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: &str, kind: NodeKind, text: &str) -> Self {
        Self {
            id: NodeId::from(id),
            kind,
            text: text.to_string(),
            choices: Vec::new(),
            next: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_next(mut self, next: &str) -> Self {
        self.next = Some(NodeId::from(next));
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Look up an outgoing choice by ID.
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    /// True if the node has no outgoing edges at all.
    pub fn is_leaf(&self) -> bool {
        self.choices.is_empty() && self.next.is_none()
    }

    /// Every node ID this node can route to, choices first.
    pub fn successors(&self) -> impl Iterator<Item = &NodeId> {
        self.choices
            .iter()
            .map(|c| &c.target)
            .chain(self.next.iter())
    }
}
