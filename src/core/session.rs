//! Session state: one user's progress through one graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::graph::NarrativeGraph;
use crate::schema::node::NodeId;
use crate::schema::value::Value;

/// Where a session stands in a graph.
///
/// A plain value: the engine never edits one in place, it returns a new
/// state for every transition. Serializes as
/// `{currentNodeId, variables, visited, progressScore}` so a session store
/// can persist it and hand it back later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_node_id: NodeId,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    #[serde(default)]
    pub visited: Vec<NodeId>,
    #[serde(default)]
    pub progress_score: u64,
}

impl SessionState {
    /// A fresh session sitting on `start`.
    pub fn new(start: impl Into<NodeId>) -> Self {
        Self {
            current_node_id: start.into(),
            variables: BTreeMap::new(),
            visited: Vec::new(),
            progress_score: 0,
        }
    }

    /// A fresh session at the graph's start node.
    pub fn begin(graph: &NarrativeGraph) -> Self {
        Self::new(graph.start.clone())
    }

    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn has_visited(&self, id: &NodeId) -> bool {
        self.visited.contains(id)
    }
}
