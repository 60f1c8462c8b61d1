use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::value::Value;

/// A side effect applied to the session when a choice is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Add to the session's progress score instead of the default increment.
    ProgressDelta(u32),
    /// Write a session variable. Later writes win.
    SetVariable { key: String, value: Value },
}

/// A player-facing option: one outgoing edge of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub target: NodeId,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Choice {
    pub fn new(id: &str, text: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            target: NodeId::from(target),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The authored progress increment, if any. When several are present
    /// the last one applies.
    pub fn progress_delta(&self) -> Option<u32> {
        self.effects.iter().rev().find_map(|effect| match effect {
            Effect::ProgressDelta(delta) => Some(*delta),
            Effect::SetVariable { .. } => None,
        })
    }
}
