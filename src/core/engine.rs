//! The narrative engine: pure transitions over (graph, session, input).
//!
//! Nothing here holds state. Every function takes the graph and the
//! current session by reference and returns a new session, so callers can
//! keep old states around for replay or undo and can call in from any
//! number of threads.

use thiserror::Error;
use tracing::debug;

use crate::core::session::SessionState;
use crate::schema::choice::{Choice, Effect};
use crate::schema::graph::{GraphKey, NarrativeGraph};
use crate::schema::node::{Node, NodeId};

/// Progress added for a transition that does not author its own.
pub const DEFAULT_PROGRESS_INCREMENT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("node '{node}' does not exist in graph {graph}")]
    UnknownNode { graph: GraphKey, node: NodeId },
    #[error("node '{node}' has no choice '{choice}'")]
    UnknownChoice { node: NodeId, choice: String },
    #[error("node '{node}' has no next node to advance to")]
    NoSuccessor { node: NodeId },
}

/// Start a session at the graph's start node.
pub fn begin(graph: &NarrativeGraph) -> SessionState {
    SessionState::begin(graph)
}

/// The node the session is sitting on.
pub fn current_node<'g>(
    graph: &'g NarrativeGraph,
    state: &SessionState,
) -> Result<&'g Node, TraversalError> {
    graph
        .node(&state.current_node_id)
        .ok_or_else(|| TraversalError::UnknownNode {
            graph: graph.key.clone(),
            node: state.current_node_id.clone(),
        })
}

/// The choices offered at the session's current node.
pub fn available_choices<'g>(
    graph: &'g NarrativeGraph,
    state: &SessionState,
) -> Result<&'g [Choice], TraversalError> {
    current_node(graph, state).map(|node| node.choices.as_slice())
}

/// Take the choice `choice_id` from the current node.
///
/// Effects are applied in order on a copy of the session's variables, the
/// target is recorded as visited, and progress grows by the choice's
/// authored delta or [`DEFAULT_PROGRESS_INCREMENT`].
pub fn apply_choice(
    graph: &NarrativeGraph,
    state: &SessionState,
    choice_id: &str,
) -> Result<SessionState, TraversalError> {
    let node = current_node(graph, state)?;
    let choice = node
        .choice(choice_id)
        .ok_or_else(|| TraversalError::UnknownChoice {
            node: node.id.clone(),
            choice: choice_id.to_string(),
        })?;

    let increment = choice
        .progress_delta()
        .unwrap_or(DEFAULT_PROGRESS_INCREMENT);
    let next = transition(state, &choice.target, &choice.effects, increment);

    debug!(
        graph = %graph.key,
        from = %node.id,
        to = %next.current_node_id,
        choice = choice_id,
        progress = next.progress_score,
        "applied choice"
    );
    Ok(next)
}

/// Follow the current node's `next` successor.
///
/// Fails with `NoSuccessor` on a node that has no `next`: either a
/// terminal leaf or a node that waits for a choice. Check
/// [`is_complete`] before calling this.
pub fn advance(graph: &NarrativeGraph, state: &SessionState) -> Result<SessionState, TraversalError> {
    let node = current_node(graph, state)?;
    let target = match (&node.next, node.has_choices()) {
        (Some(next), false) => next,
        _ => {
            return Err(TraversalError::NoSuccessor {
                node: node.id.clone(),
            })
        }
    };

    let next = transition(state, target, &[], DEFAULT_PROGRESS_INCREMENT);
    debug!(graph = %graph.key, from = %node.id, to = %target, "advanced");
    Ok(next)
}

/// True once the session sits on one of the graph's completion nodes.
pub fn is_complete(graph: &NarrativeGraph, state: &SessionState) -> bool {
    graph.is_completion(&state.current_node_id)
}

fn transition(
    state: &SessionState,
    target: &NodeId,
    effects: &[Effect],
    increment: u32,
) -> SessionState {
    let mut variables = state.variables.clone();
    for effect in effects {
        match effect {
            Effect::SetVariable { key, value } => {
                variables.insert(key.clone(), value.clone());
            }
            // Already folded into `increment`.
            Effect::ProgressDelta(_) => {}
        }
    }

    let mut visited = state.visited.clone();
    if visited.last() != Some(target) {
        visited.push(target.clone());
    }

    SessionState {
        current_node_id: target.clone(),
        variables,
        visited,
        progress_score: state.progress_score.saturating_add(u64::from(increment)),
    }
}
