//! Playthrough: the controller that owns one session's state.
//!
//! Presentation code holds a `Playthrough`, renders `current_node()`, and
//! feeds user input back through `choose`/`advance`. Because the engine
//! returns a new state per step, undo is just popping the history.

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

use crate::core::engine::{self, TraversalError};
use crate::core::session::SessionState;
use crate::schema::choice::Choice;
use crate::schema::graph::NarrativeGraph;
use crate::schema::node::Node;

/// How many earlier states a playthrough keeps for undo. Older states are
/// dropped first, so a session looping through a graph stays bounded.
pub const MAX_UNDO_DEPTH: usize = 128;

#[derive(Debug, Clone)]
pub struct Playthrough {
    graph: Arc<NarrativeGraph>,
    state: SessionState,
    history: VecDeque<SessionState>,
}

impl Playthrough {
    /// Start at the graph's start node.
    pub fn new(graph: Arc<NarrativeGraph>) -> Self {
        let state = engine::begin(&graph);
        Self {
            graph,
            state,
            history: VecDeque::new(),
        }
    }

    /// Pick up a session restored from storage. The state is checked
    /// against the graph so a stale session fails here, not mid-play.
    pub fn resume(graph: Arc<NarrativeGraph>, state: SessionState) -> Result<Self, TraversalError> {
        engine::current_node(&graph, &state)?;
        Ok(Self {
            graph,
            state,
            history: VecDeque::new(),
        })
    }

    pub fn graph(&self) -> &Arc<NarrativeGraph> {
        &self.graph
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Consume the playthrough, keeping only its state for persistence.
    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn current_node(&self) -> Result<&Node, TraversalError> {
        engine::current_node(&self.graph, &self.state)
    }

    pub fn choices(&self) -> Result<&[Choice], TraversalError> {
        engine::available_choices(&self.graph, &self.state)
    }

    pub fn is_complete(&self) -> bool {
        engine::is_complete(&self.graph, &self.state)
    }

    /// Number of steps that can be undone, at most [`MAX_UNDO_DEPTH`].
    pub fn steps(&self) -> usize {
        self.history.len()
    }

    pub fn choose(&mut self, choice_id: &str) -> Result<&Node, TraversalError> {
        let next = engine::apply_choice(&self.graph, &self.state, choice_id)?;
        self.commit(next)
    }

    pub fn advance(&mut self) -> Result<&Node, TraversalError> {
        let next = engine::advance(&self.graph, &self.state)?;
        self.commit(next)
    }

    /// Step back to the previous state. Returns false at the beginning.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    /// Throw away all progress and return to the start node.
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = engine::begin(&self.graph);
    }

    fn commit(&mut self, next: SessionState) -> Result<&Node, TraversalError> {
        let previous = std::mem::replace(&mut self.state, next);
        if self.history.len() == MAX_UNDO_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(previous);
        if self.is_complete() {
            info!(
                graph = %self.graph.key,
                progress = self.state.progress_score,
                "chamber completed"
            );
        }
        self.current_node()
    }
}
