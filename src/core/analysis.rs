//! Authoring checks that go beyond hard invariants: reachability lints and
//! seeded random walkthroughs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fmt;

use crate::core::engine::{self, TraversalError};
use crate::core::session::SessionState;
use crate::schema::graph::NarrativeGraph;
use crate::schema::node::NodeId;

/// Node IDs reachable from the start node, following choices and `next`.
/// Dangling references are skipped.
pub fn reachable_nodes(graph: &NarrativeGraph) -> FxHashSet<NodeId> {
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::new();
    if graph.node(&graph.start).is_some() {
        seen.insert(graph.start.clone());
        queue.push_back(&graph.start);
    }

    while let Some(id) = queue.pop_front() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        for target in node.successors() {
            if graph.node(target).is_some() && seen.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }
    seen
}

/// A content smell that does not stop the catalog from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintWarning {
    /// No path from the start node leads here.
    Unreachable(NodeId),
    /// None of the completion nodes can be reached from the start.
    NoReachableCompletion,
    /// A reachable leaf that is not a completion node; sessions get stuck here.
    DeadEnd(NodeId),
    /// A completion node that still routes onward.
    CompletionHasExits(NodeId),
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(id) => write!(f, "node '{id}' is unreachable from the start node"),
            Self::NoReachableCompletion => f.write_str("no completion node is reachable"),
            Self::DeadEnd(id) => write!(f, "node '{id}' is a dead end but not a completion node"),
            Self::CompletionHasExits(id) => {
                write!(f, "completion node '{id}' still has outgoing edges")
            }
        }
    }
}

/// Collect authoring warnings for a graph, sorted by node ID within
/// each kind.
pub fn lint_graph(graph: &NarrativeGraph) -> Vec<LintWarning> {
    let reachable = reachable_nodes(graph);
    let mut warnings = Vec::new();

    if !graph.completion.iter().any(|id| reachable.contains(id)) {
        warnings.push(LintWarning::NoReachableCompletion);
    }

    for id in graph.sorted_node_ids() {
        if !reachable.contains(id) {
            warnings.push(LintWarning::Unreachable(id.clone()));
        }
    }

    for id in graph.sorted_node_ids() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let is_completion = graph.is_completion(id);
        if node.is_leaf() && !is_completion && reachable.contains(id) {
            warnings.push(LintWarning::DeadEnd(id.clone()));
        }
        if !node.is_leaf() && is_completion {
            warnings.push(LintWarning::CompletionHasExits(id.clone()));
        }
    }

    warnings
}

/// How a random walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    DeadEnd,
    StepLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkReport {
    pub outcome: WalkOutcome,
    pub steps: usize,
    pub final_state: SessionState,
}

/// Play the graph from the start, picking uniformly among the available
/// choices at each node. The same seed always yields the same walk.
pub fn random_walk(
    graph: &NarrativeGraph,
    seed: u64,
    max_steps: usize,
) -> Result<WalkReport, TraversalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = engine::begin(graph);
    let mut steps = 0;

    let outcome = loop {
        if engine::is_complete(graph, &state) {
            break WalkOutcome::Completed;
        }
        if steps >= max_steps {
            break WalkOutcome::StepLimit;
        }

        let node = engine::current_node(graph, &state)?;
        state = if let Some(choice) = node.choices.choose(&mut rng) {
            engine::apply_choice(graph, &state, &choice.id)?
        } else if node.next.is_some() {
            engine::advance(graph, &state)?
        } else {
            break WalkOutcome::DeadEnd;
        };
        steps += 1;
    };

    Ok(WalkReport {
        outcome,
        steps,
        final_state: state,
    })
}

/// Aggregate results over many seeded walks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkSummary {
    pub runs: usize,
    pub completed: usize,
    pub dead_ends: usize,
    pub step_limited: usize,
    pub total_steps: usize,
    pub total_progress: u64,
    /// Every node visited by at least one walk, start node included.
    pub covered: FxHashSet<NodeId>,
}

impl WalkSummary {
    /// Fold one walk into the totals. Totals saturate like the session
    /// progress score they add up.
    pub fn record(&mut self, report: WalkReport) {
        match report.outcome {
            WalkOutcome::Completed => self.completed += 1,
            WalkOutcome::DeadEnd => self.dead_ends += 1,
            WalkOutcome::StepLimit => self.step_limited += 1,
        }
        self.total_steps = self.total_steps.saturating_add(report.steps);
        self.total_progress = self
            .total_progress
            .saturating_add(report.final_state.progress_score);
        self.covered.extend(report.final_state.visited);
    }

    pub fn average_progress(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_progress as f64 / self.runs as f64
        }
    }

    pub fn average_steps(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_steps as f64 / self.runs as f64
        }
    }
}

/// Run `runs` walks with seeds `seed`, `seed + 1`, ...
pub fn summarize_walks(
    graph: &NarrativeGraph,
    runs: usize,
    seed: u64,
    max_steps: usize,
) -> Result<WalkSummary, TraversalError> {
    let mut summary = WalkSummary {
        runs,
        ..WalkSummary::default()
    };
    summary.covered.insert(graph.start.clone());

    for i in 0..runs {
        let report = random_walk(graph, seed.wrapping_add(i as u64), max_steps)?;
        summary.record(report);
    }

    Ok(summary)
}
