//! Content sources: where authored chamber graphs come from.
//!
//! The authored format is RON: a list of `Chamber(...)` entries. Choice
//! effects are written as a plain map (`{"progress": 25, "mood": "calm"}`)
//! and converted into typed [`Effect`]s while loading.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::catalog::CatalogError;
use crate::core::validate::Violation;
use crate::schema::choice::{Choice, Effect};
use crate::schema::graph::{GraphKey, NarrativeGraph};
use crate::schema::node::{Node, NodeId, NodeKind};
use crate::schema::value::Value;

/// Effect-map key that adjusts the progress score instead of
/// setting a variable.
pub const PROGRESS_KEY: &str = "progress";

/// Anything that can hand the catalog a batch of graphs at build time.
pub trait ContentSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError>;
}

/// Graphs already built in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    graphs: Vec<NarrativeGraph>,
}

impl InMemorySource {
    pub fn new(graphs: Vec<NarrativeGraph>) -> Self {
        Self { graphs }
    }
}

impl ContentSource for InMemorySource {
    fn describe(&self) -> String {
        format!("{} in-memory graphs", self.graphs.len())
    }

    fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError> {
        Ok(self.graphs.clone())
    }
}

/// A RON document held as a string, e.g. embedded with `include_str!`.
#[derive(Debug, Clone)]
pub struct RonStrSource {
    name: String,
    text: String,
}

impl RonStrSource {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
        }
    }
}

impl ContentSource for RonStrSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError> {
        parse_ron(&self.text)
    }
}

/// A single RON file, or every `.ron` file under a directory (recursively,
/// in path order).
#[derive(Debug, Clone)]
pub struct RonPathSource {
    path: PathBuf,
}

impl RonPathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentSource for RonPathSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError> {
        if self.path.is_dir() {
            let mut files = Vec::new();
            collect_ron_files(&self.path, &mut files)?;
            files.sort();
            let mut graphs = Vec::new();
            for file in files {
                graphs.extend(load_from_ron(&file)?);
            }
            Ok(graphs)
        } else {
            load_from_ron(&self.path)
        }
    }
}

fn collect_ron_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_ron_files(&path, out)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            out.push(path);
        }
    }
    Ok(())
}

// RON deserialization helpers - the authored format keeps nodes in a list
// and effects in a loose map, so it goes through intermediate structs.

#[derive(Debug, Deserialize)]
#[serde(rename = "Chamber")]
struct RonChamber {
    context: String,
    variant: String,
    start: String,
    completion: Vec<String>,
    nodes: Vec<RonNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Node")]
struct RonNode {
    id: String,
    kind: NodeKind,
    text: String,
    #[serde(default)]
    choices: Vec<RonChoice>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Choice")]
struct RonChoice {
    id: String,
    text: String,
    target: String,
    #[serde(default)]
    effects: BTreeMap<String, Value>,
}

/// Load chamber graphs from a RON file.
pub fn load_from_ron(path: &Path) -> Result<Vec<NarrativeGraph>, CatalogError> {
    let contents = std::fs::read_to_string(path)?;
    let graphs = parse_ron(&contents)?;
    debug!(path = %path.display(), graphs = graphs.len(), "loaded chamber file");
    Ok(graphs)
}

/// Parse chamber graphs from a RON string.
///
/// Only conversion problems are reported here (duplicate node IDs,
/// malformed progress effects). Routing invariants are left to the
/// catalog's validation pass.
pub fn parse_ron(input: &str) -> Result<Vec<NarrativeGraph>, CatalogError> {
    let raw: Vec<RonChamber> = ron::from_str(input)?;
    raw.into_iter().map(convert_chamber).collect()
}

fn convert_chamber(chamber: RonChamber) -> Result<NarrativeGraph, CatalogError> {
    let key = GraphKey {
        context: chamber.context,
        variant: chamber.variant,
    };
    let invalid = |violation: Violation| CatalogError::InvalidGraph {
        graph: key.clone(),
        violation,
    };

    let mut nodes = rustc_hash::FxHashMap::default();
    for raw in chamber.nodes {
        let id = NodeId::from(raw.id);
        let mut choices = Vec::with_capacity(raw.choices.len());
        for choice in raw.choices {
            let effects = convert_effects(choice.effects).map_err(|reason| {
                invalid(Violation::InvalidEffect {
                    node: id.clone(),
                    choice: choice.id.clone(),
                    reason,
                })
            })?;
            choices.push(Choice {
                id: choice.id,
                text: choice.text,
                target: NodeId::from(choice.target),
                effects,
            });
        }

        let node = Node {
            id: id.clone(),
            kind: raw.kind,
            text: raw.text,
            choices,
            next: raw.next.map(NodeId::from),
            metadata: raw.metadata,
        };
        if nodes.insert(id.clone(), node).is_some() {
            return Err(invalid(Violation::DuplicateNode(id)));
        }
    }

    Ok(NarrativeGraph {
        key,
        nodes,
        start: NodeId::from(chamber.start),
        completion: chamber.completion.into_iter().map(NodeId::from).collect(),
    })
}

/// Turn a loose effect map into typed effects. The progress entry, if any,
/// comes first; variables follow in key order.
fn convert_effects(raw: BTreeMap<String, Value>) -> Result<Vec<Effect>, String> {
    let mut effects = Vec::with_capacity(raw.len());
    let mut variables = Vec::new();

    for (key, value) in raw {
        if key == PROGRESS_KEY {
            let delta = value
                .as_int()
                .ok_or_else(|| format!("progress must be an integer, got '{value}'"))?;
            let delta = u32::try_from(delta)
                .map_err(|_| format!("progress must be between 0 and {}, got {delta}", u32::MAX))?;
            effects.push(Effect::ProgressDelta(delta));
        } else {
            variables.push(Effect::SetVariable { key, value });
        }
    }

    effects.extend(variables);
    Ok(effects)
}
