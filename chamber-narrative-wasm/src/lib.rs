//! WASM bindings for chamber-narrative: drives chamber playthroughs from a
//! web front end. Everything crosses the boundary as JSON strings.

use std::sync::Arc;
use wasm_bindgen::prelude::*;

use chamber_narrative::core::catalog::Catalog;
use chamber_narrative::core::playthrough::Playthrough;
use chamber_narrative::core::session::SessionState;
use chamber_narrative::core::variant::{Resolution, VariantSelector};
use chamber_narrative::schema::graph::NarrativeGraph;
use chamber_narrative::schema::node::Node;

const BASELINE_VARIANT: &str = "compassionate_friend";

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ChamberInfo {
    context: String,
    variant: String,
    nodes: usize,
}

#[derive(serde::Serialize)]
struct ChoiceView<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeView<'a> {
    id: &'a str,
    kind: &'static str,
    text: &'a str,
    choices: Vec<ChoiceView<'a>>,
    has_next: bool,
    is_complete: bool,
    progress_score: u64,
}

impl<'a> NodeView<'a> {
    fn new(node: &'a Node, playthrough: &Playthrough) -> Self {
        Self {
            id: node.id.as_str(),
            kind: node.kind.name(),
            text: &node.text,
            choices: node
                .choices
                .iter()
                .map(|c| ChoiceView {
                    id: &c.id,
                    text: &c.text,
                })
                .collect(),
            has_next: node.next.is_some(),
            is_complete: playthrough.is_complete(),
            progress_score: playthrough.state().progress_score,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn js_error(message: String) -> JsError {
    JsError::new(&message)
}

// ---------------------------------------------------------------------------
// ChamberLibrary - owns the catalog that sessions are opened from
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ChamberLibrary {
    catalog: Arc<Catalog>,
}

impl ChamberLibrary {
    fn builtin() -> Result<Self, String> {
        let catalog = Catalog::builder().builtin().build();
        catalog
            .initialize()
            .map_err(|e| format!("Catalog error: {e}"))?;
        Ok(Self {
            catalog: Arc::new(catalog),
        })
    }

    /// The graph served for (context, variant). Opening and restoring both
    /// go through here, so a session saved from a baseline-served chamber
    /// comes back to the same graph under the caller's own key.
    fn resolve(&self, context: &str, variant: &str) -> Result<Arc<NarrativeGraph>, String> {
        let selector = VariantSelector::new(&self.catalog).with_baseline(BASELINE_VARIANT);
        match selector.resolve(context, variant) {
            Resolution::Graph(graph) | Resolution::Baseline(graph) => Ok(graph),
            Resolution::Fallback(_) => Err(format!("No chamber for {context}/{variant}")),
        }
    }

    fn open_session(&self, context: &str, variant: &str) -> Result<ChamberSession, String> {
        let graph = self.resolve(context, variant)?;
        Ok(ChamberSession {
            playthrough: Playthrough::new(graph),
        })
    }

    fn restore_session(
        &self,
        context: &str,
        variant: &str,
        state_json: &str,
    ) -> Result<ChamberSession, String> {
        let state: SessionState =
            serde_json::from_str(state_json).map_err(|e| format!("Invalid state JSON: {e}"))?;
        let graph = self.resolve(context, variant)?;
        let playthrough = Playthrough::resume(graph, state).map_err(|e| e.to_string())?;
        Ok(ChamberSession { playthrough })
    }

    fn chambers(&self) -> Vec<ChamberInfo> {
        self.catalog
            .list_graphs()
            .iter()
            .map(|g| ChamberInfo {
                context: g.context().to_string(),
                variant: g.variant().to_string(),
                nodes: g.node_count(),
            })
            .collect()
    }
}

#[wasm_bindgen]
impl ChamberLibrary {
    /// Loads the built-in chambers.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ChamberLibrary, JsError> {
        Self::builtin().map_err(js_error)
    }

    pub fn available_chambers(&self) -> Result<String, JsError> {
        to_json(&self.chambers())
    }

    /// Opens the chamber for (context, variant). A missing variant falls
    /// back to the baseline variant for the same context.
    pub fn open(&self, context: &str, variant: &str) -> Result<ChamberSession, JsError> {
        self.open_session(context, variant).map_err(js_error)
    }

    /// Resumes a session from JSON produced by `ChamberSession::state_json`,
    /// using the same (context, variant) it was opened with.
    pub fn restore(
        &self,
        context: &str,
        variant: &str,
        state_json: &str,
    ) -> Result<ChamberSession, JsError> {
        self.restore_session(context, variant, state_json)
            .map_err(js_error)
    }
}

// ---------------------------------------------------------------------------
// ChamberSession - the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ChamberSession {
    playthrough: Playthrough,
}

#[wasm_bindgen]
impl ChamberSession {
    /// Shorthand for `new ChamberLibrary().open(context, variant)`.
    #[wasm_bindgen(constructor)]
    pub fn new(context: &str, variant: &str) -> Result<ChamberSession, JsError> {
        ChamberLibrary::new()?.open(context, variant)
    }

    /// Shorthand for `new ChamberLibrary().restore(context, variant, json)`.
    pub fn restore(context: &str, variant: &str, state_json: &str) -> Result<ChamberSession, JsError> {
        ChamberLibrary::new()?.restore(context, variant, state_json)
    }

    pub fn available_chambers() -> Result<String, JsError> {
        ChamberLibrary::new()?.available_chambers()
    }

    /// The chamber actually being played, as `context/variant`.
    pub fn chamber(&self) -> String {
        self.playthrough.graph().key.to_string()
    }

    pub fn current_node(&self) -> Result<String, JsError> {
        let node = self
            .playthrough
            .current_node()
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&NodeView::new(node, &self.playthrough))
    }

    pub fn choose(&mut self, choice_id: &str) -> Result<String, JsError> {
        self.playthrough
            .choose(choice_id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.current_node()
    }

    pub fn advance(&mut self) -> Result<String, JsError> {
        self.playthrough
            .advance()
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.current_node()
    }

    pub fn undo(&mut self) -> bool {
        self.playthrough.undo()
    }

    pub fn is_complete(&self) -> bool {
        self.playthrough.is_complete()
    }

    pub fn state_json(&self) -> Result<String, JsError> {
        to_json(self.playthrough.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_narrative::schema::node::NodeId;

    #[test]
    fn baseline_served_session_restores_under_same_key() {
        let library = ChamberLibrary::builtin().unwrap();
        let mut session = library.open_session("emotion", "mystery_guest").unwrap();
        assert_eq!(session.chamber(), "emotion/compassionate_friend");

        session.playthrough.advance().unwrap();
        session.playthrough.choose("okay").unwrap();
        let saved = serde_json::to_string(session.playthrough.state()).unwrap();

        let restored = library
            .restore_session("emotion", "mystery_guest", &saved)
            .unwrap();
        assert_eq!(restored.chamber(), "emotion/compassionate_friend");
        assert_eq!(restored.playthrough.state(), session.playthrough.state());
        assert_eq!(
            restored.playthrough.state().current_node_id,
            NodeId::from("gratitude")
        );
    }

    #[test]
    fn exact_chamber_restores_and_continues() {
        let library = ChamberLibrary::builtin().unwrap();
        let mut session = library.open_session("growth", "resilient_explorer").unwrap();
        session.playthrough.advance().unwrap();
        let saved = serde_json::to_string(session.playthrough.state()).unwrap();

        let mut restored = library
            .restore_session("growth", "resilient_explorer", &saved)
            .unwrap();
        assert_eq!(restored.chamber(), "growth/resilient_explorer");
        assert_eq!(restored.playthrough.state(), session.playthrough.state());
        assert!(!restored.playthrough.choices().unwrap().is_empty());
    }

    #[test]
    fn unknown_context_is_reported() {
        let library = ChamberLibrary::builtin().unwrap();
        let err = library.open_session("dreams", "wise_detective").err().unwrap();
        assert_eq!(err, "No chamber for dreams/wise_detective");
        assert!(library
            .restore_session("emotion", "wise_detective", "not json")
            .err()
            .unwrap()
            .starts_with("Invalid state JSON"));
    }

    #[test]
    fn libraries_do_not_share_catalogs() {
        let a = ChamberLibrary::builtin().unwrap();
        let b = ChamberLibrary::builtin().unwrap();
        assert!(!Arc::ptr_eq(&a.catalog, &b.catalog));
        assert_eq!(a.chambers().len(), b.chambers().len());
    }
}
