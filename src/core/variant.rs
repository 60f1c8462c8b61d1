//! Variant selection: which graph (or which canned text) a persona gets
//! for a context.
//!
//! Picking the persona itself is somebody else's job. This module only
//! takes the (context, variant) pair it is handed and walks the fallback
//! chain: the exact graph, then an optional baseline variant, then plain
//! fallback lines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::core::catalog::Catalog;
use crate::core::config::{CatalogConfig, ConfigError};
use crate::schema::graph::NarrativeGraph;

/// Key used for the line returned when no mood-specific line exists.
pub const DEFAULT_LINE: &str = "default";

/// Canned lines used when no graph is authored for a request.
///
/// Each set maps a mood (`anxiety`, `joy`, ...) to a line and should carry
/// a `default` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackText {
    #[serde(default)]
    pub generic: BTreeMap<String, String>,
    #[serde(default)]
    pub variants: BTreeMap<String, BTreeMap<String, String>>,
}

const GENERIC_LINES: &[(&str, &str)] = &[
    ("default", "I'm here with you. Tell me a little more about what's on your mind."),
    ("anxiety", "That sounds like a lot to hold. Let's take it one breath at a time."),
    ("sadness", "It's okay to feel this. We can sit with it together."),
    ("joy", "I'm glad to hear that. What's bringing you this lightness?"),
];

const VARIANT_LINES: &[(&str, &[(&str, &str)])] = &[
    (
        "compassionate_friend",
        &[
            ("default", "You're not alone in this. I'm right here."),
            ("anxiety", "I can feel the weight of what you're carrying. Let's sit with this together and find some gentle ways forward."),
            ("sadness", "Your sadness is valid and important. I'm here to hold space for whatever you're feeling."),
            ("joy", "I love seeing this lighter side of you! Tell me more about what's bringing you this happiness."),
        ],
    ),
    (
        "resilient_explorer",
        &[
            ("default", "This challenge is actually an opportunity. What would one small step look like?"),
            ("anxiety", "This anxiety is actually your growth edge calling! What would it look like to lean into this discomfort with curiosity?"),
            ("frustration", "I hear the fire in your voice - that's your inner strength wanting to break through. Let's channel this energy!"),
            ("excitement", "Yes! I can feel your enthusiasm. This is exactly the energy that creates breakthroughs!"),
        ],
    ),
    (
        "wise_detective",
        &[
            ("default", "I'm noticing a pattern here. What's really going on beneath the surface?"),
            ("confusion", "There's wisdom in your confusion - it's pointing to something important. Let's investigate what your psyche is trying to show you."),
        ],
    ),
];

fn to_lines(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(mood, line)| (mood.to_string(), line.to_string()))
        .collect()
}

impl Default for FallbackText {
    fn default() -> Self {
        Self {
            generic: to_lines(GENERIC_LINES),
            variants: VARIANT_LINES
                .iter()
                .map(|(variant, lines)| (variant.to_string(), to_lines(lines)))
                .collect(),
        }
    }
}

impl FallbackText {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The line set for a variant, or the generic set if it has none.
    pub fn lines_for(&self, variant: &str) -> &BTreeMap<String, String> {
        self.variants.get(variant).unwrap_or(&self.generic)
    }
}

/// A set of fallback lines for one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackLines {
    pub variant: String,
    pub lines: BTreeMap<String, String>,
}

impl FallbackLines {
    /// The line for `mood`, falling back to the `default` line.
    pub fn line(&self, mood: &str) -> Option<&str> {
        self.lines
            .get(mood)
            .or_else(|| self.lines.get(DEFAULT_LINE))
            .map(String::as_str)
    }
}

/// The outcome of resolving a (context, variant) request.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The exact graph that was asked for.
    Graph(Arc<NarrativeGraph>),
    /// The baseline variant's graph for the same context.
    Baseline(Arc<NarrativeGraph>),
    /// No graph at all; only canned lines.
    Fallback(FallbackLines),
}

impl Resolution {
    pub fn graph(&self) -> Option<&Arc<NarrativeGraph>> {
        match self {
            Self::Graph(g) | Self::Baseline(g) => Some(g),
            Self::Fallback(_) => None,
        }
    }
}

/// Resolves requests against a catalog. Borrowing the catalog keeps the
/// selector cheap to build per request.
pub struct VariantSelector<'c> {
    catalog: &'c Catalog,
    baseline: Option<String>,
    fallback: FallbackText,
}

impl<'c> VariantSelector<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            baseline: None,
            fallback: FallbackText::default(),
        }
    }

    /// Selector settings from a config: baseline variant and fallback table.
    pub fn from_config(catalog: &'c Catalog, config: &CatalogConfig) -> Result<Self, ConfigError> {
        let fallback = match config.fallback_path {
            Some(ref path) => FallbackText::load_from_ron(path)?,
            None => FallbackText::default(),
        };
        Ok(Self {
            catalog,
            baseline: config.baseline_variant.clone(),
            fallback,
        })
    }

    pub fn with_baseline(mut self, variant: &str) -> Self {
        self.baseline = Some(variant.to_string());
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackText) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn resolve(&self, context: &str, variant: &str) -> Resolution {
        if let Some(graph) = self.catalog.get_graph(context, variant) {
            return Resolution::Graph(graph);
        }

        if let Some(ref baseline) = self.baseline {
            if baseline != variant {
                if let Some(graph) = self.catalog.get_graph(context, baseline) {
                    warn!(context, variant, baseline = %baseline, "no graph for variant, using baseline");
                    return Resolution::Baseline(graph);
                }
            }
        }

        warn!(context, variant, "no graph for variant, using fallback text");
        Resolution::Fallback(FallbackLines {
            variant: variant.to_string(),
            lines: self.fallback.lines_for(variant).clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::choice::Choice;
    use crate::schema::graph::GraphKey;
    use crate::schema::node::{Node, NodeKind};

    fn catalog() -> Catalog {
        let g = |variant: &str| {
            NarrativeGraph::new(
                GraphKey::new("emotion", variant),
                "a",
                &["b"],
                vec![
                    Node::new("a", NodeKind::Dialogue, "Hi.")
                        .with_choice(Choice::new("c", "Hi", "b")),
                    Node::new("b", NodeKind::Completion, "Bye."),
                ],
            )
        };
        let catalog = Catalog::builder()
            .with_graphs(vec![g("compassionate_friend"), g("wise_detective")])
            .build();
        catalog.initialize().unwrap();
        catalog
    }

    #[test]
    fn exact_graph_wins() {
        let catalog = catalog();
        let selector = VariantSelector::new(&catalog).with_baseline("compassionate_friend");
        match selector.resolve("emotion", "wise_detective") {
            Resolution::Graph(g) => assert_eq!(g.variant(), "wise_detective"),
            other => panic!("expected exact graph, got {other:?}"),
        }
    }

    #[test]
    fn baseline_used_when_variant_missing() {
        let catalog = catalog();
        let selector = VariantSelector::new(&catalog).with_baseline("compassionate_friend");
        match selector.resolve("emotion", "resilient_explorer") {
            Resolution::Baseline(g) => assert_eq!(g.variant(), "compassionate_friend"),
            other => panic!("expected baseline graph, got {other:?}"),
        }
    }

    #[test]
    fn fallback_text_without_baseline() {
        let catalog = catalog();
        let selector = VariantSelector::new(&catalog);
        let resolution = selector.resolve("emotion", "resilient_explorer");
        assert!(resolution.graph().is_none());
        match resolution {
            Resolution::Fallback(lines) => {
                assert_eq!(lines.variant, "resilient_explorer");
                assert!(lines.line("anxiety").unwrap().contains("growth edge"));
                assert!(lines.line("boredom").unwrap().contains("opportunity"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn unknown_context_uses_generic_lines_for_unknown_variant() {
        let catalog = catalog();
        let selector = VariantSelector::new(&catalog).with_baseline("compassionate_friend");
        match selector.resolve("dreams", "mystery_guest") {
            Resolution::Fallback(lines) => {
                assert_eq!(
                    lines.line("joy"),
                    FallbackText::default().generic.get("joy").map(String::as_str)
                );
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn every_builtin_line_set_has_default() {
        let text = FallbackText::default();
        assert!(text.generic.contains_key(DEFAULT_LINE));
        for (variant, lines) in &text.variants {
            assert!(lines.contains_key(DEFAULT_LINE), "{variant} has no default line");
        }
    }
}
