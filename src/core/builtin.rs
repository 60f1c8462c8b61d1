//! Chambers that ship with the crate, compiled into the binary.

use crate::core::catalog::CatalogError;
use crate::core::content::{parse_ron, ContentSource};
use crate::schema::graph::NarrativeGraph;

pub const EMOTION_CHAMBERS: &str = include_str!("../../content/chambers/emotion.ron");
pub const GROWTH_CHAMBERS: &str = include_str!("../../content/chambers/growth.ron");

const FILES: &[(&str, &str)] = &[
    ("builtin:emotion", EMOTION_CHAMBERS),
    ("builtin:growth", GROWTH_CHAMBERS),
];

/// The embedded chamber files, as a content source.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl ContentSource for BuiltinSource {
    fn describe(&self) -> String {
        format!("builtin chambers ({})", file_names().collect::<Vec<_>>().join(", "))
    }

    fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError> {
        let mut graphs = Vec::new();
        for (_, text) in FILES {
            graphs.extend(parse_ron(text)?);
        }
        Ok(graphs)
    }
}

/// Names of the embedded files, for tooling.
pub fn file_names() -> impl Iterator<Item = &'static str> {
    FILES.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::{lint_graph, summarize_walks};
    use crate::core::catalog::Catalog;

    #[test]
    fn builtin_chambers_pass_validation() {
        let catalog = Catalog::builder().builtin().build();
        catalog.initialize().unwrap();
        assert!(catalog.list_graphs().len() >= 4);
        for variant in ["compassionate_friend", "resilient_explorer", "wise_detective"] {
            assert!(
                catalog.get_graph("emotion", variant).is_some(),
                "missing emotion/{variant}"
            );
        }
        assert!(catalog
            .get_graph("growth", "resilient_explorer")
            .is_some());
    }

    #[test]
    fn builtin_chambers_lint_clean() {
        for graph in BuiltinSource.load().unwrap() {
            let warnings = lint_graph(&graph);
            assert!(warnings.is_empty(), "{}: {:?}", graph.key, warnings);
        }
    }

    #[test]
    fn builtin_chambers_always_finish() {
        for graph in BuiltinSource.load().unwrap() {
            let summary = summarize_walks(&graph, 25, 11, 200).unwrap();
            assert_eq!(summary.completed, 25, "{} did not always complete", graph.key);
        }
    }

    #[test]
    fn file_names_listed() {
        assert_eq!(file_names().count(), 2);
        assert_eq!(
            BuiltinSource.describe(),
            "builtin chambers (builtin:emotion, builtin:growth)"
        );
    }
}
