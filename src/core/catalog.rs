//! The narrative catalog: every authored chamber graph, keyed by
//! (context, variant).
//!
//! A catalog is constructed explicitly through [`Catalog::builder`] and
//! populated by [`Catalog::initialize`]. The first successful call loads
//! all sources, validates every graph, and publishes the finished registry
//! in one step. Until then lookups see an empty catalog, never a partial one.

use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::builtin::BuiltinSource;
use crate::core::config::CatalogConfig;
use crate::core::content::{ContentSource, InMemorySource, RonPathSource};
use crate::core::validate::{validate_graph, Violation};
use crate::schema::graph::{GraphKey, NarrativeGraph};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid graph {graph}: {violation}")]
    InvalidGraph { graph: GraphKey, violation: Violation },
    #[error("graph {0} is defined by more than one source")]
    DuplicateGraph(GraphKey),
    #[error("no graph for {0}")]
    GraphNotFound(GraphKey),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The published, read-only set of graphs.
#[derive(Debug, Default)]
struct Registry {
    graphs: Vec<Arc<NarrativeGraph>>,
    index: FxHashMap<GraphKey, usize>,
}

impl Registry {
    fn insert(&mut self, graph: NarrativeGraph) -> Result<(), CatalogError> {
        if self.index.contains_key(&graph.key) {
            return Err(CatalogError::DuplicateGraph(graph.key));
        }
        self.index.insert(graph.key.clone(), self.graphs.len());
        self.graphs.push(Arc::new(graph));
        Ok(())
    }
}

/// Registry of authored chamber graphs. Built via `Catalog::builder()`.
pub struct Catalog {
    sources: Vec<Box<dyn ContentSource>>,
    registry: OnceLock<Registry>,
    init_lock: Mutex<()>,
}

/// Builder for constructing a `Catalog`.
#[derive(Default)]
pub struct CatalogBuilder {
    sources: Vec<Box<dyn ContentSource>>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// A catalog over the sources named in a config. Not yet initialized.
    pub fn from_config(config: &CatalogConfig) -> Catalog {
        let mut builder = Catalog::builder();
        if config.include_builtin {
            builder = builder.builtin();
        }
        for dir in &config.content_dirs {
            builder = builder.content_path(dir.clone());
        }
        builder.build()
    }

    /// Populate the registry. Idempotent: after the first success this
    /// returns immediately. Concurrent first callers are serialized, and a
    /// failed build publishes nothing.
    pub fn initialize(&self) -> Result<(), CatalogError> {
        if self.registry.get().is_some() {
            return Ok(());
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.registry.get().is_some() {
            return Ok(());
        }

        let registry = self.build_registry()?;
        let count = registry.graphs.len();
        // Only ever set while holding `init_lock`, so this cannot already be full.
        let _ = self.registry.set(registry);
        info!(graphs = count, sources = self.sources.len(), "narrative catalog initialized");
        Ok(())
    }

    fn build_registry(&self) -> Result<Registry, CatalogError> {
        let mut registry = Registry::default();
        for source in &self.sources {
            let graphs = source.load()?;
            debug!(source = %source.describe(), graphs = graphs.len(), "loaded content source");
            for graph in graphs {
                validate_graph(&graph)?;
                registry.insert(graph)?;
            }
        }
        Ok(registry)
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.get().is_some()
    }

    /// Look up the graph for a (context, variant) pair. `None` means no
    /// authored content exists for it (or the catalog is not initialized).
    pub fn get_graph(&self, context: &str, variant: &str) -> Option<Arc<NarrativeGraph>> {
        self.get(&GraphKey::new(context, variant))
    }

    pub fn get(&self, key: &GraphKey) -> Option<Arc<NarrativeGraph>> {
        let registry = self.registry.get()?;
        registry
            .index
            .get(key)
            .map(|&i| Arc::clone(&registry.graphs[i]))
    }

    /// Like `get_graph`, for callers that want a `?`-able error.
    pub fn require_graph(
        &self,
        context: &str,
        variant: &str,
    ) -> Result<Arc<NarrativeGraph>, CatalogError> {
        self.get_graph(context, variant)
            .ok_or_else(|| CatalogError::GraphNotFound(GraphKey::new(context, variant)))
    }

    /// All graphs, in the order their sources produced them.
    pub fn list_graphs(&self) -> &[Arc<NarrativeGraph>] {
        self.registry
            .get()
            .map(|r| r.graphs.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct context IDs, in first-seen order.
    pub fn contexts(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for graph in self.list_graphs() {
            if !seen.contains(&graph.context()) {
                seen.push(graph.context());
            }
        }
        seen
    }

    /// Variant IDs authored for one context.
    pub fn variants(&self, context: &str) -> Vec<&str> {
        self.list_graphs()
            .iter()
            .filter(|g| g.context() == context)
            .map(|g| g.variant())
            .collect()
    }
}

impl CatalogBuilder {
    /// Add graphs that are already in memory.
    pub fn with_graphs(mut self, graphs: Vec<NarrativeGraph>) -> Self {
        self.sources.push(Box::new(InMemorySource::new(graphs)));
        self
    }

    /// Add a RON file, or a directory of RON files.
    pub fn content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(Box::new(RonPathSource::new(path)));
        self
    }

    /// Add the chambers that ship with the crate.
    pub fn builtin(mut self) -> Self {
        self.sources.push(Box::new(BuiltinSource));
        self
    }

    pub fn source(mut self, source: Box<dyn ContentSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            sources: self.sources,
            registry: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::choice::Choice;
    use crate::schema::node::{Node, NodeId, NodeKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn graph(context: &str, variant: &str) -> NarrativeGraph {
        NarrativeGraph::new(
            GraphKey::new(context, variant),
            "a",
            &["b"],
            vec![
                Node::new("a", NodeKind::Dialogue, "Hello.")
                    .with_choice(Choice::new("c1", "Hi", "b")),
                Node::new("b", NodeKind::Completion, "Bye."),
            ],
        )
    }

    /// Counts how many times the catalog asked it for content.
    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    impl ContentSource for CountingSource {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn load(&self) -> Result<Vec<NarrativeGraph>, CatalogError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![graph("emotion", "compassionate_friend")])
        }
    }

    #[test]
    fn empty_before_initialize() {
        let catalog = Catalog::builder()
            .with_graphs(vec![graph("emotion", "compassionate_friend")])
            .build();
        assert!(!catalog.is_initialized());
        assert!(catalog.list_graphs().is_empty());
        assert!(catalog.get_graph("emotion", "compassionate_friend").is_none());
    }

    #[test]
    fn lookup_after_initialize() {
        let catalog = Catalog::builder()
            .with_graphs(vec![
                graph("emotion", "compassionate_friend"),
                graph("emotion", "wise_detective"),
                graph("growth", "resilient_explorer"),
            ])
            .build();
        catalog.initialize().unwrap();

        let g = catalog.get_graph("emotion", "wise_detective").unwrap();
        assert_eq!(g.variant(), "wise_detective");
        assert!(catalog.get_graph("emotion", "unknown_variant").is_none());
        assert_eq!(catalog.contexts(), vec!["emotion", "growth"]);
        assert_eq!(
            catalog.variants("emotion"),
            vec!["compassionate_friend", "wise_detective"]
        );
    }

    #[test]
    fn list_preserves_insertion_order() {
        let catalog = Catalog::builder()
            .with_graphs(vec![graph("b", "x"), graph("a", "y")])
            .build();
        catalog.initialize().unwrap();
        let keys: Vec<String> = catalog
            .list_graphs()
            .iter()
            .map(|g| g.key.to_string())
            .collect();
        assert_eq!(keys, vec!["b/x", "a/y"]);
    }

    #[test]
    fn initialize_is_idempotent() {
        let loads = Arc::new(AtomicUsize::new(0));
        let catalog = Catalog::builder()
            .source(Box::new(CountingSource {
                loads: Arc::clone(&loads),
            }))
            .build();

        catalog.initialize().unwrap();
        let first: Vec<GraphKey> = catalog.list_graphs().iter().map(|g| g.key.clone()).collect();
        catalog.initialize().unwrap();
        let second: Vec<GraphKey> = catalog.list_graphs().iter().map(|g| g.key.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_graph_blocks_everything() {
        let mut broken = graph("emotion", "wise_detective");
        if let Some(a) = broken.nodes.get_mut(&NodeId::from("a")) {
            a.choices.push(Choice::new("c2", "Leave", "nowhere"));
        }
        let catalog = Catalog::builder()
            .with_graphs(vec![graph("emotion", "compassionate_friend"), broken])
            .build();

        let err = catalog.initialize().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidGraph {
                violation: Violation::DanglingChoice { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("emotion/wise_detective"));
        assert!(err.to_string().contains("nowhere"));
        assert!(!catalog.is_initialized());
        assert!(catalog.get_graph("emotion", "compassionate_friend").is_none());
    }

    #[test]
    fn duplicate_keys_rejected() {
        let catalog = Catalog::builder()
            .with_graphs(vec![graph("emotion", "compassionate_friend")])
            .with_graphs(vec![graph("emotion", "compassionate_friend")])
            .build();
        assert!(matches!(
            catalog.initialize(),
            Err(CatalogError::DuplicateGraph(_))
        ));
        assert!(catalog.list_graphs().is_empty());
    }

    #[test]
    fn require_graph_reports_key() {
        let catalog = Catalog::builder().build();
        catalog.initialize().unwrap();
        let err = catalog.require_graph("emotion", "nobody").unwrap_err();
        assert_eq!(err.to_string(), "no graph for emotion/nobody");
    }

    #[test]
    fn concurrent_initialize_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let catalog = Arc::new(
            Catalog::builder()
                .source(Box::new(CountingSource {
                    loads: Arc::clone(&loads),
                }))
                .build(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || {
                    catalog.initialize().unwrap();
                    catalog.list_graphs().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
