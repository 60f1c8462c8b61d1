//! Catalog configuration, loaded from RON.
//!
//! ```ron
//! (
//!     content_dirs: ["content/chambers"],
//!     include_builtin: false,
//!     baseline_variant: Some("compassionate_friend"),
//!     fallback_path: Some("content/fallback.ron"),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("RON deserialization error in {path}: {source}")]
    Ron {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Files or directories of authored chambers, loaded in order.
    #[serde(default)]
    pub content_dirs: Vec<PathBuf>,

    /// Load the chambers compiled into the crate before `content_dirs`.
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,

    /// Variant tried when a caller's variant has no graph for a context.
    #[serde(default)]
    pub baseline_variant: Option<String>,

    /// Fallback text table; the built-in table is used when unset.
    #[serde(default)]
    pub fallback_path: Option<PathBuf>,
}

fn default_include_builtin() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            content_dirs: Vec::new(),
            include_builtin: default_include_builtin(),
            baseline_variant: None,
            fallback_path: None,
        }
    }
}

impl CatalogConfig {
    /// Load a config from a RON file. Relative content and fallback paths
    /// are resolved against the config file's directory.
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse_ron(&contents).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        })?;

        let root = path.parent().unwrap_or(Path::new("."));
        config.content_dirs = config
            .content_dirs
            .into_iter()
            .map(|dir| resolve(root, dir))
            .collect();
        config.fallback_path = config.fallback_path.map(|p| resolve(root, p));
        Ok(config)
    }

    pub fn parse_ron(input: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(input)
    }
}

fn resolve(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
