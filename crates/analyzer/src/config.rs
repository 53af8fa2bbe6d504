use crate::error::{AnalyzerError, Result};
use codemap_graph::{diagram::DEFAULT_MAX_NODES, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Looked up in the project root when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "codemap.toml";

/// `codemap.toml`; every key is optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CodemapConfig {
    pub build: BuildConfig,
    pub store: StoreConfig,
    pub diagram: DiagramConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub chunk_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub ttl_hours: u64,
    /// Relative paths are taken from the project root
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            dir: PathBuf::from(".codemap/graphs"),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours.saturating_mul(3600))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramConfig {
    pub max_nodes: usize,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub max_file_bytes: u64,
    /// Globs matched against root-relative `/` paths
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1_048_576,
            exclude: [
                "**/node_modules/**",
                "**/dist/**",
                "**/build/**",
                "**/coverage/**",
                "**/*.min.js",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl CodemapConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AnalyzerError::Config(e.to_string()))
    }

    /// Read and parse an explicit config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalyzerError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| AnalyzerError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<root>/codemap.toml` if present, defaults otherwise
    pub fn load_from_root(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Store directory, resolved against `root` when relative
    #[must_use]
    pub fn store_dir(&self, root: &Path) -> PathBuf {
        if self.store.dir.is_absolute() {
            self.store.dir.clone()
        } else {
            root.join(&self.store.dir)
        }
    }
}
