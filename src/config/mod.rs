//! Configuration management using the prefer crate for discovery.

mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::http_client::ClientBuildError;
use crate::models::{Category, CategoryRegistry, IrregularRange};
use crate::patterns::PatternPolicy;
use crate::resolver::ProbeStrategy;

pub use settings::{Settings, DEFAULT_BASE_URL, DEFAULT_IMAGES_DIR};

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    Client(#[from] ClientBuildError),
}

/// A category entry under `[categories.<id>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Display name.
    pub name: String,
    /// Highest valid number.
    pub total: u32,
    /// Folder under the images directory; defaults to the category id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Configuration file structure. Every field is optional; missing values
/// keep the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Local mirror of the asset server. Relative paths resolve against the
    /// config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ProbeStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_policy: Option<PatternPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_combined_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_prefixed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eager_prefix: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,
    /// Replaces the built-in categories when non-empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, CategoryConfig>,
    /// Replaces the built-in irregular ranges when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irregular: Option<Vec<IrregularRange>>,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load `hymnal.{toml,yaml,json}` from the standard locations.
    /// Falls back to defaults when nothing is found or the file is unreadable.
    pub async fn load() -> Self {
        match prefer::load("hymnal").await {
            Ok(found) => match found.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("{}; using defaults", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(e) => {
                debug!("No config file discovered: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file. The format follows the
    /// extension; anything unrecognised is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory relative paths resolve against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Build the category registry: built-ins unless the file defines its own.
    pub fn build_registry(&self) -> CategoryRegistry {
        let mut registry = if self.categories.is_empty() {
            CategoryRegistry::default()
        } else {
            let mut registry = CategoryRegistry::empty();
            for (id, entry) in &self.categories {
                let folder = entry.folder.as_deref().unwrap_or(id);
                registry.insert(Category::new(id, &entry.name, entry.total, folder));
            }
            registry
        };

        if let Some(ref ranges) = self.irregular {
            registry.clear_irregular();
            for range in ranges {
                registry.add_irregular(range.clone());
            }
        }

        if let Some(ref id) = self.default_category {
            if !registry.set_default(id) {
                warn!("Default category '{}' is not configured; ignoring", id);
            }
        }

        registry
    }

    /// Overlay the file's values onto `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(ref root) = self.asset_root {
            settings.asset_root = Some(self.resolve_path(root, base_dir));
        }
        if let Some(ref dir) = self.images_dir {
            settings.images_dir = dir.clone();
        }
        if let Some(ref ua) = self.user_agent {
            settings.user_agent = Some(ua.clone());
        }
        if let Some(ref referer) = self.referer {
            settings.referer = Some(referer.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(timeout) = self.probe_timeout_ms {
            settings.probe_timeout_ms = timeout;
        }
        if let Some(strategy) = self.strategy {
            settings.strategy = strategy;
        }
        if let Some(policy) = self.pattern_policy {
            settings.pattern_policy = policy;
        }
        if let Some(width) = self.max_combined_width {
            settings.max_combined_width = width;
        }
        if let Some(depth) = self.continuation_depth {
            settings.continuation_depth = depth;
        }
        if let Some(prefixed) = self.continuation_prefixed {
            settings.continuation_prefixed = prefixed;
        }
        if let Some(prefix) = self.eager_prefix {
            settings.eager_prefix = prefix;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(lookahead) = self.lookahead {
            settings.lookahead = lookahead;
        }
        settings.registry = self.build_registry();
    }

    /// Settings from this config with environment overrides on top.
    pub fn to_settings(&self) -> Settings {
        let base_dir = self
            .base_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let mut settings = Settings::default();
        self.apply_to_settings(&mut settings, &base_dir);
        settings.with_env_overrides()
    }
}
