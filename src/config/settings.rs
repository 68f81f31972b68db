//! Runtime settings and the objects built from them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::ConfigError;
use crate::continuation::{ContinuationScanner, DEFAULT_CONTINUATION_DEPTH};
use crate::http_client::HttpClient;
use crate::models::CategoryRegistry;
use crate::patterns::{PatternGenerator, PatternPolicy, DEFAULT_MAX_COMBINED_WIDTH};
use crate::probe::{BoxedProbe, FsProbe, HttpProbe, TimedProbe, DEFAULT_PROBE_TIMEOUT};
use crate::resolver::{ProbeStrategy, Resolver};
use crate::session::{SessionOptions, DEFAULT_CONCURRENCY, DEFAULT_EAGER_PREFIX};

/// Default asset server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

/// Default directory holding the category folders.
pub const DEFAULT_IMAGES_DIR: &str = "images";

/// Application settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Root URL of the static asset server.
    pub base_url: String,
    /// Local mirror of the asset server; when set, probes hit the filesystem.
    pub asset_root: Option<PathBuf>,
    /// Directory under the root holding the category folders.
    pub images_dir: String,
    /// User agent (`None` = default, `"browser"` = real browser UA).
    pub user_agent: Option<String>,
    /// Referer header for hotlink-protected servers.
    pub referer: Option<String>,
    /// Transport timeout in seconds.
    pub request_timeout: u64,
    /// Base spacing between requests to one host, in milliseconds.
    pub request_delay_ms: u64,
    /// Deadline for a single probe, in milliseconds.
    pub probe_timeout_ms: u64,
    pub strategy: ProbeStrategy,
    pub pattern_policy: PatternPolicy,
    pub max_combined_width: u32,
    pub continuation_depth: u32,
    pub continuation_prefixed: bool,
    pub eager_prefix: usize,
    pub concurrency: usize,
    pub lookahead: bool,
    #[serde(skip)]
    pub registry: CategoryRegistry,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            asset_root: None,
            images_dir: DEFAULT_IMAGES_DIR.to_string(),
            user_agent: None,
            referer: None,
            request_timeout: 10,
            request_delay_ms: 0,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            strategy: ProbeStrategy::default(),
            pattern_policy: PatternPolicy::default(),
            max_combined_width: DEFAULT_MAX_COMBINED_WIDTH,
            continuation_depth: DEFAULT_CONTINUATION_DEPTH,
            continuation_prefixed: false,
            eager_prefix: DEFAULT_EAGER_PREFIX,
            concurrency: DEFAULT_CONCURRENCY,
            lookahead: true,
            registry: CategoryRegistry::default(),
        }
    }
}

impl Settings {
    /// Apply `HYMNAL_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("HYMNAL_BASE_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(root) = std::env::var("HYMNAL_ASSET_ROOT") {
            if !root.is_empty() {
                self.asset_root = Some(PathBuf::from(shellexpand::tilde(&root).as_ref()));
            }
        }
        if let Some(ms) = std::env::var("HYMNAL_PROBE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.probe_timeout_ms = ms;
        }
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Build the probe stack: filesystem or HTTP, wrapped in the probe deadline.
    pub fn build_probe(&self) -> Result<BoxedProbe, ConfigError> {
        let inner: BoxedProbe = match &self.asset_root {
            Some(root) => Arc::new(FsProbe::new(root.clone(), &self.images_dir)),
            None => {
                let mut builder = HttpClient::builder(
                    "assets",
                    Duration::from_secs(self.request_timeout),
                    Duration::from_millis(self.request_delay_ms),
                );
                if let Some(ref ua) = self.user_agent {
                    builder = builder.user_agent(ua);
                }
                if let Some(ref referer) = self.referer {
                    builder = builder.referer(referer);
                }
                let client = builder.build()?;
                let probe = HttpProbe::new(client, &self.base_url, &self.images_dir).map_err(
                    |e| ConfigError::InvalidBaseUrl {
                        url: self.base_url.clone(),
                        reason: e.to_string(),
                    },
                )?;
                Arc::new(probe)
            }
        };

        Ok(Arc::new(TimedProbe::new(inner, self.probe_timeout())))
    }

    pub fn pattern_generator(&self) -> PatternGenerator {
        PatternGenerator::new(self.registry.clone(), self.pattern_policy)
            .with_max_width(self.max_combined_width)
    }

    pub fn continuation_scanner(&self) -> ContinuationScanner {
        ContinuationScanner::new(self.continuation_depth).with_prefixed(self.continuation_prefixed)
    }

    /// Assemble a resolver over an existing probe.
    pub fn resolver_with_probe(&self, probe: BoxedProbe) -> Resolver {
        Resolver::new(probe, self.pattern_generator(), self.strategy)
            .with_continuation(self.continuation_scanner())
    }

    pub fn build_resolver(&self) -> Result<Resolver, ConfigError> {
        Ok(self.resolver_with_probe(self.build_probe()?))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            eager_prefix: self.eager_prefix,
            concurrency: self.concurrency,
            lookahead: self.lookahead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.probe_timeout(), Duration::from_millis(1500));
        assert_eq!(settings.continuation_depth, 2);
        assert_eq!(settings.eager_prefix, 20);
        assert_eq!(settings.strategy, ProbeStrategy::Sequential);
        assert_eq!(settings.pattern_policy, PatternPolicy::Narrow);
    }

    #[test]
    fn test_build_probe_rejects_bad_url() {
        let settings = Settings {
            base_url: "::nope::".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.build_probe(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_probe_uses_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            asset_root: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let probe = settings.build_probe().unwrap();
        let located = probe.locate(&crate::models::AssetPath::new("eunhae", "1.jpg"));
        assert!(located.starts_with(&dir.path().display().to_string()));
    }
}
