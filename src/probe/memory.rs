//! Probe over a fixed asset set, for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Probe, ProbeOutcome};
use crate::models::AssetPath;

/// In-memory asset set keyed by `<folder>/<file>`, with optional latency per asset.
#[derive(Debug, Default)]
pub struct MemoryProbe {
    assets: HashMap<String, Duration>,
    miss_latency: Duration,
    probed: Mutex<Vec<String>>,
    completed: AtomicUsize,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of `<folder>/<file>` keys that exist.
    pub fn with_assets<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        assets
            .into_iter()
            .fold(Self::new(), |probe, asset| probe.with_asset(asset))
    }

    pub fn with_asset(self, key: impl Into<String>) -> Self {
        self.with_delayed_asset(key, Duration::ZERO)
    }

    /// An asset whose load completes only after `latency`.
    pub fn with_delayed_asset(mut self, key: impl Into<String>, latency: Duration) -> Self {
        self.assets.insert(key.into(), latency);
        self
    }

    /// Latency before a missing asset reports not-found.
    pub fn with_miss_latency(mut self, latency: Duration) -> Self {
        self.miss_latency = latency;
        self
    }

    /// Every path probed so far, in issue order.
    pub fn probed_paths(&self) -> Vec<String> {
        self.probed
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Probes that ran to completion, whether or not anyone was still waiting.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for MemoryProbe {
    async fn check(&self, path: &AssetPath) -> ProbeOutcome {
        let key = path.to_string();
        if let Ok(mut probed) = self.probed.lock() {
            probed.push(key.clone());
        }

        let (latency, outcome) = match self.assets.get(&key) {
            Some(latency) => (*latency, ProbeOutcome::Found),
            None => (self.miss_latency, ProbeOutcome::NotFound),
        };
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    fn locate(&self, path: &AssetPath) -> String {
        format!("memory://{}", path)
    }
}
