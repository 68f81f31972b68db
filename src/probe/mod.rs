//! One-shot existence checks for asset paths.
//!
//! A probe answers exactly one of found / not-found per call. It never
//! retries and never surfaces an error: transport failures, non-image
//! payloads and stalls all read as not-found.

mod fs;
mod http;
mod memory;

pub use fs::FsProbe;
pub use http::HttpProbe;
pub use memory::MemoryProbe;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use crate::models::AssetPath;

/// Default deadline for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Leading bytes read for magic-number sniffing.
const SNIFF_LEN: usize = 32;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Found,
    NotFound,
}

impl ProbeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Existence check for one asset.
///
/// A probe runs in two phases: `pace` waits until the backing store will
/// accept another request, `check` issues it. Deadlines apply to `check` only.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Wait for a request slot. Most probes never have to.
    async fn pace(&self, _path: &AssetPath) {}

    /// Load `path` once and report whether a decodable image came back.
    async fn check(&self, path: &AssetPath) -> ProbeOutcome;

    /// Pace, then check.
    async fn probe(&self, path: &AssetPath) -> ProbeOutcome {
        self.pace(path).await;
        self.check(path).await
    }

    /// Where a renderer would load `path` from (URL or filesystem path).
    fn locate(&self, path: &AssetPath) -> String;
}

/// Shared probe handle.
pub type BoxedProbe = Arc<dyn Probe>;

/// Applies a deadline to another probe's check.
///
/// Pacing happens before the clock starts. The inner check runs as a detached
/// task that reports through a oneshot channel. Once the deadline fires the
/// receiver is dropped, so a late completion has nowhere to go and is
/// discarded: each probe delivers at most one outcome.
#[derive(Clone)]
pub struct TimedProbe {
    inner: BoxedProbe,
    timeout: Duration,
}

impl TimedProbe {
    pub fn new(inner: BoxedProbe, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Probe for TimedProbe {
    async fn pace(&self, path: &AssetPath) {
        self.inner.pace(path).await;
    }

    async fn check(&self, path: &AssetPath) -> ProbeOutcome {
        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let owned = path.clone();

        tokio::spawn(async move {
            let outcome = inner.check(&owned).await;
            if tx.send(outcome).is_err() {
                debug!("Ignoring late probe result for {} ({:?})", owned, outcome);
            }
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => ProbeOutcome::NotFound,
            Err(_) => {
                debug!("Probe for {} timed out after {:?}", path, self.timeout);
                ProbeOutcome::NotFound
            }
        }
    }

    fn locate(&self, path: &AssetPath) -> String {
        self.inner.locate(path)
    }
}
