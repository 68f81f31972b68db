//! Adaptive per-host pacing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::host::HostPacingState;

/// Configuration for pacing behavior.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Base spacing between requests to the same host (may be zero).
    pub base_delay: Duration,
    /// Spacing applied on the first push-back when the base is zero.
    pub min_backoff: Duration,
    /// Ceiling for backoff.
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Multiplier applied on recovery (< 1.0).
    pub recovery_multiplier: f64,
    /// Consecutive successes before the delay is reduced.
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::ZERO,
            min_backoff: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            recovery_multiplier: 0.5,
            recovery_threshold: 5,
        }
    }
}

/// Paces requests per host.
///
/// - Backs off on 429 and 503 responses
/// - Recovers gradually after consecutive successes
///
/// Clones share host state.
#[derive(Clone)]
pub struct RateLimiter {
    hosts: Arc<RwLock<HashMap<String, HostPacingState>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            hosts: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Extract the host from a URL.
    pub fn extract_host(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|s| s.to_string()))
    }

    fn base_delay_ms(&self) -> u64 {
        self.config.base_delay.as_millis() as u64
    }

    /// Snapshot of a host's pacing state, if it has been seen.
    pub async fn host_state(&self, host: &str) -> Option<HostPacingState> {
        self.hosts.read().await.get(host).cloned()
    }

    /// Wait until the host is ready, then mark the request as started.
    /// Returns the host name when the URL has one.
    pub async fn acquire(&self, url: &str) -> Option<String> {
        let host = Self::extract_host(url)?;

        let wait_time = {
            let mut hosts = self.hosts.write().await;
            hosts
                .entry(host.clone())
                .or_insert_with(|| HostPacingState::new(self.base_delay_ms()))
                .reserve(Instant::now())
        };

        if wait_time > Duration::ZERO {
            debug!("Pacing {}: waiting {:?}", host, wait_time);
            tokio::time::sleep(wait_time).await;
        }
        Some(host)
    }

    /// Report a response status for a host.
    pub async fn report_status(&self, host: &str, status_code: u16) {
        if Self::is_rate_limit(status_code) {
            self.report_rate_limit(host, status_code).await;
        } else if (200..500).contains(&status_code) {
            self.report_success(host).await;
        }
    }

    pub fn is_rate_limit(status_code: u16) -> bool {
        matches!(status_code, 429 | 503)
    }

    /// Record a non-throttled answer; may shrink the delay.
    pub async fn report_success(&self, host: &str) {
        let base_delay_ms = self.base_delay_ms();
        let mut hosts = self.hosts.write().await;
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| HostPacingState::new(base_delay_ms));

        if !state.in_backoff {
            return;
        }

        state.consecutive_successes += 1;
        if state.consecutive_successes >= self.config.recovery_threshold {
            let reduced = (state.current_delay_ms as f64 * self.config.recovery_multiplier) as u64;
            state.consecutive_successes = 0;
            if reduced <= base_delay_ms.max(self.config.min_backoff.as_millis() as u64 / 2) {
                state.current_delay_ms = base_delay_ms;
                state.in_backoff = false;
                info!("Host {} recovered from backoff", host);
            } else {
                state.current_delay_ms = reduced;
                debug!("Host {} delay reduced to {}ms", host, reduced);
            }
        }
    }

    /// Record a 429/503 answer; widens the delay.
    pub async fn report_rate_limit(&self, host: &str, status_code: u16) {
        let base_delay_ms = self.base_delay_ms();
        let mut hosts = self.hosts.write().await;
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| HostPacingState::new(base_delay_ms));

        state.rate_limit_hits += 1;
        state.consecutive_successes = 0;
        state.in_backoff = true;

        let widened = (state.current_delay_ms as f64 * self.config.backoff_multiplier) as u64;
        let floor = self.config.min_backoff.as_millis() as u64;
        state.current_delay_ms = widened
            .max(floor)
            .min(self.config.max_delay.as_millis() as u64);

        warn!(
            "Throttled by {} (HTTP {}), spacing probes {}ms apart",
            host, status_code, state.current_delay_ms
        );
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[test]
    fn test_extract_host() {
        assert_eq!(
            RateLimiter::extract_host("http://localhost:8080/images/a/1.jpg"),
            Some("localhost".to_string())
        );
        assert_eq!(RateLimiter::extract_host("not a url"), None);
    }

    #[tokio::test]
    async fn test_rate_limit_enters_backoff_from_zero_base() {
        let limiter = limiter();
        limiter.report_status("example.com", 429).await;

        let state = limiter.host_state("example.com").await.unwrap();
        assert!(state.in_backoff);
        assert_eq!(state.current_delay_ms, 250);
        assert_eq!(state.rate_limit_hits, 1);

        limiter.report_status("example.com", 503).await;
        let state = limiter.host_state("example.com").await.unwrap();
        assert_eq!(state.current_delay_ms, 500);
    }

    #[tokio::test]
    async fn test_recovery_after_successes() {
        let limiter = limiter();
        limiter.report_rate_limit("example.com", 429).await;

        for _ in 0..5 {
            limiter.report_status("example.com", 404).await;
        }

        let state = limiter.host_state("example.com").await.unwrap();
        assert!(!state.in_backoff);
        assert_eq!(state.current_delay_ms, 0);
    }

    #[tokio::test]
    async fn test_acquire_without_host_is_none() {
        let limiter = limiter();
        assert_eq!(limiter.acquire("relative/path.jpg").await, None);
        assert!(limiter.hosts.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_acquire_spaces_requests_to_one_host() {
        let limiter = RateLimiter::new(RateLimitConfig {
            base_delay: Duration::from_millis(40),
            ..RateLimitConfig::default()
        });

        let start = Instant::now();
        limiter.acquire("http://example.com/a.jpg").await;
        limiter.acquire("http://example.com/b.jpg").await;
        assert!(start.elapsed() >= Duration::from_millis(40));

        let state = limiter.host_state("example.com").await.unwrap();
        assert_eq!(state.total_requests, 2);
    }

    #[tokio::test]
    async fn test_clones_share_host_state() {
        let limiter = limiter();
        let clone = limiter.clone();
        clone.report_rate_limit("example.com", 429).await;
        assert!(limiter.host_state("example.com").await.unwrap().in_backoff);
    }
}
