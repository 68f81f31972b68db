//! HTTP client for asset probes.
//!
//! Wraps `reqwest` with a builder, a configurable user agent and per-host
//! pacing. No retries happen here: one call, one request.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENTS, USER_AGENT};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use tracing::debug;

use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Failure to construct the underlying client.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("Failed to build HTTP client: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Invalid Referer header '{0}'")]
    InvalidReferer(String),
}

fn extract_response_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// HTTP client with pacing and request timing logs.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    source_id: String,
    rate_limiter: RateLimiter,
}

/// Builder for `HttpClient`.
///
/// Required parameters come from `HttpClient::builder()`; everything else is
/// optional and set through chainable methods before `build()`.
pub struct HttpClientBuilder {
    source_id: String,
    timeout: Duration,
    request_delay: Duration,
    user_agent: Option<String>,
    referer: Option<String>,
}

impl HttpClientBuilder {
    /// Set the user agent string.
    /// - `"browser"`: use a real browser user agent
    /// - Any other string: use as-is
    /// - Not called: use the default hymnal user agent
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Send a Referer header with every request, for servers that guard
    /// image hotlinking.
    pub fn referer(mut self, referer: &str) -> Self {
        self.referer = Some(referer.to_string());
        self
    }

    pub fn build(self) -> Result<HttpClient, ClientBuildError> {
        let user_agent = resolve_user_agent(self.user_agent.as_deref());

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref referer) = self.referer {
            let value = reqwest::header::HeaderValue::from_str(referer)
                .map_err(|_| ClientBuildError::InvalidReferer(referer.clone()))?;
            headers.insert(reqwest::header::REFERER, value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        let rate_limiter = RateLimiter::new(RateLimitConfig {
            base_delay: self.request_delay,
            ..RateLimitConfig::default()
        });

        Ok(HttpClient {
            client,
            source_id: self.source_id,
            rate_limiter,
        })
    }
}

impl HttpClient {
    /// Create a builder.
    ///
    /// - `source_id`: identifier used in logs
    /// - `timeout`: transport-level request timeout
    /// - `request_delay`: base spacing between requests to one host
    pub fn builder(source_id: &str, timeout: Duration, request_delay: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            source_id: source_id.to_string(),
            timeout,
            request_delay,
            user_agent: None,
            referer: None,
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Wait for this URL's host to accept another request.
    pub async fn pace(&self, url: &str) {
        self.rate_limiter.acquire(url).await;
    }

    /// Make a GET request right away and feed its status back into pacing.
    /// Callers that want spacing call `pace` first.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let duration = start.elapsed();

        let status = response.status();
        let headers = extract_response_headers(&response);
        debug!(
            "[{}] GET {} -> {} ({}ms)",
            self.source_id,
            url,
            status.as_u16(),
            duration.as_millis()
        );

        if let Some(host) = RateLimiter::extract_host(url) {
            self.rate_limiter.report_status(&host, status.as_u16()).await;
        }

        Ok(HttpResponse::from_reqwest(status, headers, response))
    }
}
