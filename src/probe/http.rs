//! Probe over HTTP against the static asset server.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{Probe, ProbeOutcome, SNIFF_LEN};
use crate::http_client::HttpClient;
use crate::models::AssetPath;
use crate::rate_limit::{HostPacingState, RateLimiter};

/// Loads `<base_url>/<images_dir>/<folder>/<file>` and accepts it only if an
/// image comes back.
#[derive(Clone)]
pub struct HttpProbe {
    client: HttpClient,
    base: Url,
    images_dir: String,
}

impl HttpProbe {
    pub fn new(client: HttpClient, base_url: &str, images_dir: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            images_dir: images_dir.trim_matches('/').to_string(),
        })
    }

    /// Absolute URL for an asset, with every path segment percent-encoded.
    pub fn url_for(&self, path: &AssetPath) -> String {
        let mut relative = String::new();
        for segment in self
            .images_dir
            .split('/')
            .filter(|s| !s.is_empty())
            .chain([path.folder.as_str(), path.file.as_str()])
        {
            if !relative.is_empty() {
                relative.push('/');
            }
            relative.push_str(&urlencoding::encode(segment));
        }

        match self.base.join(&relative) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base, relative),
        }
    }

    async fn host_state(&self, url: &str) -> Option<HostPacingState> {
        let host = RateLimiter::extract_host(url)?;
        self.client.rate_limiter().host_state(&host).await
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn pace(&self, path: &AssetPath) {
        self.client.pace(&self.url_for(path)).await;
    }

    async fn check(&self, path: &AssetPath) -> ProbeOutcome {
        let url = self.url_for(path);

        let response = match self.client.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                debug!("Probe request for {} failed: {}", url, e);
                return ProbeOutcome::NotFound;
            }
        };

        if !response.is_success() {
            if RateLimiter::is_rate_limit(response.status.as_u16()) {
                if let Some(state) = self.host_state(&url).await {
                    debug!(
                        "{} throttled, host now spaced {}ms apart",
                        url, state.current_delay_ms
                    );
                }
            }
            return ProbeOutcome::NotFound;
        }

        if response.is_image_content_type() == Some(true) {
            return ProbeOutcome::Found;
        }

        // Missing or generic content type: sniff the payload like a browser would.
        match response.leading_bytes(SNIFF_LEN).await {
            Ok(bytes) if infer::is_image(&bytes) => ProbeOutcome::Found,
            Ok(_) => {
                debug!("{} answered with a non-image payload", url);
                ProbeOutcome::NotFound
            }
            Err(e) => {
                debug!("Failed to read body of {}: {}", url, e);
                ProbeOutcome::NotFound
            }
        }
    }

    fn locate(&self, path: &AssetPath) -> String {
        self.url_for(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn probe(base: &str) -> HttpProbe {
        let client = HttpClient::builder("test", Duration::from_secs(1), Duration::ZERO)
            .build()
            .unwrap();
        HttpProbe::new(client, base, "images").unwrap()
    }

    #[test]
    fn test_url_for_plain_file() {
        let probe = probe("http://localhost:8080");
        assert_eq!(
            probe.url_for(&AssetPath::new("chansongga", "100.jpg")),
            "http://localhost:8080/images/chansongga/100.jpg"
        );
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let probe = probe("https://example.org/hymns");
        assert_eq!(
            probe.url_for(&AssetPath::new("eunhae", "1-2.jpeg")),
            "https://example.org/hymns/images/eunhae/1-2.jpeg"
        );
    }

    #[test]
    fn test_url_for_encodes_prefixed_names() {
        let probe = probe("http://localhost:8080/");
        let url = probe.url_for(&AssetPath::new("chansongga", "찬송가 100.jpg"));
        assert!(url.starts_with("http://localhost:8080/images/chansongga/"));
        assert!(url.ends_with("%20100.jpg"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_invalid_base_url() {
        let client = HttpClient::builder("test", Duration::from_secs(1), Duration::ZERO)
            .build()
            .unwrap();
        assert!(HttpProbe::new(client, "not a url", "images").is_err());
    }
}
