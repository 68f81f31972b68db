//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

/// Response with headers extracted up front and the body left pending.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    response: Response,
}

impl HttpResponse {
    pub(crate) fn from_reqwest(
        status: StatusCode,
        headers: HashMap<String, String>,
        response: Response,
    ) -> Self {
        Self {
            status,
            headers,
            response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Whether the Content-Type header names an image.
    /// `None` when the server sent no Content-Type.
    pub fn is_image_content_type(&self) -> Option<bool> {
        self.content_type()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
    }

    /// Read the start of the body: at least `limit` bytes, or the whole body
    /// when it is shorter. May return more than `limit` when a chunk overshoots.
    pub async fn leading_bytes(mut self, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
        let mut buf = Vec::with_capacity(limit);
        while buf.len() < limit {
            match self.response.chunk().await? {
                Some(chunk) => buf.extend_from_slice(&chunk),
                None => break,
            }
        }
        Ok(buf)
    }
}
