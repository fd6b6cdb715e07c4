//! HTTP client trait for the enrichment tiers.
//!
//! Tiers never talk to `reqwest` directly. They build an [`HttpRequest`] and
//! hand it to an [`HttpClient`], which keeps the tiers testable against
//! [`MockHttpClient`](crate::testing::MockHttpClient) and lets the production
//! client own connection pooling, byte caps and error mapping.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};

/// HTTP method used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
        }
    }
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Transport-level timeout for this request
    pub timeout: Option<Duration>,
    /// Stop reading the body after this many bytes
    pub max_bytes: Option<u64>,
}

impl HttpRequest {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
            max_bytes: None,
        }
    }

    /// Create a HEAD request.
    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            ..Self::get(url)
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cap the number of body bytes read.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// A response with its (possibly truncated) body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// URL after redirects
    pub final_url: Option<String>,
    /// True if the body was cut off at `max_bytes`
    pub truncated: bool,
}

impl HttpResponse {
    /// Create a response with a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Add a header (name is lowercased).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the final URL after redirects.
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }

    /// Get a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parsed `content-length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// The `content-type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize a JSON body. A truncated body is rejected, not parsed.
    pub fn json<T: DeserializeOwned>(&self) -> FetchResult<T> {
        if self.truncated {
            let read = self.body.len() as u64;
            return Err(FetchError::TooLarge {
                limit: read,
                actual: self.content_length().unwrap_or(read),
            });
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Client that executes [`HttpRequest`]s.
///
/// Implementations must:
/// - return `Err(FetchError::Status)` for non-2xx responses
/// - map timeouts, connection resets and aborts onto the transient
///   [`FetchError`](crate::FetchError) variants so the retry wrapper can see them
/// - stop reading at `max_bytes` and mark the response `truncated`
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a request.
    async fn send(&self, request: HttpRequest) -> FetchResult<HttpResponse>;

    /// Get the client name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
