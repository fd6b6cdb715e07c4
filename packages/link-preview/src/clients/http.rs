//! `reqwest`-backed HTTP client.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::security::UrlGuard;
use crate::traits::http::{HttpClient, HttpRequest, HttpResponse, Method};

const MAX_REDIRECTS: usize = 5;

/// Production HTTP client.
///
/// Streams response bodies and stops at the request's `max_bytes`, so a
/// ranged probe never downloads more than it asked for even when the server
/// ignores the `Range` header. Redirect targets are re-checked against the
/// [`UrlGuard`].
///
/// # Example
///
/// ```rust,ignore
/// use link_preview::clients::ReqwestHttpClient;
/// use link_preview::security::UrlGuard;
///
/// let client = ReqwestHttpClient::new("LinkPreview/1.0", UrlGuard::new())?;
/// ```
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client with the given user agent and redirect guard.
    pub fn new(user_agent: &str, guard: UrlGuard) -> FetchResult<Self> {
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if !guard.is_allowed(attempt.url().as_str()) {
                attempt.error("redirect target blocked")
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(redirect)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        let url = request.url.clone();
        debug!(method = request.method.as_str(), url = %url, "HTTP request starting");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Head => self.client.head(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let mut response = builder.send().await.map_err(|e| map_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(|e| map_error(e, &url))? {
            if let Some(limit) = request.max_bytes {
                let room = usize::try_from(limit.saturating_sub(body.len() as u64))
                    .unwrap_or(usize::MAX);
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    truncated = true;
                    break;
                }
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
            final_url: Some(final_url),
            truncated,
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// Map a `reqwest` error onto the engine's failure classes.
fn map_error(err: reqwest::Error, url: &str) -> FetchError {
    let url = url.to_string();
    if err.is_timeout() {
        return FetchError::Timeout { url };
    }
    if err.is_builder() {
        return FetchError::InvalidUrl { url };
    }
    match io_error_kind(&err) {
        Some(
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::BrokenPipe,
        ) => return FetchError::ConnectionReset { url },
        Some(io::ErrorKind::ConnectionAborted | io::ErrorKind::UnexpectedEof) => {
            return FetchError::Aborted { url }
        }
        Some(io::ErrorKind::TimedOut) => return FetchError::Timeout { url },
        _ => {}
    }
    if err.is_connect() {
        return FetchError::ConnectionReset { url };
    }
    if err.is_body() {
        return FetchError::Aborted { url };
    }
    warn!(url = %url, error = %err, "HTTP request failed");
    FetchError::Http(Box::new(err))
}

/// First `io::Error` kind in the source chain, if any.
fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = cause.source();
    }
    None
}
