//! Testing utilities including mock implementations.
//!
//! These are useful for testing the resolver and individual tiers without
//! making real network calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::http::{HttpClient, HttpRequest, HttpResponse, Method};

/// A scripted transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    ConnectionReset,
    Aborted,
    /// Answer with this non-success status
    Status(u16),
}

impl MockFailure {
    fn into_error(self, url: &str) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Timeout => FetchError::Timeout { url },
            Self::ConnectionReset => FetchError::ConnectionReset { url },
            Self::Aborted => FetchError::Aborted { url },
            Self::Status(status) => FetchError::Status { status, url },
        }
    }
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    Failure(MockFailure),
    /// Never answer; only the request's own timeout ends the wait.
    Stall,
}

#[derive(Debug, Clone, Default)]
struct MockRoute {
    /// Replies are consumed in order; the last one repeats.
    replies: VecDeque<MockReply>,
    latency: Duration,
}

impl MockRoute {
    fn next_reply(&mut self) -> Option<MockReply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

/// A mock HTTP client for testing.
///
/// Routes are keyed by method and exact URL. Unknown routes answer 404.
/// Latency is simulated with `tokio::time::sleep`, so tests running with
/// paused time stay instant.
///
/// # Example
///
/// ```rust
/// use link_preview::testing::{MockFailure, MockHttpClient};
///
/// let http = MockHttpClient::new()
///     .with_html("https://example.com/a", "<meta name=\"description\" content=\"Hi\">")
///     .with_get_failure("https://example.com/b", MockFailure::Timeout);
/// assert_eq!(http.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<RwLock<HashMap<(Method, String), MockRoute>>>,
    calls: Arc<RwLock<Vec<HttpRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with this response every time.
    pub fn with_response(self, method: Method, url: &str, response: HttpResponse) -> Self {
        self.with_sequence(method, url, vec![MockReply::Response(response)])
    }

    /// Answer `method url` with these replies in order, repeating the last.
    pub fn with_sequence(self, method: Method, url: &str, replies: Vec<MockReply>) -> Self {
        self.routes
            .write()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .replies = replies.into();
        self
    }

    /// Serve an HTML page on GET.
    pub fn with_html(self, url: &str, html: &str) -> Self {
        let response = HttpResponse::new(200, html)
            .with_header("content-type", "text/html; charset=utf-8");
        self.with_response(Method::Get, url, response)
    }

    /// Serve a JSON document on GET.
    pub fn with_json(self, url: &str, body: serde_json::Value) -> Self {
        let response = HttpResponse::new(200, body.to_string())
            .with_header("content-type", "application/json");
        self.with_response(Method::Get, url, response)
    }

    /// Fail every GET to `url`.
    pub fn with_get_failure(self, url: &str, failure: MockFailure) -> Self {
        self.with_sequence(Method::Get, url, vec![MockReply::Failure(failure)])
    }

    /// Fail every HEAD to `url`.
    pub fn with_head_failure(self, url: &str, failure: MockFailure) -> Self {
        self.with_sequence(Method::Head, url, vec![MockReply::Failure(failure)])
    }

    /// Delay replies on `method url` by `latency`.
    pub fn with_latency(self, method: Method, url: &str, latency: Duration) -> Self {
        self.routes
            .write()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .latency = latency;
        self
    }

    /// Get all recorded requests.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Get the total number of requests made.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Get the number of requests made to `method url`.
    pub fn calls_to(&self, method: Method, url: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    /// Clear all recorded calls.
    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        self.calls.write().unwrap().push(request.clone());

        let (reply, latency) = {
            let mut routes = self.routes.write().unwrap();
            match routes.get_mut(&(request.method, request.url.clone())) {
                Some(route) => (route.next_reply(), route.latency),
                None => (None, Duration::ZERO),
            }
        };

        let wait = match reply {
            Some(MockReply::Stall) => None,
            _ => Some(latency),
        };
        match (wait, request.timeout) {
            (Some(wait), Some(limit)) if wait > limit => {
                tokio::time::sleep(limit).await;
                return Err(FetchError::Timeout { url: request.url });
            }
            (None, Some(limit)) => {
                tokio::time::sleep(limit).await;
                return Err(FetchError::Timeout { url: request.url });
            }
            (None, None) => std::future::pending::<()>().await,
            (Some(wait), _) if !wait.is_zero() => tokio::time::sleep(wait).await,
            _ => {}
        }

        match reply {
            Some(MockReply::Response(mut response)) => {
                if !response.is_success() {
                    return Err(FetchError::Status {
                        status: response.status,
                        url: request.url,
                    });
                }
                if let Some(limit) = request.max_bytes {
                    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                    if response.body.len() > limit {
                        response.body.truncate(limit);
                        response.truncated = true;
                    }
                }
                if request.method == Method::Head {
                    response.body.clear();
                }
                Ok(response)
            }
            Some(MockReply::Failure(failure)) => Err(failure.into_error(&request.url)),
            Some(MockReply::Stall) => Err(FetchError::Timeout { url: request.url }),
            None => Err(FetchError::Status {
                status: 404,
                url: request.url,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
