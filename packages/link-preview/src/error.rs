//! Typed errors for the preview engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. None of these escape
//! [`Resolver::resolve`](crate::Resolver::resolve): fetch errors become tier
//! failures, and tier failures are logged and discarded by the orchestrator.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single outbound network operation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within its timeout
    #[error("request timed out: {url}")]
    Timeout { url: String },

    /// The connection was reset or refused mid-flight
    #[error("connection reset: {url}")]
    ConnectionReset { url: String },

    /// The request was aborted before a response arrived
    #[error("request aborted: {url}")]
    Aborted { url: String },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),

    /// The response body exceeded the configured byte cap
    #[error("response too large: {actual} bytes exceeds {limit}")]
    TooLarge { limit: u64, actual: u64 },

    /// The target URL is not a valid absolute URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The target URL was rejected by the SSRF guard
    #[error("blocked: {0}")]
    Blocked(#[from] SecurityError),

    /// Any other transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    /// Whether this failure class is worth retrying.
    ///
    /// Only timeouts, connection resets and aborts are transient. Status
    /// errors (including 4xx), parse failures and guard rejections are final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionReset { .. } | Self::Aborted { .. }
        )
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Why an enrichment tier produced no update.
#[derive(Debug, Error)]
pub enum TierFailure {
    /// The tier's network call failed (after any retries)
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The tier exceeded its own timeout
    #[error("tier {tier} exceeded its {budget:?} budget")]
    TimedOut { tier: &'static str, budget: Duration },

    /// The image is larger than the probe ceiling
    #[error("image too large to probe: {size} bytes (limit {limit})")]
    ImageTooLarge { size: u64, limit: u64 },

    /// The tier ran but the source had nothing usable
    #[error("no usable content")]
    NoContent,

    /// The tier panicked; the panic was contained at the tier boundary
    #[error("tier {tier} panicked")]
    Panicked { tier: &'static str },
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, metadata services)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Invalid configuration supplied through the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set but could not be interpreted
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type alias for network operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for tier execution.
pub type TierResult<T> = std::result::Result<T, TierFailure>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
