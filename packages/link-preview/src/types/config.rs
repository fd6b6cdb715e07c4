//! Configuration types for the engine and for individual resolutions.

use std::time::Duration;

use crate::error::ConfigError;
use crate::security::credentials::ApiKey;

/// Default oEmbed endpoint for the X/Twitter family.
pub const DEFAULT_SOCIAL_OEMBED_URL: &str = "https://publish.twitter.com/oembed";

/// Default oEmbed endpoint for the YouTube family.
pub const DEFAULT_VIDEO_OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// Default metadata aggregator endpoint.
pub const DEFAULT_AGGREGATOR_URL: &str = "https://pro.microlink.io";

/// Per-call options supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Caller holds the role required for admin-only tiers.
    pub is_privileged: bool,

    /// Skip the cache lookup. The result is still written to the cache.
    pub bypass_cache: bool,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn privileged(mut self, is_privileged: bool) -> Self {
        self.is_privileged = is_privileged;
        self
    }

    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }
}

/// Per-tier timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTimeouts {
    pub social_oembed: Duration,
    pub video_oembed: Duration,
    pub aggregator: Duration,
    pub document: Duration,
    pub image_probe: Duration,
}

impl Default for TierTimeouts {
    fn default() -> Self {
        Self {
            social_oembed: Duration::from_millis(800),
            video_oembed: Duration::from_millis(1000),
            aggregator: Duration::from_millis(1500),
            document: Duration::from_millis(1500),
            image_probe: Duration::from_millis(1000),
        }
    }
}

/// Retry policy for a single network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts beyond the first. `2` means up to three calls.
    pub max_retries: u32,

    /// Linear backoff unit: the wait before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Per-attempt timeout that lets every attempt fit inside `budget`.
    pub fn attempt_timeout(&self, budget: Duration) -> Duration {
        budget / self.max_retries.saturating_add(1)
    }
}

/// Aggregator API settings (feature-flagged, optionally admin-only).
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub enabled: bool,
    pub admin_only: bool,
    pub api_key: Option<ApiKey>,
    pub endpoint: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            admin_only: true,
            api_key: None,
            endpoint: DEFAULT_AGGREGATOR_URL.to_string(),
        }
    }
}

impl AggregatorConfig {
    /// Enabled with a non-empty key.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_ref().is_some_and(|k| !k.expose().is_empty())
    }

    /// Whether a caller with the given privilege may use the aggregator.
    pub fn authorizes(&self, is_privileged: bool) -> bool {
        !self.admin_only || is_privileged
    }
}

/// Engine configuration. Treated as opaque input at construction time.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Global budget for one resolution.
    pub global_budget: Duration,

    pub tier_timeouts: TierTimeouts,

    pub retry: RetryPolicy,

    /// Maximum cached records.
    pub cache_capacity: usize,

    /// Lifetime of a cached record.
    pub cache_ttl: Duration,

    pub aggregator: AggregatorConfig,

    pub social_oembed_url: String,

    pub video_oembed_url: String,

    /// Images reporting a larger `content-length` are never probed.
    pub max_image_bytes: u64,

    /// Bytes read from an image when probing its header.
    pub probe_read_limit: u64,

    /// Bytes read from an HTML page for metadata extraction.
    pub max_page_bytes: u64,

    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_budget: Duration::from_millis(5000),
            tier_timeouts: TierTimeouts::default(),
            retry: RetryPolicy::default(),
            cache_capacity: 1000,
            cache_ttl: Duration::from_secs(3600),
            aggregator: AggregatorConfig::default(),
            social_oembed_url: DEFAULT_SOCIAL_OEMBED_URL.to_string(),
            video_oembed_url: DEFAULT_VIDEO_OEMBED_URL.to_string(),
            max_image_bytes: 5 * 1024 * 1024,
            probe_read_limit: 256 * 1024,
            max_page_bytes: 2 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (compatible; LinkPreviewBot/1.0)".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// All optional:
    /// - `PREVIEW_AGGREGATOR_ENABLED`: enable the aggregator tier (default: false)
    /// - `PREVIEW_AGGREGATOR_ADMIN_ONLY`: restrict it to privileged callers (default: true)
    /// - `PREVIEW_AGGREGATOR_API_KEY`: aggregator API key
    /// - `PREVIEW_AGGREGATOR_URL`: aggregator endpoint
    /// - `PREVIEW_CACHE_CAPACITY`: cached record count (default: 1000)
    /// - `PREVIEW_CACHE_TTL_SECS`: cached record lifetime (default: 3600)
    /// - `PREVIEW_SOCIAL_OEMBED_URL`, `PREVIEW_VIDEO_OEMBED_URL`: oEmbed endpoints
    /// - `PREVIEW_USER_AGENT`: outbound User-Agent
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("PREVIEW_AGGREGATOR_ENABLED") {
            config.aggregator.enabled = parse_bool("PREVIEW_AGGREGATOR_ENABLED", &v)?;
        }
        if let Some(v) = get("PREVIEW_AGGREGATOR_ADMIN_ONLY") {
            config.aggregator.admin_only = parse_bool("PREVIEW_AGGREGATOR_ADMIN_ONLY", &v)?;
        }
        config.aggregator.api_key =
            lookup("PREVIEW_AGGREGATOR_API_KEY").and_then(|v| ApiKey::parse(&v));
        if let Some(v) = get("PREVIEW_AGGREGATOR_URL") {
            config.aggregator.endpoint = v;
        }
        if let Some(v) = get("PREVIEW_CACHE_CAPACITY") {
            let capacity: usize = parse_number("PREVIEW_CACHE_CAPACITY", &v)?;
            if capacity == 0 {
                return Err(ConfigError::Invalid {
                    key: "PREVIEW_CACHE_CAPACITY",
                    value: v,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.cache_capacity = capacity;
        }
        if let Some(v) = get("PREVIEW_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_number("PREVIEW_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = get("PREVIEW_SOCIAL_OEMBED_URL") {
            config.social_oembed_url = v;
        }
        if let Some(v) = get("PREVIEW_VIDEO_OEMBED_URL") {
            config.video_oembed_url = v;
        }
        if let Some(v) = get("PREVIEW_USER_AGENT") {
            config.user_agent = v;
        }

        tracing::info!(
            aggregator_enabled = config.aggregator.enabled,
            aggregator_admin_only = config.aggregator.admin_only,
            aggregator_key_set = config.aggregator.api_key.is_some(),
            cache_capacity = config.cache_capacity,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "preview engine configuration loaded"
        );

        Ok(config)
    }

    pub fn with_global_budget(mut self, budget: Duration) -> Self {
        self.global_budget = budget;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    /// Enable the aggregator tier with the given key.
    pub fn with_aggregator(mut self, api_key: impl Into<String>, admin_only: bool) -> Self {
        self.aggregator.enabled = true;
        self.aggregator.admin_only = admin_only;
        self.aggregator.api_key = Some(ApiKey::new(api_key));
        self
    }

    pub fn with_aggregator_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.aggregator.endpoint = endpoint.into();
        self
    }

    pub fn with_social_oembed_url(mut self, url: impl Into<String>) -> Self {
        self.social_oembed_url = url.into();
        self
    }

    pub fn with_video_oembed_url(mut self, url: impl Into<String>) -> Self {
        self.video_oembed_url = url.into();
        self
    }

    pub fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
