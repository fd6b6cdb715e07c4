//! Tiered URL Metadata Resolution
//!
//! Turns a bare URL into a metadata card for a rich link preview, without
//! embedding third-party widgets and without unbounded scraping.
//!
//! # Design Philosophy
//!
//! **"Always return a card"**
//!
//! - A waterfall of increasingly expensive enrichment tiers
//! - Every tier bounded by its own timeout and by a global deadline
//! - Every outcome cached, failures included
//! - Titles are never generated: the card title only comes from the user
//!
//! # Usage
//!
//! ```rust,ignore
//! use link_preview::{EngineConfig, MemoryCache, ResolveOptions, Resolver};
//! use link_preview::testing::MockHttpClient;
//!
//! let config = EngineConfig::default();
//! let cache = MemoryCache::new(config.cache_capacity, config.cache_ttl);
//! let resolver = Resolver::with_config(MockHttpClient::new(), cache, config);
//!
//! let record = resolver
//!     .resolve("https://news.example.com/article-1", ResolveOptions::default())
//!     .await;
//! assert!(record.title.is_none());
//! ```
//!
//! # Modules
//!
//! - [`classify`] - URL classification and the platform table
//! - [`traits`] - Core trait abstractions (HttpClient, RecordCache, Tier)
//! - [`types`] - The metadata record and configuration types
//! - [`tiers`] - Enrichment tier implementations
//! - [`pipeline`] - Resolver, deadline and retry
//! - [`stores`] - Cache implementations (MemoryCache)
//! - [`clients`] - HTTP client implementations (ReqwestHttpClient)
//! - [`security`] - Credential handling and SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod classify;
pub mod clients;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod tiers;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use classify::{classify_url, Classification, UNKNOWN_DOMAIN};
pub use clients::ReqwestHttpClient;
pub use error::{ConfigError, FetchError, SecurityError, TierFailure};
pub use pipeline::{Deadline, Resolver};
pub use security::{ApiKey, UrlGuard};
pub use stores::MemoryCache;
pub use traits::{
    cache::RecordCache,
    http::{HttpClient, HttpRequest, HttpResponse, Method},
    tier::{Tier, TierContext, TierOutput},
};
pub use types::{
    config::{AggregatorConfig, EngineConfig, ResolveOptions, RetryPolicy, TierTimeouts},
    record::{ContentType, Media, MetadataRecord, Quality, RecordUpdate, RenderMode, SourceInfo},
};
