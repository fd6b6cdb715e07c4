//! The resolver - main entry point for the preview engine.
//!
//! One call to [`Resolver::resolve`] runs the whole waterfall:
//!
//! 1. cache lookup (skipped with `bypass_cache`)
//! 2. classification and the Tier 0 shell record
//! 3. each enrichment tier in order, gated by the global deadline and the
//!    tier's own trigger, bounded by the tier's timeout
//! 4. unconditional cache write
//!
//! `resolve` has no error path. Tier failures, timeouts and panics are logged
//! and the record keeps whatever the earlier tiers produced.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::{classify_url, parse_lenient};
use crate::clients::ReqwestHttpClient;
use crate::error::{FetchResult, TierFailure, TierResult};
use crate::pipeline::deadline::Deadline;
use crate::security::UrlGuard;
use crate::stores::MemoryCache;
use crate::tiers::{default_tiers, shell_record};
use crate::traits::{
    cache::RecordCache,
    http::HttpClient,
    tier::{Tier, TierContext, TierOutput},
};
use crate::types::{
    config::{EngineConfig, ResolveOptions},
    record::MetadataRecord,
};

/// Resolves URLs into metadata records.
///
/// # Example
///
/// ```rust,ignore
/// use link_preview::{EngineConfig, ResolveOptions, Resolver};
///
/// let resolver = Resolver::from_config(EngineConfig::from_env()?)?;
/// let record = resolver
///     .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ", ResolveOptions::default())
///     .await;
/// assert!(record.title.is_none());
/// ```
pub struct Resolver<H: HttpClient, C: RecordCache> {
    http: H,
    cache: C,
    tiers: Vec<Box<dyn Tier>>,
    guard: UrlGuard,
    config: EngineConfig,
}

impl Resolver<ReqwestHttpClient, MemoryCache> {
    /// Production wiring: `reqwest` client, in-memory cache, standard tiers.
    pub fn from_config(config: EngineConfig) -> FetchResult<Self> {
        let guard = UrlGuard::new();
        let http = ReqwestHttpClient::new(&config.user_agent, guard.clone())?;
        let cache = MemoryCache::new(config.cache_capacity, config.cache_ttl);
        Ok(Self::with_config(http, cache, config).with_guard(guard))
    }
}

impl<H: HttpClient, C: RecordCache> Resolver<H, C> {
    /// Create a resolver with the default configuration.
    pub fn new(http: H, cache: C) -> Self {
        Self::with_config(http, cache, EngineConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(http: H, cache: C, config: EngineConfig) -> Self {
        Self {
            http,
            cache,
            tiers: default_tiers(&config),
            guard: UrlGuard::new(),
            config,
        }
    }

    /// Replace the SSRF guard applied to target URLs.
    pub fn with_guard(mut self, guard: UrlGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the tier list.
    pub fn with_tiers(mut self, tiers: Vec<Box<dyn Tier>>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    /// Resolve a URL into a record. Never fails.
    pub async fn resolve(&self, url: &str, options: ResolveOptions) -> MetadataRecord {
        let key = url.trim();

        if !options.bypass_cache {
            if let Some(hit) = self.cache.get(key) {
                debug!(url = %key, "cache hit");
                return hit;
            }
        }

        let deadline = Deadline::start(self.config.global_budget);
        let classification = classify_url(key);
        let target = fetch_target(key);
        let mut record = shell_record(&target, &classification);

        match self.guard.check(&target) {
            Ok(()) => {
                let ctx = TierContext::new(&self.http, options, self.config.retry, &self.guard);
                record = self.run_tiers(record, &ctx, &deadline).await;
            }
            Err(e) => {
                debug!(url = %key, error = %e, "target rejected, skipping network tiers");
            }
        }

        self.cache.set(key, record.clone());

        info!(
            url = %key,
            content_type = %record.content_type,
            quality = %record.quality,
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "resolved"
        );
        record
    }

    async fn run_tiers(
        &self,
        mut record: MetadataRecord,
        ctx: &TierContext<'_>,
        deadline: &Deadline,
    ) -> MetadataRecord {
        for tier in &self.tiers {
            if deadline.expired() {
                debug!(
                    url = %record.url,
                    tier = tier.name(),
                    elapsed_ms = deadline.elapsed().as_millis() as u64,
                    "global deadline reached, skipping remaining tiers"
                );
                break;
            }
            if !tier.applies(&record, ctx) {
                continue;
            }

            let tier_ctx = ctx.for_budget(tier.timeout().min(deadline.remaining()));
            match run_tier(tier.as_ref(), &record, &tier_ctx).await {
                Ok(output) => {
                    debug!(
                        url = %record.url,
                        tier = tier.name(),
                        short_circuit = output.short_circuit,
                        "tier succeeded"
                    );
                    let short_circuit = output.short_circuit;
                    record = record.merge(output.update);
                    if short_circuit {
                        break;
                    }
                }
                Err(failure) => {
                    debug!(url = %record.url, tier = tier.name(), error = %failure, "tier failed");
                }
            }
        }
        record
    }
}

/// The URL the tiers fetch. Input without a scheme is fetched as the
/// `https://` URL the classifier repaired it to.
fn fetch_target(key: &str) -> String {
    if Url::parse(key).is_ok() {
        return key.to_string();
    }
    parse_lenient(key).map_or_else(|| key.to_string(), String::from)
}

/// Run one tier under its own timeout, containing panics.
///
/// On timeout the tier future is dropped, which cancels its in-flight request.
async fn run_tier(
    tier: &dyn Tier,
    record: &MetadataRecord,
    ctx: &TierContext<'_>,
) -> TierResult<TierOutput> {
    let budget = tier.timeout();
    let enrich = AssertUnwindSafe(tier.enrich(record, ctx)).catch_unwind();

    match tokio::time::timeout(budget, enrich).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => {
            warn!(url = %record.url, tier = tier.name(), "tier panicked");
            Err(TierFailure::Panicked { tier: tier.name() })
        }
        Err(_) => Err(TierFailure::TimedOut {
            tier: tier.name(),
            budget,
        }),
    }
}
