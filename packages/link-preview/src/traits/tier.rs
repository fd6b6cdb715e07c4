//! Enrichment tier trait.
//!
//! A tier is one strategy in the resolution waterfall. It looks at the record
//! built so far and returns a partial update, or a [`TierFailure`] saying why
//! it produced nothing. Tiers never mutate the record; the resolver folds
//! their updates in with [`MetadataRecord::merge`].

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{FetchResult, TierResult};
use crate::pipeline::retry::with_retry;
use crate::security::UrlGuard;
use crate::traits::http::{HttpClient, HttpRequest, HttpResponse};
use crate::types::config::{ResolveOptions, RetryPolicy};
use crate::types::record::{MetadataRecord, RecordUpdate};

/// Shared inputs for every tier in one resolution.
#[derive(Clone, Copy)]
pub struct TierContext<'a> {
    pub http: &'a dyn HttpClient,
    pub options: ResolveOptions,
    pub retry: RetryPolicy,
    pub guard: &'a UrlGuard,

    /// Timeout applied to each request attempt made through [`Self::fetch`].
    pub attempt_timeout: Option<Duration>,
}

impl<'a> TierContext<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        options: ResolveOptions,
        retry: RetryPolicy,
        guard: &'a UrlGuard,
    ) -> Self {
        Self {
            http,
            options,
            retry,
            guard,
            attempt_timeout: None,
        }
    }

    /// This context for a tier with `budget` to spend. The budget is split
    /// across the retry policy's attempts so a stalled attempt times out
    /// while there is still room to retry it.
    pub fn for_budget(&self, budget: Duration) -> Self {
        Self {
            attempt_timeout: Some(self.retry.attempt_timeout(budget)),
            ..*self
        }
    }

    /// Send a request to a configured endpoint, retrying transient failures.
    pub async fn fetch(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        let request = match (self.attempt_timeout, request.timeout) {
            (Some(attempt), Some(own)) => request.with_timeout(own.min(attempt)),
            (Some(attempt), None) => request.with_timeout(attempt),
            (None, _) => request,
        };
        with_retry(&self.retry, || self.http.send(request.clone())).await
    }

    /// Send a request to an untrusted URL: SSRF guard first, then [`Self::fetch`].
    pub async fn fetch_guarded(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        self.guard.check(&request.url)?;
        self.fetch(request).await
    }
}

/// What a successful tier hands back to the resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierOutput {
    pub update: RecordUpdate,

    /// Skip all remaining tiers.
    pub short_circuit: bool,
}

impl TierOutput {
    /// Merge this update and keep going.
    pub fn update(update: RecordUpdate) -> Self {
        Self {
            update,
            short_circuit: false,
        }
    }

    /// Merge this update and stop the waterfall.
    pub fn halt(update: RecordUpdate) -> Self {
        Self {
            update,
            short_circuit: true,
        }
    }
}

/// One enrichment strategy.
#[async_trait]
pub trait Tier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The tier's own timeout, enforced by the resolver.
    fn timeout(&self) -> Duration;

    /// Trigger condition, checked after the global deadline.
    fn applies(&self, record: &MetadataRecord, ctx: &TierContext<'_>) -> bool;

    /// Run the tier.
    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput>;
}
