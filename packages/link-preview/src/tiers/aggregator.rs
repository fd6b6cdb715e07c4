//! Tier 1: metadata aggregator API.
//!
//! Speaks the Microlink response shape (`{ status, data: { description,
//! author, date, image: { url, width, height } } }`). The aggregator is the
//! richest source, so a description or an image from it ends the waterfall.
//! Its `title` is discarded like every other title.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{TierFailure, TierResult};
use crate::tiers::endpoint_url;
use crate::traits::http::HttpRequest;
use crate::traits::tier::{Tier, TierContext, TierOutput};
use crate::types::config::AggregatorConfig;
use crate::types::record::{has_text, Media, MetadataRecord, Quality, RecordUpdate};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct AggregatorResponse {
    status: Option<String>,
    data: Option<AggregatorData>,
}

#[derive(Debug, Default, Deserialize)]
struct AggregatorData {
    description: Option<String>,
    author: Option<String>,
    date: Option<String>,
    image: Option<AggregatorImage>,
}

#[derive(Debug, Deserialize)]
struct AggregatorImage {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Feature-flagged, optionally admin-only aggregator lookup.
pub struct AggregatorTier {
    config: AggregatorConfig,
    timeout: Duration,
}

impl AggregatorTier {
    pub fn new(config: AggregatorConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// The aggregator request URL for a target.
    pub fn request_url(&self, target: &str) -> String {
        endpoint_url(&self.config.endpoint, &[("url", target)])
    }
}

#[async_trait]
impl Tier for AggregatorTier {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn applies(&self, _record: &MetadataRecord, ctx: &TierContext<'_>) -> bool {
        self.config.is_active() && self.config.authorizes(ctx.options.is_privileged)
    }

    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput> {
        let Some(key) = self.config.api_key.as_ref() else {
            return Err(TierFailure::NoContent);
        };
        let request =
            HttpRequest::get(self.request_url(&record.url)).with_header(API_KEY_HEADER, key.expose());
        let response: AggregatorResponse = ctx.fetch(request).await?.json()?;

        if let Some(status) = response.status.as_deref() {
            if status != "success" {
                debug!(url = %record.url, status, "aggregator reported failure");
                return Err(TierFailure::NoContent);
            }
        }
        let data = response.data.unwrap_or_default();

        let mut update = RecordUpdate::new();
        if has_text(&data.description) {
            update.description = data.description;
        }
        if has_text(&data.author) {
            update.author = data.author;
        }
        if has_text(&data.date) {
            update.published_at = data.date;
        }
        if let Some(image) = data.image {
            if let Some(src) = image.url.filter(|s| !s.trim().is_empty()) {
                update.media = Some(match (image.width, image.height) {
                    (Some(w), Some(h)) => Media::measured(src, w, h),
                    _ => Media::estimated(src),
                });
            }
        }

        let meaningful = update.description.is_some() || update.media.is_some();
        if meaningful {
            Ok(TierOutput::halt(update.with_quality(Quality::Full)))
        } else if !update.is_empty() {
            Ok(TierOutput::update(update.with_quality(Quality::Partial)))
        } else {
            Err(TierFailure::NoContent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_url;
    use crate::security::{ApiKey, UrlGuard};
    use crate::testing::MockHttpClient;
    use crate::tiers::shell_record;
    use crate::traits::http::Method;
    use crate::types::config::{ResolveOptions, RetryPolicy, DEFAULT_AGGREGATOR_URL};
    use serde_json::json;

    const PAGE: &str = "https://news.example.com/article-1";

    fn config(admin_only: bool) -> AggregatorConfig {
        AggregatorConfig {
            enabled: true,
            admin_only,
            api_key: Some(ApiKey::new("test-key")),
            endpoint: DEFAULT_AGGREGATOR_URL.to_string(),
        }
    }

    fn tier(admin_only: bool) -> AggregatorTier {
        AggregatorTier::new(config(admin_only), Duration::from_millis(1500))
    }

    fn record() -> MetadataRecord {
        shell_record(PAGE, &classify_url(PAGE))
    }

    #[tokio::test]
    async fn test_full_enrichment_discards_title() {
        let tier = tier(false);
        let http = MockHttpClient::new().with_json(
            &tier.request_url(PAGE),
            json!({
                "status": "success",
                "data": {
                    "title": "Headline",
                    "description": "What happened today",
                    "author": "Jane Reporter",
                    "date": "2024-05-01T10:00:00.000Z",
                    "image": { "url": "https://cdn.example.com/lead.jpg", "width": 1600, "height": 900 }
                }
            }),
        );
        let guard = UrlGuard::new();
        let ctx = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);

        let output = tier.enrich(&record(), &ctx).await.unwrap();
        assert!(output.short_circuit);
        assert_eq!(output.update.quality, Some(Quality::Full));
        assert_eq!(output.update.description.as_deref(), Some("What happened today"));
        assert_eq!(output.update.author.as_deref(), Some("Jane Reporter"));
        assert_eq!(
            output.update.published_at.as_deref(),
            Some("2024-05-01T10:00:00.000Z")
        );

        let merged = record().merge(output.update);
        assert!(merged.title.is_none());
        assert!(!merged.media.unwrap().is_estimated);
    }

    #[tokio::test]
    async fn test_sends_api_key_header() {
        let tier = tier(false);
        let url = tier.request_url(PAGE);
        let http = MockHttpClient::new().with_json(
            &url,
            json!({ "status": "success", "data": { "description": "d" } }),
        );
        let guard = UrlGuard::new();
        let ctx = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);

        tier.enrich(&record(), &ctx).await.unwrap();
        let calls = http.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Get);
        assert!(calls[0]
            .headers
            .contains(&("x-api-key".to_string(), "test-key".to_string())));
    }

    #[tokio::test]
    async fn test_title_only_is_not_meaningful() {
        let tier = tier(false);
        let http = MockHttpClient::new().with_json(
            &tier.request_url(PAGE),
            json!({ "status": "success", "data": { "title": "Headline" } }),
        );
        let guard = UrlGuard::new();
        let ctx = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);

        let err = tier.enrich(&record(), &ctx).await.unwrap_err();
        assert!(matches!(err, TierFailure::NoContent));
    }

    #[tokio::test]
    async fn test_author_only_continues_waterfall() {
        let tier = tier(false);
        let http = MockHttpClient::new().with_json(
            &tier.request_url(PAGE),
            json!({ "status": "success", "data": { "author": "Jane" } }),
        );
        let guard = UrlGuard::new();
        let ctx = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);

        let output = tier.enrich(&record(), &ctx).await.unwrap();
        assert!(!output.short_circuit);
        assert_eq!(output.update.quality, Some(Quality::Partial));
    }

    #[tokio::test]
    async fn test_failure_status_is_no_content() {
        let tier = tier(false);
        let http = MockHttpClient::new().with_json(
            &tier.request_url(PAGE),
            json!({ "status": "fail", "data": { "description": "ignored" } }),
        );
        let guard = UrlGuard::new();
        let ctx = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);

        assert!(matches!(
            tier.enrich(&record(), &ctx).await,
            Err(TierFailure::NoContent)
        ));
    }

    #[test]
    fn test_gating() {
        let http = MockHttpClient::new();
        let guard = UrlGuard::new();
        let anon = TierContext::new(&http, ResolveOptions::default(), RetryPolicy::none(), &guard);
        let admin = TierContext::new(
            &http,
            ResolveOptions::new().privileged(true),
            RetryPolicy::none(),
            &guard,
        );

        assert!(!tier(true).applies(&record(), &anon));
        assert!(tier(true).applies(&record(), &admin));
        assert!(tier(false).applies(&record(), &anon));

        let disabled = AggregatorTier::new(AggregatorConfig::default(), Duration::from_millis(1500));
        assert!(!disabled.applies(&record(), &admin));

        let keyless = AggregatorTier::new(
            AggregatorConfig {
                api_key: None,
                ..config(false)
            },
            Duration::from_millis(1500),
        );
        assert!(!keyless.applies(&record(), &admin));
    }
}
