//! Tier 0.5: author enrichment from the X/Twitter oEmbed endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::classify::platforms::{oembed_family, OEmbedFamily};
use crate::error::{TierFailure, TierResult};
use crate::tiers::endpoint_url;
use crate::traits::http::HttpRequest;
use crate::traits::tier::{Tier, TierContext, TierOutput};
use crate::types::record::{MetadataRecord, Quality, RecordUpdate};

#[derive(Debug, Deserialize)]
struct SocialOEmbed {
    author_name: Option<String>,
}

/// Sets `author` only. Everything else in the oEmbed payload is ignored.
pub struct SocialOEmbedTier {
    endpoint: String,
    timeout: Duration,
}

impl SocialOEmbedTier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// The oEmbed request URL for a post.
    pub fn request_url(&self, target: &str) -> String {
        endpoint_url(&self.endpoint, &[("url", target), ("omit_script", "true")])
    }
}

#[async_trait]
impl Tier for SocialOEmbedTier {
    fn name(&self) -> &'static str {
        "social_oembed"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn applies(&self, record: &MetadataRecord, _ctx: &TierContext<'_>) -> bool {
        oembed_family(&record.domain) == Some(OEmbedFamily::Twitter)
    }

    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput> {
        let response = ctx
            .fetch(HttpRequest::get(self.request_url(&record.url)))
            .await?;
        let payload: SocialOEmbed = response.json()?;

        match payload.author_name.filter(|a| !a.trim().is_empty()) {
            Some(author) => Ok(TierOutput::update(
                RecordUpdate::new()
                    .with_author(author)
                    .with_quality(Quality::Partial),
            )),
            None => Err(TierFailure::NoContent),
        }
    }
}
