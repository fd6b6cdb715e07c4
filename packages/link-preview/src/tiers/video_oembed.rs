//! Tier 0.6: author and thumbnail from the YouTube oEmbed endpoint.
//!
//! A successful call that yields either field ends the waterfall; the video
//! card needs nothing the later tiers could add.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::classify::platforms::{oembed_family, OEmbedFamily};
use crate::error::{TierFailure, TierResult};
use crate::tiers::endpoint_url;
use crate::traits::http::HttpRequest;
use crate::traits::tier::{Tier, TierContext, TierOutput};
use crate::types::record::{has_text, Media, MetadataRecord, Quality, RecordUpdate};

// `title` is present in the payload and intentionally not deserialized.
#[derive(Debug, Deserialize)]
struct VideoOEmbed {
    author_name: Option<String>,
    thumbnail_url: Option<String>,
    thumbnail_width: Option<u32>,
    thumbnail_height: Option<u32>,
}

pub struct VideoOEmbedTier {
    endpoint: String,
    timeout: Duration,
}

impl VideoOEmbedTier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// The oEmbed request URL for a video.
    pub fn request_url(&self, target: &str) -> String {
        endpoint_url(&self.endpoint, &[("url", target), ("format", "json")])
    }
}

#[async_trait]
impl Tier for VideoOEmbedTier {
    fn name(&self) -> &'static str {
        "video_oembed"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn applies(&self, record: &MetadataRecord, _ctx: &TierContext<'_>) -> bool {
        oembed_family(&record.domain) == Some(OEmbedFamily::YouTube)
    }

    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput> {
        let response = ctx
            .fetch(HttpRequest::get(self.request_url(&record.url)))
            .await?;
        let payload: VideoOEmbed = response.json()?;

        let mut update = RecordUpdate::new();
        if has_text(&payload.author_name) {
            update.author = payload.author_name;
        }
        if let Some(src) = payload.thumbnail_url.filter(|s| !s.trim().is_empty()) {
            let media = match (payload.thumbnail_width, payload.thumbnail_height) {
                (Some(w), Some(h)) => Media::measured(src, w, h),
                _ => Media::estimated(src),
            };
            update.media = Some(media);
        }

        if update.is_empty() {
            return Err(TierFailure::NoContent);
        }
        Ok(TierOutput::halt(update.with_quality(Quality::Partial)))
    }
}
