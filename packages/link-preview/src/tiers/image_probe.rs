//! Tier 3: image dimension probe.
//!
//! A HEAD request checks the declared size first. Images above the ceiling
//! are never fetched. Otherwise a ranged GET reads at most `read_limit` bytes
//! and the `image` crate decodes the dimensions from the header alone.

use async_trait::async_trait;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

use crate::error::{FetchError, TierFailure, TierResult};
use crate::traits::http::HttpRequest;
use crate::traits::tier::{Tier, TierContext, TierOutput};
use crate::types::record::{Media, MetadataRecord, RecordUpdate};

pub struct ImageProbeTier {
    timeout: Duration,
    max_image_bytes: u64,
    read_limit: u64,
}

impl ImageProbeTier {
    pub fn new(timeout: Duration, max_image_bytes: u64, read_limit: u64) -> Self {
        Self {
            timeout,
            max_image_bytes,
            read_limit: read_limit.max(1),
        }
    }
}

/// Decode width and height from the leading bytes of an image.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), FetchError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .into_dimensions()
        .map_err(|e| FetchError::Parse(e.to_string()))
}

#[async_trait]
impl Tier for ImageProbeTier {
    fn name(&self) -> &'static str {
        "image_probe"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn applies(&self, record: &MetadataRecord, _ctx: &TierContext<'_>) -> bool {
        record.has_estimated_media()
    }

    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput> {
        let Some(src) = record.media.as_ref().map(|m| m.src.clone()) else {
            return Err(TierFailure::NoContent);
        };

        let head = ctx.fetch_guarded(HttpRequest::head(&src)).await?;
        if let Some(size) = head.content_length() {
            if size > self.max_image_bytes {
                return Err(TierFailure::ImageTooLarge {
                    size,
                    limit: self.max_image_bytes,
                });
            }
        }

        let request = HttpRequest::get(&src)
            .with_header("range", format!("bytes=0-{}", self.read_limit - 1))
            .with_max_bytes(self.read_limit);
        let body = ctx.fetch_guarded(request).await?.body;

        let (width, height) = probe_dimensions(&body)?;
        debug!(src = %src, width, height, "image probed");

        let media = Media::measured(src, width, height);
        if media.is_estimated {
            return Err(TierFailure::NoContent);
        }
        Ok(TierOutput::update(RecordUpdate::new().with_media(media)))
    }
}
