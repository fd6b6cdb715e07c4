//! Tier 2: document metadata scrape.
//!
//! Fetches an article page and reads Open Graph, Twitter Card and standard
//! meta tags. `<title>` and `og:title` are never read.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::error::{FetchError, TierFailure, TierResult};
use crate::traits::http::HttpRequest;
use crate::traits::tier::{Tier, TierContext, TierOutput};
use crate::types::record::{ContentType, Media, MetadataRecord, Quality, RecordUpdate};

const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const AUTHOR_KEYS: &[&str] = &["author", "article:author", "twitter:creator"];
const PUBLISHED_KEYS: &[&str] = &[
    "article:published_time",
    "og:published_time",
    "date",
    "datePublished",
];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:url", "twitter:image", "twitter:image:src"];

/// Metadata read from one HTML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    /// Absolute image URL
    pub image: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
}

impl PageMetadata {
    fn into_update(self) -> RecordUpdate {
        let mut update = RecordUpdate::new();
        update.description = self.description;
        update.author = self.author;
        update.published_at = self.published_at;
        update.media = self
            .image
            .map(|src| Media::estimated_with_hints(src, self.image_width, self.image_height));
        update
    }
}

/// Parse `html` and collect preview metadata. Relative image URLs are
/// resolved against `base_url`.
pub fn extract_metadata(html: &str, base_url: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let image = first_meta(&document, IMAGE_KEYS).and_then(|src| resolve_image(base_url, &src));
    let (image_width, image_height) = if image.is_some() {
        (
            first_meta(&document, &["og:image:width"]).and_then(|v| v.parse().ok()),
            first_meta(&document, &["og:image:height"]).and_then(|v| v.parse().ok()),
        )
    } else {
        (None, None)
    };

    PageMetadata {
        description: first_meta(&document, DESCRIPTION_KEYS),
        author: first_meta(&document, AUTHOR_KEYS),
        published_at: first_meta(&document, PUBLISHED_KEYS),
        image,
        image_width,
        image_height,
    }
}

/// First non-blank value among `keys`, in key order.
fn first_meta(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta_value(document, key))
}

fn meta_value(document: &Html, key: &str) -> Option<String> {
    let selector = Selector::parse(&format!(
        r#"meta[property="{key}"], meta[name="{key}"], [itemprop="{key}"]"#
    ))
    .ok()?;
    document.select(&selector).find_map(|el| {
        let attrs = el.value();
        attrs
            .attr("content")
            .or_else(|| attrs.attr("datetime"))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}

fn resolve_image(base_url: &str, src: &str) -> Option<String> {
    let resolved = match Url::parse(src) {
        Ok(url) => url,
        Err(_) => Url::parse(base_url).ok()?.join(src).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        }
        // Missing header: let the parser decide.
        None => true,
    }
}

/// Scrapes article pages for description, author, date and image.
pub struct DocumentTier {
    timeout: Duration,
    max_bytes: u64,
}

impl DocumentTier {
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        Self { timeout, max_bytes }
    }
}

#[async_trait]
impl Tier for DocumentTier {
    fn name(&self) -> &'static str {
        "document"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn applies(&self, record: &MetadataRecord, _ctx: &TierContext<'_>) -> bool {
        record.content_type == ContentType::Article
    }

    async fn enrich(
        &self,
        record: &MetadataRecord,
        ctx: &TierContext<'_>,
    ) -> TierResult<TierOutput> {
        let request = HttpRequest::get(&record.url)
            .with_header("accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .with_max_bytes(self.max_bytes);
        let response = ctx.fetch_guarded(request).await?;

        if !is_html(response.content_type()) {
            return Err(FetchError::Parse(format!(
                "expected HTML, got {}",
                response.content_type().unwrap_or_default()
            ))
            .into());
        }

        let base_url = response.final_url.as_deref().unwrap_or(&record.url);
        let update = extract_metadata(&response.text(), base_url).into_update();
        if update.is_empty() {
            return Err(TierFailure::NoContent);
        }
        Ok(TierOutput::update(update.with_quality(Quality::Partial)))
    }
}
