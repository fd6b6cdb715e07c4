//! Enrichment tiers, in waterfall order.
//!
//! - [`shell`] - Tier 0, the local shell record (no I/O)
//! - [`SocialOEmbedTier`] - author from the X/Twitter oEmbed endpoint
//! - [`VideoOEmbedTier`] - author and thumbnail from the YouTube oEmbed endpoint
//! - [`AggregatorTier`] - metadata aggregator API (flagged, role-gated)
//! - [`DocumentTier`] - Open Graph / meta tag scrape of article pages
//! - [`ImageProbeTier`] - true image dimensions

pub mod aggregator;
pub mod document;
pub mod image_probe;
pub mod shell;
pub mod social_oembed;
pub mod video_oembed;

pub use aggregator::AggregatorTier;
pub use document::DocumentTier;
pub use image_probe::ImageProbeTier;
pub use shell::shell_record;
pub use social_oembed::SocialOEmbedTier;
pub use video_oembed::VideoOEmbedTier;

use crate::traits::tier::Tier;
use crate::types::config::EngineConfig;

/// The standard tier list, in execution order.
pub fn default_tiers(config: &EngineConfig) -> Vec<Box<dyn Tier>> {
    let timeouts = &config.tier_timeouts;
    vec![
        Box::new(SocialOEmbedTier::new(
            &config.social_oembed_url,
            timeouts.social_oembed,
        )),
        Box::new(VideoOEmbedTier::new(
            &config.video_oembed_url,
            timeouts.video_oembed,
        )),
        Box::new(AggregatorTier::new(
            config.aggregator.clone(),
            timeouts.aggregator,
        )),
        Box::new(DocumentTier::new(timeouts.document, config.max_page_bytes)),
        Box::new(ImageProbeTier::new(
            timeouts.image_probe,
            config.max_image_bytes,
            config.probe_read_limit,
        )),
    ]
}

/// Append URL-encoded query parameters to an endpoint.
pub(crate) fn endpoint_url(endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut url = endpoint.to_string();
    let mut sep = if endpoint.contains('?') { '&' } else { '?' };
    for (key, value) in params {
        url.push(sep);
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
        sep = '&';
    }
    url
}
