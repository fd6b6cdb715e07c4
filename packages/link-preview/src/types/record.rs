//! The metadata record: the resolved preview card for one URL.
//!
//! The record shape is the contract the rendering and persistence layers
//! depend on. New fields must stay optional.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default width for media whose real size is not yet known.
pub const ESTIMATED_WIDTH: u32 = 1200;

/// Default height for media whose real size is not yet known.
pub const ESTIMATED_HEIGHT: u32 = 628;

/// Aspect ratio assumed for media until a probe confirms otherwise.
pub const DEFAULT_ASPECT_RATIO: f64 = 1.91;

/// Coarse content category, decided once by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
    Social,
    Image,
    Document,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Video => "video",
            Self::Social => "social",
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much enrichment succeeded.
///
/// Ordered so that `Fallback < Partial < Full`; merging only ever raises it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Fallback,
    Partial,
    Full,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fallback => "fallback",
            Self::Partial => "partial",
            Self::Full => "full",
        })
    }
}

/// How the renderer should fit the image into the card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Fill the frame, cropping as needed (landscape and square images)
    #[default]
    Cover,
    /// Letterbox inside the frame (portrait images)
    Contain,
}

impl RenderMode {
    /// Pick a render mode for a measured aspect ratio.
    pub fn for_aspect_ratio(aspect_ratio: f64) -> Self {
        if aspect_ratio < 1.0 {
            Self::Contain
        } else {
            Self::Cover
        }
    }
}

/// Preview image attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub render_mode: RenderMode,
    /// True while the dimensions are assumed rather than confirmed.
    pub is_estimated: bool,
}

impl Media {
    /// Media with default dimensions, pending confirmation by the probe tier.
    pub fn estimated(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            width: ESTIMATED_WIDTH,
            height: ESTIMATED_HEIGHT,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            render_mode: RenderMode::Cover,
            is_estimated: true,
        }
    }

    /// Estimated media that takes size hints (e.g. `og:image:width`) when both are usable.
    ///
    /// Hints are declared by the page, not measured, so the result stays estimated.
    pub fn estimated_with_hints(
        src: impl Into<String>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Self {
        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => {
                let aspect_ratio = aspect_ratio(w, h);
                Self {
                    src: src.into(),
                    width: w,
                    height: h,
                    aspect_ratio,
                    render_mode: RenderMode::for_aspect_ratio(aspect_ratio),
                    is_estimated: true,
                }
            }
            _ => Self::estimated(src),
        }
    }

    /// Media with confirmed dimensions.
    ///
    /// Falls back to [`Media::estimated`] if either dimension is zero.
    pub fn measured(src: impl Into<String>, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::estimated(src);
        }
        let aspect_ratio = aspect_ratio(width, height);
        Self {
            src: src.into(),
            width,
            height,
            aspect_ratio,
            render_mode: RenderMode::for_aspect_ratio(aspect_ratio),
            is_estimated: false,
        }
    }
}

/// Width / height rounded to two decimals.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return DEFAULT_ASPECT_RATIO;
    }
    (f64::from(width) / f64::from(height) * 100.0).round() / 100.0
}

/// Where the link points, for the card's attribution line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_color: Option<String>,
}

/// The resolved preview card for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub url: String,
    pub domain: String,
    pub content_type: ContentType,
    /// Never assigned by the engine. Titles come only from explicit user action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    pub source: SourceInfo,
    pub quality: Quality,
}

impl MetadataRecord {
    /// Fold a tier's partial update into this record.
    ///
    /// Populated text fields are overwritten only by non-blank values, media is
    /// replaced wholesale, and quality never decreases.
    pub fn merge(mut self, update: RecordUpdate) -> Self {
        merge_text(&mut self.description, update.description);
        merge_text(&mut self.author, update.author);
        merge_text(&mut self.published_at, update.published_at);
        if let Some(media) = update.media {
            self.media = Some(media);
        }
        if let Some(quality) = update.quality {
            self.quality = self.quality.max(quality);
        }
        self
    }

    /// Whether the record carries media that still needs probing.
    pub fn has_estimated_media(&self) -> bool {
        self.media.as_ref().is_some_and(|m| m.is_estimated)
    }
}

fn merge_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *slot = Some(trimmed.to_string());
        }
    }
}

/// A partial update produced by one tier.
///
/// There is deliberately no `title` field: no tier can set a title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub media: Option<Media>,
    pub quality: Option<Quality>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// True if the update carries no field values (quality alone doesn't count).
    pub fn is_empty(&self) -> bool {
        !has_text(&self.description)
            && !has_text(&self.author)
            && !has_text(&self.published_at)
            && self.media.is_none()
    }
}

/// Some and not blank.
pub(crate) fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MetadataRecord {
        MetadataRecord {
            url: "https://news.example.com/a".into(),
            domain: "news.example.com".into(),
            content_type: ContentType::Article,
            title: None,
            description: None,
            author: None,
            published_at: None,
            media: None,
            source: SourceInfo {
                name: "news.example.com".into(),
                domain: "news.example.com".into(),
                platform_color: None,
            },
            quality: Quality::Fallback,
        }
    }

    #[test]
    fn test_merge_never_unsets_populated_field() {
        let merged = record()
            .merge(RecordUpdate::new().with_author("Ada"))
            .merge(RecordUpdate::new().with_author("   "));
        assert_eq!(merged.author.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_merge_later_tier_overwrites() {
        let merged = record()
            .merge(RecordUpdate::new().with_description("first"))
            .merge(RecordUpdate::new().with_description("second"));
        assert_eq!(merged.description.as_deref(), Some("second"));
    }

    #[test]
    fn test_quality_never_decreases() {
        let merged = record()
            .merge(RecordUpdate::new().with_quality(Quality::Full))
            .merge(RecordUpdate::new().with_quality(Quality::Partial));
        assert_eq!(merged.quality, Quality::Full);
    }

    #[test]
    fn test_measured_media_render_mode() {
        let landscape = Media::measured("a.png", 1600, 900);
        assert_eq!(landscape.aspect_ratio, 1.78);
        assert_eq!(landscape.render_mode, RenderMode::Cover);
        assert!(!landscape.is_estimated);

        let portrait = Media::measured("b.png", 600, 900);
        assert_eq!(portrait.aspect_ratio, 0.67);
        assert_eq!(portrait.render_mode, RenderMode::Contain);
    }

    #[test]
    fn test_zero_dimensions_stay_estimated() {
        let media = Media::measured("c.png", 0, 400);
        assert!(media.is_estimated);
        assert_eq!(media.aspect_ratio, DEFAULT_ASPECT_RATIO);
    }

    #[test]
    fn test_estimated_hints_keep_flag() {
        let media = Media::estimated_with_hints("d.png", Some(800), Some(800));
        assert!(media.is_estimated);
        assert_eq!(media.aspect_ratio, 1.0);

        let media = Media::estimated_with_hints("d.png", Some(800), None);
        assert_eq!(media.width, ESTIMATED_WIDTH);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut r = record();
        r.media = Some(Media::estimated("https://cdn.example.com/x.jpg"));
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["contentType"], "article");
        assert_eq!(json["quality"], "fallback");
        assert_eq!(json["media"]["aspectRatio"], 1.91);
        assert_eq!(json["media"]["renderMode"], "cover");
        assert_eq!(json["media"]["isEstimated"], true);
        assert!(json.get("title").is_none());
        assert!(json["source"].get("platformColor").is_none());
    }
}
