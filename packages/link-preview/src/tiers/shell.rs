//! Tier 0: the shell record.
//!
//! Built locally from the classification alone, so every resolution has a
//! usable record before any network call is made.

use url::Url;

use crate::classify::{parse_lenient, platforms, Classification};
use crate::types::record::{ContentType, Media, MetadataRecord, Quality};

/// Build the shell record for `url`, with platform media defaults applied.
pub fn shell_record(url: &str, classification: &Classification) -> MetadataRecord {
    let parsed = parse_lenient(url);
    let media = match classification.content_type {
        ContentType::Video => parsed
            .as_ref()
            .and_then(youtube_video_id)
            .map(|id| Media::estimated(youtube_thumbnail(&id))),
        ContentType::Image => parsed.as_ref().map(|u| Media::estimated(u.as_str())),
        _ => None,
    };

    MetadataRecord {
        url: url.to_string(),
        domain: classification.domain.clone(),
        content_type: classification.content_type,
        title: None,
        description: None,
        author: None,
        published_at: None,
        media,
        source: platforms::source_for(&classification.domain),
        quality: Quality::Fallback,
    }
}

/// Predictable thumbnail for a YouTube video id.
pub fn youtube_thumbnail(id: &str) -> String {
    format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg")
}

/// Extract the video id from the YouTube URL shapes in common use.
pub fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if platforms::host_matches(host, "youtube.com")
        || platforms::host_matches(host, "youtube-nocookie.com")
    {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts" | "embed" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_video_id(id))
}

// Ids are 11 characters from the URL-safe base64 alphabet.
fn is_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_url;

    fn id(url: &str) -> Option<String> {
        youtube_video_id(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_youtube_id_shapes() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"), expected);
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ?si=abc"), expected);
        assert_eq!(id("https://youtube.com/shorts/dQw4w9WgXcQ"), expected);
        assert_eq!(id("https://www.youtube.com/embed/dQw4w9WgXcQ"), expected);
        assert_eq!(id("https://m.youtube.com/live/dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn test_youtube_id_rejects_junk() {
        assert_eq!(id("https://www.youtube.com/watch?v=abc"), None);
        assert_eq!(id("https://www.youtube.com/@channel"), None);
        assert_eq!(id("https://vimeo.com/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_video_shell_has_estimated_thumbnail() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        let record = shell_record(url, &classify_url(url));

        let media = record.media.unwrap();
        assert_eq!(media.src, "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg");
        assert!(media.is_estimated);
        assert_eq!(record.source.name, "YouTube");
        assert_eq!(record.quality, Quality::Fallback);
        assert!(record.title.is_none());
    }

    #[test]
    fn test_image_shell_uses_url_as_media() {
        let url = "https://cdn.example.com/img.jpg?fm=webp";
        let record = shell_record(url, &classify_url(url));
        assert_eq!(record.content_type, ContentType::Image);
        assert_eq!(record.media.unwrap().src, url);
    }

    #[test]
    fn test_article_shell_is_bare() {
        let url = "https://news.example.com/article-1";
        let record = shell_record(url, &classify_url(url));
        assert_eq!(record.domain, "news.example.com");
        assert!(record.media.is_none());
        assert!(record.description.is_none());
        assert_eq!(record.source.name, "news.example.com");
    }

    #[test]
    fn test_malformed_url_shell() {
        let record = shell_record("::::", &classify_url("::::"));
        assert_eq!(record.domain, "unknown");
        assert_eq!(record.content_type, ContentType::Article);
        assert_eq!(record.url, "::::");
    }
}
