//! URL classification.
//!
//! Maps a raw URL string to a normalized domain and a [`ContentType`]. Pure
//! and deterministic: no I/O, and the same input always yields the same
//! output. Malformed input never fails; it falls back to the
//! [`UNKNOWN_DOMAIN`] sentinel and substring heuristics.
//!
//! Rules, first match wins:
//!
//! 1. video platform host → [`ContentType::Video`]
//! 2. social platform host → [`ContentType::Social`]
//! 3. image file extension, or an image CDN host with image transform query
//!    parameters or a non-HTML path → [`ContentType::Image`]
//! 4. document file extension → [`ContentType::Document`]
//! 5. otherwise → [`ContentType::Article`]

pub mod platforms;

use url::Url;

use crate::types::record::ContentType;
use platforms::{host_matches, PlatformCategory};

/// Domain reported for input that cannot be parsed as a URL.
pub const UNKNOWN_DOMAIN: &str = "unknown";

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "bmp", "ico", "tif", "tiff", "heic",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "ods", "odp", "rtf", "epub",
];

const HTML_EXTENSIONS: &[&str] = &["html", "htm", "shtml", "php", "asp", "aspx", "jsp"];

/// Query keys used by image CDNs for on-the-fly transforms.
const IMAGE_QUERY_KEYS: &[&str] = &[
    "fm", "format", "w", "h", "width", "height", "fit", "crop", "auto", "dpr", "q", "quality",
    "resize",
];

/// Hosts (and their subdomains) that serve images from extension-less paths.
const IMAGE_CDN_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "i.imgur.com",
    "pbs.twimg.com",
    "imgix.net",
    "res.cloudinary.com",
    "i.ytimg.com",
    "ggpht.com",
    "googleusercontent.com",
    "i0.wp.com",
    "i1.wp.com",
    "i2.wp.com",
    "cdn.sanity.io",
    "media.giphy.com",
];

/// Leading labels that mark a host as an asset server (`cdn.example.com`).
const IMAGE_CDN_LABELS: &[&str] = &["img", "images", "image", "cdn"];

/// Result of classifying one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Lowercase host with any leading `www.` removed, or [`UNKNOWN_DOMAIN`].
    pub domain: String,
    pub content_type: ContentType,
}

/// Classify a URL string.
pub fn classify_url(raw: &str) -> Classification {
    match parse_lenient(raw) {
        Some(url) => classify_parsed(&url),
        None => classify_unparsed(raw),
    }
}

/// Parse as-is, then with an `https://` prefix. Only URLs with a host count.
pub(crate) fn parse_lenient(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        if url.host_str().is_some_and(|h| !h.is_empty()) {
            return Some(url);
        }
    }
    if trimmed.contains("://") {
        return None;
    }
    Url::parse(&format!("https://{trimmed}"))
        .ok()
        .filter(|url| url.host_str().is_some_and(|h| h.contains('.') || h == "localhost"))
}

/// Lowercase, strip one leading `www.` and any trailing dot.
pub fn normalize_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => host,
    }
}

fn classify_parsed(url: &Url) -> Classification {
    let domain = url
        .host_str()
        .map(normalize_domain)
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string());
    let path = url.path().to_lowercase();
    let query_keys: Vec<String> = url
        .query_pairs()
        .map(|(k, _)| k.to_lowercase())
        .collect();

    let content_type = classify_parts(&domain, &path, |key| {
        query_keys.iter().any(|k| k == key)
    });
    Classification {
        domain,
        content_type,
    }
}

/// Best effort for strings `Url` rejects: pull out something host-shaped and
/// apply the same rules to it.
fn classify_unparsed(raw: &str) -> Classification {
    let lower = raw.trim().to_lowercase();
    let after_scheme = lower.split_once("://").map_or(lower.as_str(), |(_, rest)| rest);
    let (host_part, rest) = match after_scheme.find(['/', '?', '#']) {
        Some(idx) => after_scheme.split_at(idx),
        None => (after_scheme, ""),
    };
    let host = host_part
        .rsplit('@')
        .next()
        .unwrap_or(host_part)
        .split(':')
        .next()
        .unwrap_or_default();
    let host = normalize_domain(host);

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };
    let path = path.split('#').next().unwrap_or_default();
    let query = query.split('#').next().unwrap_or_default();

    let content_type = classify_parts(&host, path, |key| {
        query
            .split('&')
            .any(|pair| pair.split('=').next().is_some_and(|k| k == key))
    });
    Classification {
        domain: UNKNOWN_DOMAIN.to_string(),
        content_type,
    }
}

fn classify_parts(host: &str, path: &str, has_query_key: impl Fn(&str) -> bool) -> ContentType {
    if let Some(platform) = platforms::lookup(host) {
        match platform.category {
            PlatformCategory::Video => return ContentType::Video,
            PlatformCategory::Social => return ContentType::Social,
            PlatformCategory::Other => {}
        }
    }

    let extension = path_extension(path);
    let ext_in = |list: &[&str]| extension.is_some_and(|ext| list.contains(&ext));

    if ext_in(IMAGE_EXTENSIONS) {
        return ContentType::Image;
    }
    // A CDN path with a non-image file extension is not an image.
    let foreign_extension = extension.is_some_and(|ext| !HTML_EXTENSIONS.contains(&ext));
    if !foreign_extension && is_image_cdn(host) {
        let transform_query = IMAGE_QUERY_KEYS.iter().any(|&key| has_query_key(key));
        if transform_query || !looks_like_html(path, extension) {
            return ContentType::Image;
        }
    }
    if ext_in(DOCUMENT_EXTENSIONS) {
        return ContentType::Document;
    }
    ContentType::Article
}

/// Extension of the last path segment, if any.
fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

fn looks_like_html(path: &str, extension: Option<&str>) -> bool {
    path.is_empty()
        || path.ends_with('/')
        || extension.is_some_and(|ext| HTML_EXTENSIONS.contains(&ext))
}

fn is_image_cdn(host: &str) -> bool {
    if IMAGE_CDN_HOSTS.iter().any(|cdn| host_matches(host, cdn)) {
        return true;
    }
    let mut labels = host.split('.');
    let first = labels.next().unwrap_or_default();
    // Needs a registrable domain after the label: `cdn.example.com`, not `cdn.com`.
    IMAGE_CDN_LABELS.contains(&first) && labels.count() >= 2
}
