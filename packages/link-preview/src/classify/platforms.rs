//! Static table of known platforms.
//!
//! Drives both classification (video and social hosts) and the `source`
//! attribution on every record.

use crate::types::record::SourceInfo;

/// Which classification rule a platform's hosts trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCategory {
    Video,
    Social,
    Other,
}

/// oEmbed provider family a platform belongs to, if the engine queries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OEmbedFamily {
    /// X / Twitter, queried by the social oEmbed tier
    Twitter,
    /// YouTube, queried by the video oEmbed tier
    YouTube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub name: &'static str,
    /// Registrable hosts; subdomains match too
    pub hosts: &'static [&'static str],
    pub color: &'static str,
    pub category: PlatformCategory,
    pub oembed: Option<OEmbedFamily>,
}

impl Platform {
    fn matches(&self, domain: &str) -> bool {
        self.hosts.iter().any(|host| host_matches(domain, host))
    }
}

/// `domain` equals `host` or is a subdomain of it.
pub(crate) fn host_matches(domain: &str, host: &str) -> bool {
    domain == host
        || domain
            .strip_suffix(host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

pub static PLATFORMS: &[Platform] = &[
    Platform {
        name: "YouTube",
        hosts: &["youtube.com", "youtu.be", "youtube-nocookie.com"],
        color: "#FF0000",
        category: PlatformCategory::Video,
        oembed: Some(OEmbedFamily::YouTube),
    },
    Platform {
        name: "Vimeo",
        hosts: &["vimeo.com"],
        color: "#1AB7EA",
        category: PlatformCategory::Video,
        oembed: None,
    },
    Platform {
        name: "Twitch",
        hosts: &["twitch.tv"],
        color: "#9146FF",
        category: PlatformCategory::Video,
        oembed: None,
    },
    Platform {
        name: "Dailymotion",
        hosts: &["dailymotion.com", "dai.ly"],
        color: "#0066DC",
        category: PlatformCategory::Video,
        oembed: None,
    },
    Platform {
        name: "TikTok",
        hosts: &["tiktok.com"],
        color: "#000000",
        category: PlatformCategory::Video,
        oembed: None,
    },
    Platform {
        name: "X",
        hosts: &["x.com", "twitter.com"],
        color: "#000000",
        category: PlatformCategory::Social,
        oembed: Some(OEmbedFamily::Twitter),
    },
    Platform {
        name: "Instagram",
        hosts: &["instagram.com"],
        color: "#E4405F",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "Facebook",
        hosts: &["facebook.com", "fb.com", "fb.watch"],
        color: "#1877F2",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "Threads",
        hosts: &["threads.net"],
        color: "#000000",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "LinkedIn",
        hosts: &["linkedin.com"],
        color: "#0A66C2",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "Reddit",
        hosts: &["reddit.com", "redd.it"],
        color: "#FF4500",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "Bluesky",
        hosts: &["bsky.app"],
        color: "#0085FF",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "Mastodon",
        hosts: &["mastodon.social"],
        color: "#6364FF",
        category: PlatformCategory::Social,
        oembed: None,
    },
    Platform {
        name: "GitHub",
        hosts: &["github.com"],
        color: "#181717",
        category: PlatformCategory::Other,
        oembed: None,
    },
    Platform {
        name: "Medium",
        hosts: &["medium.com"],
        color: "#000000",
        category: PlatformCategory::Other,
        oembed: None,
    },
    Platform {
        name: "Substack",
        hosts: &["substack.com"],
        color: "#FF6719",
        category: PlatformCategory::Other,
        oembed: None,
    },
    Platform {
        name: "Wikipedia",
        hosts: &["wikipedia.org"],
        color: "#000000",
        category: PlatformCategory::Other,
        oembed: None,
    },
];

/// Find the platform a domain belongs to.
pub fn lookup(domain: &str) -> Option<&'static Platform> {
    PLATFORMS.iter().find(|p| p.matches(domain))
}

/// Attribution for a domain: the platform entry, or the domain itself.
pub fn source_for(domain: &str) -> SourceInfo {
    match lookup(domain) {
        Some(platform) => SourceInfo {
            name: platform.name.to_string(),
            domain: domain.to_string(),
            platform_color: Some(platform.color.to_string()),
        },
        None => SourceInfo {
            name: domain.to_string(),
            domain: domain.to_string(),
            platform_color: None,
        },
    }
}

/// The oEmbed family for a domain, if any.
pub fn oembed_family(domain: &str) -> Option<OEmbedFamily> {
    lookup(domain).and_then(|p| p.oembed)
}
