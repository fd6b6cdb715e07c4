//! End-to-end resolution through the standard tier list.
//!
//! Each test wires a [`Resolver`] to the mock transport and a real
//! [`MemoryCache`], so tier ordering, gating and caching are exercised
//! together.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use link_preview::testing::{MockFailure, MockHttpClient};
use link_preview::tiers::shell::youtube_thumbnail;
use link_preview::tiers::{AggregatorTier, SocialOEmbedTier, VideoOEmbedTier};
use link_preview::types::config::{DEFAULT_SOCIAL_OEMBED_URL, DEFAULT_VIDEO_OEMBED_URL};
use link_preview::types::record::DEFAULT_ASPECT_RATIO;
use link_preview::{
    ContentType, EngineConfig, HttpResponse, MemoryCache, Method, MetadataRecord, Quality,
    RenderMode, ResolveOptions, Resolver,
};
use serde_json::json;

const ARTICLE: &str = "https://news.example.com/2024/05/city-budget";
const LEAD_IMAGE: &str = "https://news.example.com/images/lead.png";
const VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const TWEET: &str = "https://x.com/jack/status/20";

const ARTICLE_HTML: &str = r#"<!doctype html>
<html><head>
  <title>City passes budget</title>
  <meta property="og:title" content="City passes budget">
  <meta property="og:description" content="Council approves spending plan">
  <meta name="author" content="Jane Reporter">
  <meta property="article:published_time" content="2024-05-01T10:00:00Z">
  <meta property="og:image" content="/images/lead.png">
</head><body></body></html>"#;

fn resolver(http: MockHttpClient, config: EngineConfig) -> Resolver<MockHttpClient, MemoryCache> {
    let cache = MemoryCache::new(config.cache_capacity, config.cache_ttl);
    Resolver::with_config(http, cache, config)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn small_image(http: MockHttpClient, url: &str, width: u32, height: u32) -> MockHttpClient {
    http.with_response(
        Method::Head,
        url,
        HttpResponse::new(200, "").with_header("content-length", "40000"),
    )
    .with_response(Method::Get, url, HttpResponse::new(200, png(width, height)))
}

fn assert_quality_claims_hold(record: &MetadataRecord) {
    assert!(record.title.is_none(), "title set for {}", record.url);
    if record.quality == Quality::Full {
        assert!(record.description.is_some() || record.media.is_some());
    }
}

#[tokio::test]
async fn test_article_scraped_and_image_measured() {
    let http = small_image(
        MockHttpClient::new().with_html(ARTICLE, ARTICLE_HTML),
        LEAD_IMAGE,
        1000,
        1000,
    );
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(ARTICLE, ResolveOptions::default()).await;

    assert_eq!(record.content_type, ContentType::Article);
    assert_eq!(record.domain, "news.example.com");
    assert_eq!(record.description.as_deref(), Some("Council approves spending plan"));
    assert_eq!(record.author.as_deref(), Some("Jane Reporter"));
    assert_eq!(record.published_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(record.quality, Quality::Partial);
    assert!(record.title.is_none());

    let media = record.media.unwrap();
    assert_eq!(media.src, LEAD_IMAGE);
    assert!(!media.is_estimated);
    assert_eq!(media.aspect_ratio, 1.0);
    assert_eq!(media.render_mode, RenderMode::Cover);
}

#[tokio::test]
async fn test_oversized_image_keeps_estimate() {
    let http = MockHttpClient::new()
        .with_html(ARTICLE, ARTICLE_HTML)
        .with_response(
            Method::Head,
            LEAD_IMAGE,
            HttpResponse::new(200, "").with_header("content-length", "6000000"),
        )
        .with_response(Method::Get, LEAD_IMAGE, HttpResponse::new(200, png(10, 10)));
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(ARTICLE, ResolveOptions::default()).await;

    let media = record.media.unwrap();
    assert!(media.is_estimated);
    assert_eq!(media.aspect_ratio, DEFAULT_ASPECT_RATIO);
    assert_eq!(media.render_mode, RenderMode::Cover);
    assert_eq!(resolver.http().calls_to(Method::Get, LEAD_IMAGE), 0);
}

#[tokio::test]
async fn test_video_oembed_ends_waterfall() {
    let oembed = VideoOEmbedTier::new(DEFAULT_VIDEO_OEMBED_URL, Duration::from_secs(1));
    let http = MockHttpClient::new().with_json(
        &oembed.request_url(VIDEO),
        json!({
            "title": "Never Gonna Give You Up",
            "author_name": "Rick Astley",
            "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
            "thumbnail_width": 480,
            "thumbnail_height": 360
        }),
    );
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(VIDEO, ResolveOptions::default()).await;

    assert_eq!(record.content_type, ContentType::Video);
    assert_eq!(record.author.as_deref(), Some("Rick Astley"));
    assert_eq!(record.quality, Quality::Partial);
    assert_eq!(record.source.name, "YouTube");
    assert!(record.title.is_none());
    assert!(!record.media.unwrap().is_estimated);
    // Only the oEmbed request: no probe after the short-circuit.
    assert_eq!(resolver.http().call_count(), 1);
}

#[tokio::test]
async fn test_video_oembed_down_keeps_shell_thumbnail() {
    let oembed = VideoOEmbedTier::new(DEFAULT_VIDEO_OEMBED_URL, Duration::from_secs(1));
    let thumbnail = youtube_thumbnail("dQw4w9WgXcQ");
    let http = MockHttpClient::new()
        .with_get_failure(&oembed.request_url(VIDEO), MockFailure::Status(500))
        .with_head_failure(&thumbnail, MockFailure::Status(404));
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(VIDEO, ResolveOptions::default()).await;

    assert_eq!(record.quality, Quality::Fallback);
    let media = record.media.unwrap();
    assert_eq!(media.src, thumbnail);
    assert!(media.is_estimated);
    assert_eq!(media.aspect_ratio, DEFAULT_ASPECT_RATIO);
}

#[tokio::test]
async fn test_social_oembed_adds_author_only() {
    let oembed = SocialOEmbedTier::new(DEFAULT_SOCIAL_OEMBED_URL, Duration::from_millis(800));
    let http = MockHttpClient::new().with_json(
        &oembed.request_url(TWEET),
        json!({ "author_name": "jack", "html": "<blockquote>just setting up my twttr</blockquote>" }),
    );
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(TWEET, ResolveOptions::default()).await;

    assert_eq!(record.content_type, ContentType::Social);
    assert_eq!(record.author.as_deref(), Some("jack"));
    assert!(record.description.is_none());
    assert_eq!(record.quality, Quality::Partial);
    assert_eq!(resolver.http().call_count(), 1);
}

#[tokio::test]
async fn test_admin_only_aggregator_requires_privilege() {
    let config = EngineConfig::default().with_aggregator("secret-key", true);
    let aggregator = AggregatorTier::new(config.aggregator.clone(), Duration::from_millis(1500));
    let aggregator_url = aggregator.request_url(ARTICLE);
    let http = MockHttpClient::new()
        .with_json(
            &aggregator_url,
            json!({
                "status": "success",
                "data": {
                    "title": "Aggregated headline",
                    "description": "Aggregated summary",
                    "image": { "url": LEAD_IMAGE, "width": 1200, "height": 630 }
                }
            }),
        )
        .with_html(ARTICLE, ARTICLE_HTML);
    let resolver = resolver(http, config);

    let anonymous = resolver
        .resolve(ARTICLE, ResolveOptions::new().bypass_cache(true))
        .await;
    assert_eq!(resolver.http().calls_to(Method::Get, &aggregator_url), 0);
    assert_eq!(anonymous.description.as_deref(), Some("Council approves spending plan"));

    resolver.http().reset_calls();
    let admin = resolver
        .resolve(
            ARTICLE,
            ResolveOptions::new().privileged(true).bypass_cache(true),
        )
        .await;
    assert_eq!(resolver.http().calls_to(Method::Get, &aggregator_url), 1);
    assert_eq!(resolver.http().calls_to(Method::Get, ARTICLE), 0);
    assert_eq!(admin.quality, Quality::Full);
    assert_eq!(admin.description.as_deref(), Some("Aggregated summary"));
    assert!(admin.title.is_none());
    assert_quality_claims_hold(&admin);
}

#[tokio::test]
async fn test_repeat_resolution_served_from_cache() {
    let http = small_image(
        MockHttpClient::new().with_html(ARTICLE, ARTICLE_HTML),
        LEAD_IMAGE,
        800,
        400,
    );
    let resolver = resolver(http, EngineConfig::default());

    let first = resolver.resolve(ARTICLE, ResolveOptions::default()).await;
    let calls = resolver.http().call_count();
    let second = resolver.resolve(ARTICLE, ResolveOptions::default()).await;

    assert_eq!(first, second);
    assert_eq!(resolver.http().call_count(), calls);

    resolver
        .resolve(ARTICLE, ResolveOptions::new().bypass_cache(true))
        .await;
    assert!(resolver.http().call_count() > calls);
}

#[tokio::test]
async fn test_failures_are_cached_too() {
    let http = MockHttpClient::new().with_get_failure(ARTICLE, MockFailure::Status(503));
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(ARTICLE, ResolveOptions::default()).await;
    assert_eq!(record.quality, Quality::Fallback);
    assert_eq!(resolver.cache().len(), 1);

    let calls = resolver.http().call_count();
    resolver.resolve(ARTICLE, ResolveOptions::default()).await;
    assert_eq!(resolver.http().call_count(), calls);
}

#[tokio::test]
async fn test_titles_never_populated() {
    let pdf = "https://example.org/annual-report.pdf";
    let image = "https://images.example.com/photos/cat.png";
    let http = small_image(
        MockHttpClient::new().with_html(ARTICLE, ARTICLE_HTML),
        LEAD_IMAGE,
        640,
        480,
    );
    let http = small_image(http, image, 300, 600);
    let resolver = resolver(http, EngineConfig::default());

    for url in [ARTICLE, VIDEO, TWEET, pdf, image, "not a url at all"] {
        let record = resolver.resolve(url, ResolveOptions::default()).await;
        assert_quality_claims_hold(&record);
    }
}

#[tokio::test]
async fn test_unparseable_input_still_returns_card() {
    let resolver = resolver(MockHttpClient::new(), EngineConfig::default());

    let record = resolver
        .resolve("::: definitely not a url", ResolveOptions::default())
        .await;

    assert_eq!(record.domain, "unknown");
    assert_eq!(record.content_type, ContentType::Article);
    assert_eq!(record.quality, Quality::Fallback);
    assert_eq!(resolver.http().call_count(), 0);
}

#[tokio::test]
async fn test_private_targets_never_fetched() {
    let url = "http://10.0.0.5/internal/report";
    let http = MockHttpClient::new().with_html(url, ARTICLE_HTML);
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver.resolve(url, ResolveOptions::default()).await;

    assert_eq!(record.quality, Quality::Fallback);
    assert!(record.description.is_none());
    assert_eq!(resolver.http().call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_tiers_bounded_by_timeouts() {
    let config = EngineConfig::default().with_aggregator("secret-key", false);
    let aggregator = AggregatorTier::new(config.aggregator.clone(), Duration::from_millis(1500));
    let aggregator_url = aggregator.request_url(ARTICLE);
    let http = MockHttpClient::new()
        .with_json(&aggregator_url, json!({ "status": "success", "data": {} }))
        .with_latency(Method::Get, &aggregator_url, Duration::from_secs(30))
        .with_html(ARTICLE, ARTICLE_HTML)
        .with_latency(Method::Get, ARTICLE, Duration::from_secs(30));
    let resolver = resolver(http, config);

    let start = tokio::time::Instant::now();
    let record = resolver.resolve(ARTICLE, ResolveOptions::default()).await;
    let elapsed = start.elapsed();

    // Aggregator and document each cut off at 1500ms.
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(5000));
    assert_eq!(record.quality, Quality::Fallback);
    assert!(record.description.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_global_deadline_skips_later_tiers() {
    let config = EngineConfig::default()
        .with_aggregator("secret-key", false)
        .with_global_budget(Duration::from_millis(1000));
    let aggregator = AggregatorTier::new(config.aggregator.clone(), Duration::from_millis(1500));
    let aggregator_url = aggregator.request_url(ARTICLE);
    let http = MockHttpClient::new()
        .with_json(&aggregator_url, json!({ "status": "success", "data": {} }))
        .with_latency(Method::Get, &aggregator_url, Duration::from_secs(30))
        .with_html(ARTICLE, ARTICLE_HTML);
    let resolver = resolver(http, config);

    let start = tokio::time::Instant::now();
    let record = resolver.resolve(ARTICLE, ResolveOptions::default()).await;

    assert!(start.elapsed() < Duration::from_millis(1600));
    assert_eq!(resolver.http().calls_to(Method::Get, ARTICLE), 0);
    assert_eq!(record.quality, Quality::Fallback);
}

#[tokio::test]
async fn test_scheme_less_input_fetched_as_https() {
    let repaired = "https://youtube.com/watch?v=dQw4w9WgXcQ";
    let oembed = VideoOEmbedTier::new(DEFAULT_VIDEO_OEMBED_URL, Duration::from_secs(1));
    let http = MockHttpClient::new().with_json(
        &oembed.request_url(repaired),
        json!({ "author_name": "Rick Astley" }),
    );
    let resolver = resolver(http, EngineConfig::default());

    let record = resolver
        .resolve("youtube.com/watch?v=dQw4w9WgXcQ", ResolveOptions::default())
        .await;

    assert_eq!(record.url, repaired);
    assert_eq!(record.content_type, ContentType::Video);
    assert_eq!(record.author.as_deref(), Some("Rick Astley"));
    assert_eq!(record.quality, Quality::Partial);

    // Cached under the input as given.
    let calls = resolver.http().call_count();
    resolver
        .resolve("youtube.com/watch?v=dQw4w9WgXcQ", ResolveOptions::default())
        .await;
    assert_eq!(resolver.http().call_count(), calls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_are_independent() {
    const CAPACITY: usize = 3;
    let urls: Vec<String> = (0..16)
        .map(|i| format!("https://news.example.com/story-{i}"))
        .collect();

    let http = urls.iter().enumerate().fold(MockHttpClient::new(), |http, (i, url)| {
        let html = format!(r#"<meta name="description" content="Story number {i}">"#);
        http.with_html(url, &html)
    });
    let config = EngineConfig::default().with_cache(CAPACITY, Duration::from_secs(3600));
    let resolver = Arc::new(resolver(http, config));

    let handles: Vec<_> = urls
        .iter()
        .cloned()
        .map(|url| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                let record = resolver.resolve(&url, ResolveOptions::default()).await;
                assert!(resolver.cache().len() <= CAPACITY);
                (url, record)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (url, record) = handle.await.unwrap();
        assert_eq!(record.url, url);
        assert_eq!(
            record.description.as_deref(),
            Some(format!("Story number {i}").as_str())
        );
        assert!(record.title.is_none());
    }
    assert_eq!(resolver.cache().len(), CAPACITY);
}
