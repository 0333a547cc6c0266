// ABOUTME: End-to-end resolver tests over real HTTP against a local mock server.
// ABOUTME: Covers the range-limited page fetch, redirects, oEmbed, inline favicons and failure retries.

use std::time::Duration;

use httpmock::prelude::*;
use linkpill_meta::{FaviconStrategy, LinkMetadata, OembedProvider, Resolver};
use pretty_assertions::assert_eq;

fn resolver() -> Resolver {
    Resolver::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("linkpill-test")
        .build()
        .unwrap()
}

#[tokio::test]
async fn resolves_page_head_with_range_request() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET)
            .path("/posts/shipping-the-new-parser")
            .header("range", "bytes=0-51199")
            .header("user-agent", "linkpill-test");
        then.status(206)
            .header("content-type", "text/html; charset=utf-8")
            .body(
                r#"<html><head>
                    <title>Shipping the New Parser | Dev Blog</title>
                    <meta name="author" content="Grace Hopper">
                    <link rel="shortcut icon" href="/static/fav.ico">
                </head><body></body></html>"#,
            );
    });

    let url = server.url("/posts/shipping-the-new-parser");
    let resolver = resolver();
    let meta = resolver.resolve(&url).await;
    page.assert();

    assert_eq!(
        meta,
        LinkMetadata::new(
            "Shipping the New Parser",
            server.url("/static/fav.ico"),
            "Grace Hopper"
        )
    );
    assert_eq!(resolver.get_cached(&url), Some(meta));
}

#[tokio::test]
async fn server_errors_fall_back_and_retry() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/docs/getting-started-guide");
        then.status(503).body("maintenance");
    });

    let url = server.url("/docs/getting-started-guide");
    let resolver = resolver();

    let first = resolver.resolve(&url).await;
    let second = resolver.resolve(&url).await;
    assert_eq!(first, LinkMetadata::new("Getting Started Guide", "", ""));
    assert_eq!(first, second);
    assert_eq!(page.hits(), 2);
    assert_eq!(resolver.cached_len(), 0);
}

#[tokio::test]
async fn relative_icons_follow_redirects() {
    let server = MockServer::start();
    let target = server.url("/new/home");
    let old = server.mock(|when, then| {
        when.method(GET).path("/old");
        then.status(301).header("location", target.as_str());
    });
    let new = server.mock(|when, then| {
        when.method(GET).path("/new/home");
        then.status(200)
            .header("content-type", "text/html")
            .body(r#"<html><head><title>Moved</title><link rel="icon" href="icon.png"></head></html>"#);
    });

    let meta = resolver().resolve(&server.url("/old")).await;
    old.assert();
    new.assert();
    assert_eq!(meta.title, "Moved");
    assert_eq!(meta.favicon, server.url("/new/icon.png"));
}

#[tokio::test]
async fn oembed_provider_answers_without_page_fetch() {
    let server = MockServer::start();
    let oembed = server.mock(|when, then| {
        when.method(GET).path("/oembed").query_param("format", "json");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"title":"Conference Keynote","author_name":"RustConf"}"#);
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/videos/42");
        then.status(200).header("content-type", "text/html").body("<title>Page</title>");
    });

    let provider = OembedProvider::new(r"/videos/\d+$", server.url("/oembed")).unwrap();
    let resolver = Resolver::builder()
        .oembed_providers(vec![provider])
        .build()
        .unwrap();

    let meta = resolver.resolve(&server.url("/videos/42")).await;
    oembed.assert();
    assert_eq!(page.hits(), 0);
    assert_eq!(meta.title, "Conference Keynote");
    assert_eq!(meta.author, "RustConf");
}

#[tokio::test]
async fn inline_favicons_are_embedded_as_data_uris() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .header("content-type", "text/html")
            .body(r#"<html><head><title>Home</title><link rel="icon" href="/missing.png"></head></html>"#);
    });
    let missing = server.mock(|when, then| {
        when.method(GET).path("/missing.png");
        then.status(404);
    });
    let ico = server.mock(|when, then| {
        when.method(GET).path("/favicon.ico");
        then.status(200)
            .header("content-type", "image/vnd.microsoft.icon")
            .body([0u8, 0, 1, 0]);
    });

    let resolver = Resolver::builder()
        .favicon_strategy(FaviconStrategy::Inline)
        .build()
        .unwrap();
    let meta = resolver.resolve(&server.url("/")).await;

    missing.assert();
    ico.assert();
    assert_eq!(meta.favicon, "data:image/vnd.microsoft.icon;base64,AAABAA==");
}
