//! End-to-end tests: a real web2md service on an ephemeral port, converting
//! pages served by a local wiremock upstream.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use web2md::bench::{BatchEndpoint, HttpBatchEndpoint};
use web2md::server::{self, AppState};
use web2md::{BatchResponse, ConversionConfig, FetchStrategy, PageConverter, Web2MdError};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

const ARTICLE: &str = r#"<html><head><title>Article</title></head><body>
<h1>Release notes</h1>
<!-- generated by cms -->
<p>Read <a href="/about">About us</a> and <a href="https://other.example/x">elsewhere</a>.</p>
<img src="images/logo.png" alt="logo">
</body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn upstream_with(route: &str, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(&server)
        .await;
    server
}

/// Start the service on 127.0.0.1 with an OS-assigned port and return its
/// base URL.
async fn spawn_service(config: ConversionConfig) -> String {
    let converter = PageConverter::from_config(&config).unwrap();
    let app = server::router(Arc::new(AppState::new(converter)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn get_convert(service: &str, url: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{service}/convert"))
        .query(&[("url", url)])
        .send()
        .await
        .unwrap()
}

// ── Single conversion ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_returns_markdown_with_absolute_links() {
    let upstream = upstream_with("/news/article", ARTICLE).await;
    let service = spawn_service(ConversionConfig::default()).await;

    let page = format!("{}/news/article", upstream.uri());
    let resp = get_convert(&service, &page).await;

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "got {content_type}");

    let md = resp.text().await.unwrap();
    assert!(md.contains("Release notes"), "got: {md}");
    assert!(
        md.contains(&format!("[About us]({}/about)", upstream.uri())),
        "relative link not absolutized: {md}"
    );
    assert!(md.contains("https://other.example/x"));
    assert!(md.contains(&format!("{}/news/images/logo.png", upstream.uri())));
    assert!(!md.contains("<!--"));
    assert!(!md.contains("\n\n\n\n"));
    assert_eq!(md, md.trim());
}

#[tokio::test]
async fn test_missing_url_is_400_with_detail() {
    let service = spawn_service(ConversionConfig::default()).await;
    let resp = reqwest::get(format!("{service}/convert")).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn test_unrelated_query_is_400_with_detail() {
    let service = spawn_service(ConversionConfig::default()).await;
    let resp = reqwest::get(format!("{service}/convert?page=https://site.example/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("missing 'url'"));
}

#[tokio::test]
async fn test_invalid_url_is_400_with_detail() {
    let service = spawn_service(ConversionConfig::default()).await;
    let resp = get_convert(&service, "not-a-url").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("not-a-url"));
}

#[tokio::test]
async fn test_upstream_status_is_400() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    let service = spawn_service(ConversionConfig::default()).await;

    let resp = get_convert(&service, &format!("{}/gone", upstream.uri())).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("HTTP 404"));
}

#[tokio::test]
async fn test_empty_page_is_400() {
    let upstream = upstream_with("/blank", "<html><body></body></html>").await;
    let service = spawn_service(ConversionConfig::default()).await;
    let resp = get_convert(&service, &format!("{}/blank", upstream.uri())).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_health() {
    let service = spawn_service(ConversionConfig::default()).await;
    let resp = reqwest::get(format!("{service}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

// ── Batch conversion ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_mixed_outcomes_in_order() {
    let upstream = MockServer::start().await;
    for route in ["/one", "/two"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(&format!("<h1>Page {route}</h1><p>body</p>")))
            .mount(&upstream)
            .await;
    }
    let service = spawn_service(ConversionConfig::default()).await;

    let urls = vec![
        format!("{}/one", upstream.uri()),
        "not-a-url".to_string(),
        format!("{}/two", upstream.uri()),
    ];
    let resp = reqwest::Client::new()
        .post(format!("{service}/convert/batch"))
        .json(&serde_json::json!({ "urls": urls }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let batch: BatchResponse = resp.json().await.unwrap();
    assert_eq!(batch.results.len(), 3);
    let success: Vec<bool> = batch.results.iter().map(|r| r.success).collect();
    assert_eq!(success, vec![true, false, true]);
    assert!(batch.results[0].error.is_none());
    assert!(batch.results[2].error.is_none());
    assert!(!batch.results[1].error.as_deref().unwrap().is_empty());
    assert!(batch.results[1].markdown.is_empty());
    assert!(batch.results[0].markdown.contains("/one"));
    assert!(batch.results[2].markdown.contains("/two"));
    for (r, u) in batch.results.iter().zip(&urls) {
        assert_eq!(&r.url, u);
    }
}

#[tokio::test]
async fn test_batch_wider_than_limiter() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow page</p>").set_delay(Duration::from_millis(50)))
        .mount(&upstream)
        .await;
    let config = ConversionConfig::builder()
        .max_concurrency(2)
        .fetch_strategy(FetchStrategy::Direct)
        .build()
        .unwrap();
    let service = spawn_service(config).await;

    let urls: Vec<String> = (0..8).map(|i| format!("{}/p{i}", upstream.uri())).collect();
    let endpoint = HttpBatchEndpoint::new(&service, Duration::from_secs(30)).unwrap();
    let results = endpoint.convert_batch(&urls).await.unwrap();

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.success));
    for (r, u) in results.iter().zip(&urls) {
        assert_eq!(&r.url, u);
    }
}

// ── Fetch behaviour ──────────────────────────────────────────────────────────

/// Upstream that serves a consent wall plus a cookie to cookieless visitors
/// and the article to visitors presenting the cookie.
async fn consent_walled_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/walled"))
        .and(header("cookie", "session=abc123"))
        .respond_with(html("<h1>Real content</h1>"))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/walled"))
        .respond_with(
            html("<p>Please accept cookies</p>")
                .insert_header("set-cookie", "session=abc123; Path=/; HttpOnly"),
        )
        .mount(&upstream)
        .await;
    upstream
}

#[tokio::test]
async fn test_priming_forwards_cookies() {
    let upstream = consent_walled_upstream().await;
    let converter = PageConverter::from_config(&ConversionConfig::default()).unwrap();
    let md = converter
        .convert(&format!("{}/walled", upstream.uri()))
        .await
        .unwrap();
    assert!(md.contains("Real content"), "got: {md}");
}

#[tokio::test]
async fn test_failed_priming_is_swallowed() {
    let upstream = MockServer::start().await;
    // The first visitor waits past the priming budget but inside the main one.
    Mock::given(method("GET"))
        .and(path("/stalls-once"))
        .respond_with(html("<p>stale</p>").set_delay(Duration::from_millis(1500)))
        .up_to_n_times(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/stalls-once"))
        .respond_with(html("<h1>Fresh content</h1>"))
        .mount(&upstream)
        .await;

    let config = ConversionConfig::builder()
        .request_timeout_secs(2)
        .build()
        .unwrap();
    let converter = PageConverter::from_config(&config).unwrap();

    let start = std::time::Instant::now();
    let md = converter
        .convert(&format!("{}/stalls-once", upstream.uri()))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(md.contains("Fresh content"), "got: {md}");
    assert!(elapsed >= Duration::from_millis(900), "priming did not wait: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1450), "priming ran past its budget: {elapsed:?}");
    assert_eq!(upstream.received_requests().await.unwrap().len(), 2);
    assert_eq!(converter.limiter().in_flight(), 0);
}

#[tokio::test]
async fn test_direct_fetch_skips_priming() {
    let upstream = consent_walled_upstream().await;
    let config = ConversionConfig::builder()
        .fetch_strategy(FetchStrategy::Direct)
        .build()
        .unwrap();
    let converter = PageConverter::from_config(&config).unwrap();
    let md = converter
        .convert(&format!("{}/walled", upstream.uri()))
        .await
        .unwrap();
    assert!(md.contains("accept cookies"), "got: {md}");
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "web2md-test/1.0"))
        .and(header_exists("accept-language"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(html("<p>hello browser</p>"))
        .mount(&upstream)
        .await;

    let config = ConversionConfig::builder()
        .user_agent("web2md-test/1.0")
        .build()
        .unwrap();
    let converter = PageConverter::from_config(&config).unwrap();
    let md = converter
        .convert(&format!("{}/ua", upstream.uri()))
        .await
        .unwrap();
    assert!(md.contains("hello browser"));
}

#[tokio::test]
async fn test_timeout_is_fetch_timeout() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(5)))
        .mount(&upstream)
        .await;
    let config = ConversionConfig::builder()
        .request_timeout_secs(1)
        .fetch_strategy(FetchStrategy::Direct)
        .build()
        .unwrap();
    let converter = PageConverter::from_config(&config).unwrap();

    let err = converter
        .convert(&format!("{}/late", upstream.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, Web2MdError::FetchTimeout { secs: 1, .. }), "got {err}");
    assert!(err.is_client_error());
    assert_eq!(converter.limiter().in_flight(), 0);
}

#[tokio::test]
async fn test_connection_refused_is_fetch_failed() {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let converter = PageConverter::from_config(&ConversionConfig::default()).unwrap();
    let err = converter
        .convert(&format!("http://127.0.0.1:{port}/"))
        .await
        .unwrap_err();
    assert!(matches!(err, Web2MdError::FetchFailed { .. }), "got {err}");
    assert_eq!(converter.limiter().in_flight(), 0);
}
