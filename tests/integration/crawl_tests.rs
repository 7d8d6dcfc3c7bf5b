//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! sitemap-to-statistics cycle end-to-end.

use crowlet::config::Config;
use crowlet::crawler::{build_http_client, HttpFetcher, IterationController};
use crowlet::output::exit_code;
use crowlet::rewrite_url_host;
use crowlet::sitemap::fetch_sitemap_urls;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a urlset where every tenth entry points at a failing page
fn build_sitemap(base_url: &str, count: usize) -> String {
    let mut sitemap = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for i in 1..=count {
        if i % 10 == 0 {
            sitemap.push_str(&format!("<url><loc>{}/error{}</loc></url>", base_url, i));
        } else {
            sitemap.push_str(&format!("<url><loc>{}/page{}</loc></url>", base_url, i));
        }
    }
    sitemap.push_str("</urlset>");
    sitemap
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<!DOCTYPE html><html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_sitemap(server: &MockServer, sitemap: String) {
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(server)
        .await;
}

fn test_config(throttle: i64) -> Config {
    let mut config = Config::default();
    config.crawler.throttle = throttle;
    config.crawler.timeout = 5_000;
    config
}

async fn crawl(sitemap_url: &str, config: &Config) -> crowlet::RunSummary {
    let client = build_http_client(config.crawler.timeout()).expect("Failed to build client");
    let urls = fetch_sitemap_urls(&client, sitemap_url)
        .await
        .expect("Failed to read sitemap");

    let controller = IterationController::new(Arc::new(HttpFetcher::with_client(client)), config);
    controller.run(&urls, &CancellationToken::new()).await
}

#[tokio::test]
async fn test_full_crawl_with_failing_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_sitemap(&mock_server, build_sitemap(&base_url, 100)).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(html("<h1>Test Page</h1>"))
        .expect(90)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/error\d+$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(10)
        .mount(&mock_server)
        .await;

    let config = test_config(5);
    let summary = crawl(&format!("{}/sitemap.xml", base_url), &config).await;
    let stats = &summary.stats;

    assert_eq!(summary.iterations, 1);
    assert!(!summary.stopped);
    assert_eq!(stats.total, 100);
    assert_eq!(stats.count_200(), 90);
    assert_eq!(stats.count(500), 10);
    assert_eq!(stats.non_200_urls.len(), 10);
    assert!(stats
        .non_200_urls
        .iter()
        .all(|r| r.status_code == 500 && r.url.contains("/error")));
    assert!(stats.max_200_time >= stats.average_200_time);

    assert_eq!(exit_code(stats, &config.exit), config.exit.non_200_error);
}

#[tokio::test]
async fn test_iterations_accumulate() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_sitemap(&mock_server, build_sitemap(&base_url, 5)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(html("ok"))
        .expect(15)
        .mount(&mock_server)
        .await;

    let mut config = test_config(2);
    config.crawler.iterations = 3;
    let summary = crawl(&format!("{}/sitemap.xml", base_url), &config).await;

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.stats.total, 15);
    assert_eq!(summary.stats.count_200(), 15);
    assert!(summary.iteration_errors.is_empty());
    assert_eq!(exit_code(&summary.stats, &config.exit), 0);
}

#[tokio::test]
async fn test_response_time_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_sitemap(&mock_server, build_sitemap(&base_url, 3)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(html("slow").set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let mut config = test_config(3);
    config.exit.response_time_error = 9;
    config.exit.response_time_max = 50;
    let summary = crawl(&format!("{}/sitemap.xml", base_url), &config).await;

    assert_eq!(summary.stats.count_200(), 3);
    assert!(summary.stats.max_200_time >= Duration::from_millis(200));
    assert_eq!(exit_code(&summary.stats, &config.exit), 9);
}

#[tokio::test]
async fn test_follows_links_and_reports_referrer() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let sitemap = format!(
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>{}/</loc></url></urlset>"#,
        base_url
    );
    mount_sitemap(&mock_server, sitemap).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/ok">ok</a>
               <a href="/missing">broken</a>
               <a href="mailto:team@example.com">mail</a>
               <a href="https://external.invalid/page">elsewhere</a>
               <img src="/logo.png">"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html(r#"<a href="/never-followed">deeper</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/never-followed"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = test_config(4);
    config.links.crawl_hyperlinks = true;
    let summary = crawl(&format!("{}/sitemap.xml", base_url), &config).await;
    let stats = &summary.stats;

    assert_eq!(stats.total, 3, "seed, /ok and /missing");
    assert_eq!(stats.count_200(), 2);
    assert_eq!(stats.count(404), 1);

    let missing = &stats.non_200_urls[0];
    assert_eq!(missing.url, format!("{}/missing", base_url));
    assert_eq!(missing.linking_urls, vec![format!("{}/", base_url)]);
}

#[tokio::test]
async fn test_override_host_targets_mock_server() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let sitemap = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://production.invalid/page1</loc></url>
  <url><loc>http://production.invalid/page2</loc></url>
</urlset>"#;
    mount_sitemap(&mock_server, sitemap.to_string()).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(html("ok"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = test_config(2);
    let client = build_http_client(config.crawler.timeout()).unwrap();
    let urls = fetch_sitemap_urls(&client, &format!("{}/sitemap.xml", base_url))
        .await
        .unwrap();

    let urls = rewrite_url_host(&urls, &mock_server.address().to_string());
    assert_eq!(urls[0], format!("{}/page1", base_url));

    let controller = IterationController::new(Arc::new(HttpFetcher::with_client(client)), &config);
    let summary = controller.run(&urls, &CancellationToken::new()).await;
    assert_eq!(summary.stats.count_200(), 2);
}

#[tokio::test]
async fn test_cancelled_crawl_returns_partial_stats() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_sitemap(&mock_server, build_sitemap(&base_url, 9)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(html("slow").set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let mut config = test_config(1);
    config.crawler.forever = true;
    let client = build_http_client(config.crawler.timeout()).unwrap();
    let urls = fetch_sitemap_urls(&client, &format!("{}/sitemap.xml", base_url))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(450)).await;
        canceller.cancel();
    });

    let controller = IterationController::new(Arc::new(HttpFetcher::with_client(client)), &config);
    let summary = tokio::time::timeout(Duration::from_secs(10), controller.run(&urls, &cancel))
        .await
        .expect("Crawl did not stop after cancellation");

    assert!(summary.stopped);
    assert_eq!(summary.iterations, 1);
    assert!(summary.stats.total >= 1);
    assert!(summary.stats.total < 9);
}
