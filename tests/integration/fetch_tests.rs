//! Integration tests for single-URL fetching

use crowlet::crawler::{build_http_client, fetch_url, LinkKind, RequestConfig};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).expect("Failed to build client")
}

fn request_config() -> RequestConfig {
    RequestConfig {
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_records_status_and_timing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string("busy")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let outcome = fetch_url(&client(), &url, &request_config()).await;

    assert_eq!(outcome.url, url);
    assert_eq!(outcome.status_code, 503);
    assert!(outcome.error.is_none());
    assert!(!outcome.is_ok());
    assert!(outcome.latency() >= Duration::from_millis(100));
    assert!(outcome.timing.server_processing <= outcome.timing.total);
    // Resolution happens inside the client and is not broken out
    assert_eq!(outcome.timing.dns_lookup, Duration::ZERO);
}

#[tokio::test]
async fn test_fetch_sends_basic_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let url = format!("{}/secure", mock_server.uri());
    let config = RequestConfig {
        user: Some("user".to_string()),
        pass: Some("pass".to_string()),
        ..request_config()
    };

    let outcome = fetch_url(&client(), &url, &config).await;
    assert_eq!(outcome.status_code, 200);

    let anonymous = fetch_url(&client(), &url, &request_config()).await;
    assert_eq!(anonymous.status_code, 404);
}

#[tokio::test]
async fn test_fetch_extracts_links_from_html() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="https://other.example.com/">Other</a>
                <img src="img/logo.png">
            </body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());
    let outcome = fetch_url(&client(), &url, &request_config().with_parse_links(true)).await;

    let links = outcome.links.expect("links should be extracted");
    assert_eq!(links.len(), 3);

    let about = links
        .iter()
        .find(|l| l.target.path() == "/about")
        .expect("missing /about");
    assert_eq!(about.kind, LinkKind::Hyperlink);
    assert!(!about.external);

    let image = links
        .iter()
        .find(|l| l.kind == LinkKind::Image)
        .expect("missing image");
    assert_eq!(image.target.path(), "/img/logo.png");

    assert!(links.iter().any(|l| l.external));
}

#[tokio::test]
async fn test_fetch_skips_links_for_non_html() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"href": "<a href=\"/x\">"}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/data", mock_server.uri());
    let outcome = fetch_url(&client(), &url, &request_config().with_parse_links(true)).await;

    assert_eq!(outcome.status_code, 200);
    assert!(outcome.links.is_none());
}

#[tokio::test]
async fn test_fetch_without_link_parsing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="/x">x</a>"#, "text/html"),
        )
        .mount(&mock_server)
        .await;

    let outcome = fetch_url(&client(), &mock_server.uri(), &request_config()).await;
    assert_eq!(outcome.status_code, 200);
    assert!(outcome.links.is_none());
}

#[tokio::test]
async fn test_connection_refused_is_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/", port);
    let outcome = fetch_url(&client(), &url, &request_config()).await;

    assert_eq!(outcome.status_code, 0);
    assert!(outcome.error.is_some());
    assert!(outcome.links.is_none());
}

#[tokio::test]
async fn test_timeout_is_status_zero() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let config = RequestConfig {
        timeout: Duration::from_millis(100),
        ..request_config()
    };
    let outcome = fetch_url(&client(), &mock_server.uri(), &config).await;

    assert_eq!(outcome.status_code, 0);
    assert!(outcome.error.is_some());
    assert!(outcome.latency() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_fetch_through_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("proxied"))
        .expect(1)
        .mount(&proxy)
        .await;

    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(proxy.uri()).expect("Invalid proxy URL"))
        .build()
        .expect("Failed to build client");

    // The host does not resolve; only the proxy can answer
    let outcome = fetch_url(&client, "http://site.invalid/page", &request_config()).await;

    assert_eq!(outcome.status_code, 200);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.timing.dns_lookup, Duration::ZERO);
}
