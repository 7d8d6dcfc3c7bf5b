//! HTTP fetcher implementation
//!
//! This module performs the single GET behind every crawled URL:
//! - Building the shared HTTP client
//! - Applying the per-request timeout and basic authentication
//! - Recording the timing breakdown of the request
//! - Draining the body, or handing it to the link extractor
//! - Turning transport failures into status-0 outcomes

use crate::config::Config;
use crate::crawler::links::{extract_links, Link};
use crate::LinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use url::Url;

/// Per-request settings handed to a [`Fetcher`]
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Timeout for the whole request, body included
    pub timeout: Duration,

    /// Basic authentication user; auth is only sent when set and non-empty
    pub user: Option<String>,

    /// Basic authentication password
    pub pass: Option<String>,

    /// Extract links from HTML bodies
    pub parse_links: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            user: None,
            pass: None,
            parse_links: false,
        }
    }
}

impl RequestConfig {
    /// Builds the request settings for seed URLs from the crawl configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.crawler.timeout(),
            user: config.http.user.clone(),
            pass: config.http.pass.clone(),
            parse_links: config.links.enabled(),
        }
    }

    /// Returns a copy with link extraction switched on or off
    pub fn with_parse_links(&self, parse_links: bool) -> Self {
        Self {
            parse_links,
            ..self.clone()
        }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => Some((user, self.pass.as_deref().unwrap_or(""))),
            _ => None,
        }
    }
}

/// Phase durations of one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    pub dns_lookup: Duration,
    pub tcp_connection: Duration,
    pub tls_handshake: Duration,
    pub server_processing: Duration,
    pub content_transfer: Duration,

    /// Time from request issuance to the last byte read
    pub total: Duration,
}

impl Timing {
    /// Builds a breakdown where content transfer is whatever the other
    /// phases do not account for, clamped at zero
    pub fn from_phases(
        dns_lookup: Duration,
        tcp_connection: Duration,
        tls_handshake: Duration,
        server_processing: Duration,
        total: Duration,
    ) -> Self {
        let accounted = dns_lookup + tcp_connection + tls_handshake + server_processing;
        Self {
            dns_lookup,
            tcp_connection,
            tls_handshake,
            server_processing,
            content_transfer: total.saturating_sub(accounted),
            total,
        }
    }

    /// Breakdown for a request that never got a response
    pub fn failed(total: Duration) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }
}

/// Result of fetching one URL
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The requested URL
    pub url: String,

    /// HTTP status code, 0 if no response was received
    pub status_code: u16,

    pub timing: Timing,

    /// When the request finished
    pub completed_at: DateTime<Utc>,

    /// Links found in the body, when extraction was requested and succeeded
    pub links: Option<Vec<Link>>,

    /// Transport error description for status-0 outcomes
    pub error: Option<String>,
}

impl FetchOutcome {
    /// Builds a status-0 outcome for a request that failed before any response
    pub fn failed(url: impl Into<String>, error: impl Into<String>, total: Duration) -> Self {
        Self {
            url: url.into(),
            status_code: 0,
            timing: Timing::failed(total),
            completed_at: Utc::now(),
            links: None,
            error: Some(error.into()),
        }
    }

    /// Builds an outcome for a received response
    pub fn response(url: impl Into<String>, status_code: u16, timing: Timing) -> Self {
        Self {
            url: url.into(),
            status_code,
            timing,
            completed_at: Utc::now(),
            links: None,
            error: None,
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }

    /// Latency used for statistics
    pub fn latency(&self) -> Duration {
        self.timing.total
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Capability to fetch one URL
///
/// The scheduler only depends on this trait, so tests can swap the HTTP
/// transport for a double.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, config: &RequestConfig) -> FetchOutcome;
}

/// Builds the HTTP client shared by all fetches
///
/// # Arguments
///
/// * `timeout` - Default request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, config: &RequestConfig) -> FetchOutcome {
        let outcome = fetch_url(&self.client, url, config).await;
        log_outcome(&outcome);
        outcome
    }
}

/// Fetches a URL and records its outcome
///
/// # Request Flow
///
/// 1. Send the GET, timing until the response headers arrive
/// 2. Either extract links from the HTML body or drain it
/// 3. Stop the clock once the last byte has been read
///
/// Any failure before a response is received produces a status-0 outcome.
/// Resolution, connection and TLS setup happen inside the pooled client,
/// which does not report them separately: their time is counted in
/// `server_processing`, and the `dns_lookup`, `tcp_connection` and
/// `tls_handshake` fields are always zero.
pub async fn fetch_url(client: &Client, url: &str, config: &RequestConfig) -> FetchOutcome {
    let start = Instant::now();

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Invalid URL {}: {}", url, e);
            return FetchOutcome::failed(url, e.to_string(), start.elapsed());
        }
    };

    let mut request = client.get(parsed).timeout(config.timeout);
    if let Some((user, pass)) = config.credentials() {
        request = request.basic_auth(user, Some(pass));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("GET {} failed: {}", url, e);
            return FetchOutcome::failed(url, e.to_string(), start.elapsed());
        }
    };

    let server_processing = start.elapsed();
    let status_code = response.status().as_u16();

    let links = if config.parse_links && is_html(&response) {
        match read_links(response).await {
            Ok(links) => Some(links),
            Err(e) => {
                tracing::warn!("Link extraction skipped: {}", e);
                None
            }
        }
    } else {
        drain(response, url).await;
        None
    };

    let timing = Timing::from_phases(
        Duration::ZERO,
        Duration::ZERO,
        Duration::ZERO,
        server_processing,
        start.elapsed(),
    );

    let outcome = FetchOutcome::response(url, status_code, timing);
    match links {
        Some(links) => outcome.with_links(links),
        None => outcome,
    }
}

/// Responses without a Content-Type are treated as HTML
fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("html"))
        .unwrap_or(true)
}

/// Reads the body and extracts links relative to the final response URL
async fn read_links(response: Response) -> Result<Vec<Link>, LinkError> {
    let page_url = response.url().clone();
    let body = response.text().await.map_err(|e| LinkError::Body {
        url: page_url.to_string(),
        message: e.to_string(),
    })?;
    Ok(extract_links(&body, &page_url))
}

/// Reads and discards the body so the connection can be reused
async fn drain(mut response: Response, url: &str) {
    loop {
        match response.chunk().await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read body of {}: {}", url, e);
                break;
            }
        }
    }
}

/// Emits the per-fetch log record
///
/// Phase-level detail is only included at debug verbosity.
pub fn log_outcome(outcome: &FetchOutcome) {
    let timing = &outcome.timing;
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(
            status = outcome.status_code,
            dns_ms = timing.dns_lookup.as_millis() as u64,
            connect_ms = timing.tcp_connection.as_millis() as u64,
            tls_ms = timing.tls_handshake.as_millis() as u64,
            server_ms = timing.server_processing.as_millis() as u64,
            content_ms = timing.content_transfer.as_millis() as u64,
            total_ms = timing.total.as_millis() as u64,
            close = %outcome.completed_at,
            "url={}",
            outcome.url
        );
    } else {
        tracing::info!(
            status = outcome.status_code,
            total_ms = timing.total.as_millis() as u64,
            "url={}",
            outcome.url
        );
    }
}
