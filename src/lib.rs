//! Crowlet: a sitemap crawler
//!
//! This crate reads the URLs declared in a sitemap, fetches each of them under a
//! concurrency ceiling (optionally following the hyperlinks and images found on
//! the pages), and aggregates availability and latency statistics across one or
//! more crawl iterations.

pub mod config;
pub mod crawler;
pub mod hooks;
pub mod output;
pub mod sitemap;
pub mod url;

use thiserror::Error;

/// Main error type for Crowlet operations
#[derive(Debug, Error)]
pub enum CrowletError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Command `{command}` failed: {message}")]
    Hook { command: String, message: String },

    #[error("Failed to render summary: {0}")]
    Summary(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid host override: {0}")]
    InvalidHost(String),
}

/// Errors raised while retrieving the seed URL list
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for sitemap {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid sitemap URL: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Cannot set host on {url}: {message}")]
    SetHost { url: String, message: String },
}

/// Errors from the link-following step of a fetch
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to read document body for {url}: {message}")]
    Body { url: String, message: String },
}

/// Result type alias for Crowlet operations
pub type Result<T> = std::result::Result<T, CrowletError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    extract_links, FetchOutcome, Fetcher, HttpFetcher, IterationController, Link, LinkKind,
    RunSummary,
};
pub use output::{merge_stats, CrawlResult, CrawlStatistics, StatsAggregator};
pub use crate::url::rewrite_url_host;
