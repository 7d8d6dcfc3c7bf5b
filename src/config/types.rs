use crate::crawler::LinkKind;
use serde::Deserialize;
use std::time::Duration;

/// Default number of simultaneous HTTP requests
pub const DEFAULT_THROTTLE: i64 = 5;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Main configuration structure for Crowlet
///
/// Every section and key is optional; missing values fall back to the
/// command-line defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub links: LinkFollowConfig,
    pub exit: ExitCodeConfig,
    pub hooks: HooksConfig,
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once. Values <= 0 are coerced to 1.
    pub throttle: i64,

    /// Per-request timeout (milliseconds)
    pub timeout: u64,

    /// Number of passes over the sitemap URLs
    pub iterations: u32,

    /// Crawl until interrupted, ignoring `iterations`
    pub forever: bool,

    /// Pause between two iterations (seconds)
    pub wait_interval: u64,

    /// Replacement host applied to every sitemap URL
    pub override_host: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            timeout: DEFAULT_TIMEOUT_MS,
            iterations: 1,
            forever: false,
            wait_interval: 0,
            override_host: None,
        }
    }
}

impl CrawlerConfig {
    /// Concurrency ceiling, coerced to at least 1
    pub fn concurrency(&self) -> usize {
        if self.throttle <= 0 {
            tracing::warn!("Invalid throttle value {}, defaulting to 1.", self.throttle);
            1
        } else {
            self.throttle as usize
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.wait_interval)
    }

    /// Returns the iteration bound, `None` meaning "until interrupted"
    pub fn max_iterations(&self) -> Option<u32> {
        if self.forever {
            None
        } else {
            Some(self.iterations.max(1))
        }
    }
}

/// HTTP request settings shared by every fetch
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Basic authentication user name; auth is sent only when non-empty
    pub user: Option<String>,

    /// Basic authentication password
    pub pass: Option<String>,
}

/// Toggles controlling which discovered links are fetched
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinkFollowConfig {
    /// Follow `<a href>` targets
    pub crawl_hyperlinks: bool,

    /// Follow `<img src>` targets
    pub crawl_images: bool,

    /// Also follow targets hosted on another host than the referring page
    pub crawl_external: bool,
}

impl LinkFollowConfig {
    /// Link extraction is only needed when at least one kind is followed
    pub fn enabled(&self) -> bool {
        self.crawl_hyperlinks || self.crawl_images
    }

    /// Whether a discovered link of `kind` should be fetched
    pub fn follows(&self, kind: LinkKind, external: bool) -> bool {
        let kind_enabled = match kind {
            LinkKind::Hyperlink => self.crawl_hyperlinks,
            LinkKind::Image => self.crawl_images,
        };
        kind_enabled && (!external || self.crawl_external)
    }
}

/// Process exit-code contract
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExitCodeConfig {
    /// Exit code used when any URL did not answer 200
    pub non_200_error: i32,

    /// Exit code used when the maximum 200 response time is exceeded
    pub response_time_error: i32,

    /// Maximum 200 response time in milliseconds; 0 disables the check
    pub response_time_max: u64,
}

impl Default for ExitCodeConfig {
    fn default() -> Self {
        Self {
            non_200_error: 1,
            response_time_error: 1,
            response_time_max: 0,
        }
    }
}

/// External commands run around the crawl
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct HooksConfig {
    pub pre_cmd: Option<String>,
    pub post_cmd: Option<String>,
}
