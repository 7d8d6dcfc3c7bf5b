use crate::config::types::{Config, CrawlerConfig, ExitCodeConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
///
/// A non-positive throttle is deliberately not rejected here: it is coerced
/// to 1 when the concurrency ceiling is read.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_exit_codes(&config.exit)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    if !config.forever && config.iterations == 0 {
        return Err(ConfigError::Validation(
            "iterations must be >= 1 unless crawling forever".to_string(),
        ));
    }

    if let Some(host) = config.override_host.as_deref() {
        validate_host(host)?;
    }

    Ok(())
}

/// Checks that an override host (optionally `host:port`) can be put in a URL
pub fn validate_host(host: &str) -> ConfigResult<()> {
    if host.is_empty() || host.contains('/') {
        return Err(ConfigError::InvalidHost(host.to_string()));
    }

    Url::parse(&format!("http://{}/", host))
        .ok()
        .filter(|url| url.host_str().is_some())
        .map(|_| ())
        .ok_or_else(|| ConfigError::InvalidHost(host.to_string()))
}

/// Validates exit codes
fn validate_exit_codes(config: &ExitCodeConfig) -> ConfigResult<()> {
    for (name, code) in [
        ("non-200-error", config.non_200_error),
        ("response-time-error", config.response_time_error),
    ] {
        if !(0..=255).contains(&code) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0 and 255, got {}",
                name, code
            )));
        }
    }

    Ok(())
}
