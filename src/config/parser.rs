use crate::config::types::Config;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// The result is not validated: command-line overrides may still change it,
/// so callers run [`validate`](crate::config::validate) on the final value.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use crowlet::config::load_config;
///
/// let config = load_config(Path::new("crowlet.toml")).unwrap();
/// println!("Throttle: {}", config.crawler.throttle);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    Ok(toml::from_str(content)?)
}
