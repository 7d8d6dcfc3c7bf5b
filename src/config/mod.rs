//! Configuration module for Crowlet
//!
//! Configuration comes from an optional TOML file whose values are then
//! overridden by command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use crowlet::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crowlet.toml")).unwrap();
//! println!("Crawler will use throttle: {}", config.crawler.throttle);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExitCodeConfig, HooksConfig, HttpConfig, LinkFollowConfig,
    DEFAULT_THROTTLE, DEFAULT_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_host};
