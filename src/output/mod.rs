//! Output module for crawl statistics and reports
//!
//! This module handles:
//! - Folding fetch outcomes into per-iteration statistics
//! - Merging statistics across iterations
//! - Rendering human-readable and JSON summaries
//! - Mapping the final statistics to a process exit code

mod exit;
pub mod stats;
mod summary;

pub use exit::exit_code;
pub use stats::{merge_stats, CrawlResult, CrawlStatistics, IterationError, StatsAggregator};
pub use summary::{render_json_summary, render_summary};
