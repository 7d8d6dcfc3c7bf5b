//! Crawler module for fetching URLs and gathering their outcomes
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with per-phase timing
//! - HTML link extraction
//! - Bounded-concurrency scheduling with cancellation
//! - Iteration control and one-hop link following

mod controller;
mod fetcher;
mod links;
mod scheduler;

pub use controller::{IterationController, RunSummary};
pub use fetcher::{
    build_http_client, fetch_url, log_outcome, FetchOutcome, Fetcher, HttpFetcher, RequestConfig,
    Timing,
};
pub use links::{extract_links, Link, LinkKind};
pub use scheduler::Scheduler;
