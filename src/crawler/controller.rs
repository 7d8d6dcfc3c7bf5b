//! Iteration controller - main crawl orchestration logic
//!
//! This module contains the loop that repeats crawl passes over the seed
//! URLs, including:
//! - Scheduling the seed URLs and folding their outcomes
//! - Fetching the links discovered on seed pages (one hop)
//! - Merging each iteration into the running totals
//! - Waiting between iterations and reacting to cancellation

use crate::config::{Config, LinkFollowConfig};
use crate::crawler::fetcher::{Fetcher, RequestConfig};
use crate::crawler::links::Link;
use crate::crawler::scheduler::Scheduler;
use crate::output::{merge_stats, CrawlStatistics, IterationError, StatsAggregator};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a complete run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Statistics merged over every completed iteration
    pub stats: CrawlStatistics,

    /// Number of iterations started
    pub iterations: u32,

    /// True when the run ended because of cancellation
    pub stopped: bool,

    /// Non-fatal problems, by 1-based iteration number
    pub iteration_errors: Vec<(u32, IterationError)>,
}

/// Repeats crawl iterations over a fixed seed list
pub struct IterationController {
    scheduler: Scheduler,
    request: RequestConfig,
    links: LinkFollowConfig,
    max_iterations: Option<u32>,
    wait_interval: Duration,
}

impl IterationController {
    /// Creates a controller from the crawl configuration
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetch strategy used for every URL
    /// * `config` - The crawler configuration
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            scheduler: Scheduler::new(fetcher, config.crawler.concurrency()),
            request: RequestConfig::from_config(config),
            links: config.links,
            max_iterations: config.crawler.max_iterations(),
            wait_interval: config.crawler.wait_interval(),
        }
    }

    /// Runs iterations until the configured count is reached or `cancel` fires
    ///
    /// The first iteration always starts. Before each later one the token is
    /// checked and the wait interval elapses; the wait ends early on
    /// cancellation. Statistics gathered so far are returned either way.
    pub async fn run(&self, seeds: &[String], cancel: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            if let Some(max) = self.max_iterations {
                if summary.iterations >= max {
                    break;
                }
            }

            if summary.iterations > 0 && !self.wait(cancel).await {
                summary.stopped = true;
                break;
            }

            summary.iterations += 1;
            let iteration = summary.iterations;
            tracing::info!("Starting iteration {}", iteration);

            let stats = self.run_iteration(seeds, cancel).await;
            if let Err(e) = stats.check_progress() {
                tracing::warn!("Iteration {}: {}", iteration, e);
                summary.iteration_errors.push((iteration, e));
            }
            summary.stats = merge_stats(&summary.stats, &stats);

            if cancel.is_cancelled() {
                tracing::info!("Crawl interrupted after iteration {}", iteration);
                summary.stopped = true;
                break;
            }
        }

        summary
    }

    /// Sleeps for the wait interval; returns false if cancelled first
    async fn wait(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.wait_interval.is_zero() {
            return true;
        }

        tracing::info!(
            "Waiting {}s before next iteration",
            self.wait_interval.as_secs()
        );
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.wait_interval) => true,
        }
    }

    /// Runs one pass over the seed URLs and the links they expose
    pub async fn run_iteration(
        &self,
        seeds: &[String],
        cancel: &CancellationToken,
    ) -> CrawlStatistics {
        let mut aggregator = StatsAggregator::new();
        let mut collector = LinkCollector::new(self.links, seeds);

        let mut outcomes = self
            .scheduler
            .schedule(seeds.to_vec(), self.request.clone(), cancel.clone());
        while let Some(outcome) = outcomes.recv().await {
            aggregator.fold(&outcome);
            if let Some(links) = &outcome.links {
                collector.collect(&outcome.url, links);
            }
        }

        if collector.is_empty() {
            return aggregator.finish();
        }

        let (targets, referrers) = collector.into_parts();
        tracing::info!("Following {} discovered link(s)", targets.len());

        let mut aggregator = aggregator.with_referrers(referrers);
        let mut outcomes = self.scheduler.schedule(
            targets,
            self.request.with_parse_links(false),
            cancel.clone(),
        );
        while let Some(outcome) = outcomes.recv().await {
            aggregator.fold(&outcome);
        }

        aggregator.finish()
    }
}

/// Selects which discovered links get fetched and who referred to them
struct LinkCollector {
    config: LinkFollowConfig,
    fetched: HashSet<String>,
    targets: Vec<String>,
    referrers: HashMap<String, Vec<String>>,
}

impl LinkCollector {
    fn new(config: LinkFollowConfig, seeds: &[String]) -> Self {
        Self {
            config,
            fetched: seeds.iter().cloned().collect(),
            targets: Vec::new(),
            referrers: HashMap::new(),
        }
    }

    fn collect(&mut self, page: &str, links: &[Link]) {
        tracing::debug!("Found {} link(s) on {}", links.len(), page);

        let config = self.config;
        for link in links
            .iter()
            .filter(|link| config.follows(link.kind, link.external))
        {
            let mut target = link.target.clone();
            target.set_fragment(None);
            let target = String::from(target);

            if self.fetched.contains(&target) {
                continue;
            }

            let pages = self.referrers.entry(target.clone()).or_default();
            if pages.is_empty() {
                self.targets.push(target);
            }
            if !pages.iter().any(|p| p == page) {
                pages.push(page.to_string());
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn into_parts(self) -> (Vec<String>, HashMap<String, Vec<String>>) {
        (self.targets, self.referrers)
    }
}
