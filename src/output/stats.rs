//! Crawl statistics and their aggregation
//!
//! Outcomes streamed out of the scheduler are folded one at a time into a
//! [`StatsAggregator`] owned by the consuming loop. Finished iterations are
//! combined with [`merge_stats`].

use crate::crawler::FetchOutcome;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

/// A URL that did not answer 200
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub url: String,

    /// HTTP status, 0 for transport failures
    pub status_code: u16,

    pub time: Duration,

    /// Pages that linked to this URL, when it was reached by link following
    pub linking_urls: Vec<String>,
}

/// Crawl statistics summary
///
/// Invariant: `total` equals the sum of `status_codes` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of outcomes processed
    pub total: usize,

    /// Count of outcomes by status code (0 for transport failures)
    pub status_codes: BTreeMap<u16, usize>,

    /// Mean latency of 200 responses
    pub average_200_time: Duration,

    /// Largest latency of a 200 response
    pub max_200_time: Duration,

    /// Every non-200 outcome
    pub non_200_urls: Vec<CrawlResult>,
}

impl CrawlStatistics {
    pub fn count(&self, status_code: u16) -> usize {
        self.status_codes.get(&status_code).copied().unwrap_or(0)
    }

    pub fn count_200(&self) -> usize {
        self.count(200)
    }

    /// Combines these statistics with another set, see [`merge_stats`]
    pub fn merge(&self, other: &CrawlStatistics) -> CrawlStatistics {
        merge_stats(self, other)
    }

    /// Reports whether this iteration made acceptable progress
    ///
    /// The error is informational: callers log it and carry on.
    pub fn check_progress(&self) -> Result<(), IterationError> {
        if self.total == 0 {
            Err(IterationError::NoUrlCrawled)
        } else if self.total != self.count_200() {
            Err(IterationError::Non200Responses {
                count: self.total - self.count_200(),
            })
        } else {
            Ok(())
        }
    }
}

/// Non-fatal problems detected once an iteration is complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IterationError {
    #[error("No URL crawled")]
    NoUrlCrawled,

    #[error("{count} URL(s) had a different status code than 200")]
    Non200Responses { count: usize },
}

/// Merges two sets of crawling statistics
///
/// Totals and per-status counts are summed, failure lists concatenated and
/// the maximum is the larger of both. The 200 average is weighted by each
/// side's number of 200 responses.
///
/// # Example
///
/// ```
/// use crowlet::output::{merge_stats, CrawlStatistics};
/// use std::time::Duration;
///
/// let mut a = CrawlStatistics::default();
/// a.total = 10;
/// a.status_codes.insert(200, 10);
/// a.average_200_time = Duration::from_millis(100);
///
/// let mut b = CrawlStatistics::default();
/// b.total = 2;
/// b.status_codes.insert(200, 2);
/// b.average_200_time = Duration::from_millis(700);
///
/// let merged = merge_stats(&a, &b);
/// assert_eq!(merged.average_200_time, Duration::from_millis(200));
/// ```
pub fn merge_stats(a: &CrawlStatistics, b: &CrawlStatistics) -> CrawlStatistics {
    let mut status_codes = a.status_codes.clone();
    for (code, count) in &b.status_codes {
        *status_codes.entry(*code).or_insert(0) += count;
    }

    let count_a = a.count_200() as u128;
    let count_b = b.count_200() as u128;
    let average_200_time = if count_a + count_b == 0 {
        Duration::ZERO
    } else {
        let weighted = a.average_200_time.as_nanos() * count_a
            + b.average_200_time.as_nanos() * count_b;
        nanos_to_duration(weighted / (count_a + count_b))
    };

    let mut non_200_urls = Vec::with_capacity(a.non_200_urls.len() + b.non_200_urls.len());
    non_200_urls.extend_from_slice(&a.non_200_urls);
    non_200_urls.extend_from_slice(&b.non_200_urls);

    CrawlStatistics {
        total: a.total + b.total,
        status_codes,
        average_200_time,
        max_200_time: a.max_200_time.max(b.max_200_time),
        non_200_urls,
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Folds outcomes into one iteration's statistics
///
/// Not shared between tasks: the loop draining the scheduler owns it.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: CrawlStatistics,
    time_sum_200: Duration,
    referrers: HashMap<String, Vec<String>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pages linking to each URL so failures can name them
    pub fn with_referrers(mut self, referrers: HashMap<String, Vec<String>>) -> Self {
        self.referrers = referrers;
        self
    }

    /// Accounts for one outcome
    pub fn fold(&mut self, outcome: &FetchOutcome) {
        let latency = outcome.latency();

        self.stats.total += 1;
        *self.stats.status_codes.entry(outcome.status_code).or_insert(0) += 1;

        if outcome.is_ok() {
            self.time_sum_200 += latency;
            if latency > self.stats.max_200_time {
                self.stats.max_200_time = latency;
            }
        } else {
            self.stats.non_200_urls.push(CrawlResult {
                url: outcome.url.clone(),
                status_code: outcome.status_code,
                time: latency,
                linking_urls: self.referrers.get(&outcome.url).cloned().unwrap_or_default(),
            });
        }
    }

    /// Completes the iteration, computing the 200 average
    pub fn finish(mut self) -> CrawlStatistics {
        let total_200 = self.stats.count_200() as u128;
        if total_200 > 0 {
            self.stats.average_200_time =
                nanos_to_duration(self.time_sum_200.as_nanos() / total_200);
        }
        self.stats
    }
}
