//! Fetch scheduler with a global concurrency ceiling
//!
//! This module handles:
//! - Admitting URLs while fewer than `ceiling` fetches are in flight
//! - Streaming outcomes back in completion order
//! - Stopping admission when the cancellation token fires
//!
//! The output channel closes once every admitted fetch has delivered its
//! outcome, so a consumer can drain it until `None` without counting.

use crate::crawler::fetcher::{FetchOutcome, Fetcher, RequestConfig};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Runs a [`Fetcher`] over URL lists under a concurrency ceiling
#[derive(Clone)]
pub struct Scheduler {
    fetcher: Arc<dyn Fetcher>,
    ceiling: usize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetch strategy run for each URL
    /// * `ceiling` - Maximum fetches in flight; 0 is treated as 1
    pub fn new(fetcher: Arc<dyn Fetcher>, ceiling: usize) -> Self {
        Self {
            fetcher,
            ceiling: ceiling.max(1),
        }
    }

    /// Starts fetching `urls` and returns the stream of outcomes
    ///
    /// The cancellation token is checked before each admission. Once it is
    /// set no new fetch starts, in-flight fetches finish normally, and URLs
    /// that were never admitted produce no outcome.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(
        &self,
        urls: Vec<String>,
        config: RequestConfig,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<FetchOutcome> {
        // Sized so that no fetch task ever waits on a slow consumer
        let (tx, rx) = mpsc::channel(urls.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.ceiling));

        tokio::spawn(admit(
            Arc::clone(&self.fetcher),
            urls,
            Arc::new(config),
            semaphore,
            tx,
            cancel,
        ));

        rx
    }
}

/// Admission loop: one fetch task per URL, gated by the semaphore
async fn admit(
    fetcher: Arc<dyn Fetcher>,
    urls: Vec<String>,
    config: Arc<RequestConfig>,
    semaphore: Arc<Semaphore>,
    tx: mpsc::Sender<FetchOutcome>,
    cancel: CancellationToken,
) {
    let total = urls.len();
    let mut admitted = 0;

    for url in urls {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        // A slot may free up in the same instant the token fires
        if cancel.is_cancelled() {
            break;
        }

        admitted += 1;
        tokio::spawn(run_fetch(
            Arc::clone(&fetcher),
            url,
            Arc::clone(&config),
            tx.clone(),
            permit,
        ));
    }

    if admitted < total {
        tracing::info!(
            "Stopped admitting after {} of {} URLs, waiting for in-flight fetches to finish...",
            admitted,
            total
        );
    } else {
        tracing::debug!("All {} URLs admitted", total);
    }

    // The receiver sees end-of-stream once the last task drops its sender
}

/// Fetches one URL and delivers exactly one outcome for it
///
/// The fetch runs in its own task so that a panicking fetcher still yields a
/// status-0 outcome instead of a missing one.
async fn run_fetch(
    fetcher: Arc<dyn Fetcher>,
    url: String,
    config: Arc<RequestConfig>,
    tx: mpsc::Sender<FetchOutcome>,
    permit: OwnedSemaphorePermit,
) {
    let start = Instant::now();
    let task_url = url.clone();
    let fetch = tokio::spawn(async move { fetcher.fetch(&task_url, &config).await });

    let outcome = match fetch.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Fetch task for {} failed: {}", url, e);
            FetchOutcome::failed(url, format!("fetch task failed: {}", e), start.elapsed())
        }
    };

    if tx.send(outcome).await.is_err() {
        tracing::debug!("Outcome receiver dropped");
    }
    drop(permit);
}
