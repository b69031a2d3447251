//! Bounded worker pool driving fetch → parse over the URL set
//!
//! This module handles:
//! - A fixed number of workers pulling from a bounded work queue
//! - Retry of transient fetch failures per URL
//! - Optional per-worker delay between requests
//! - An optional overall deadline that aborts outstanding work
//! - Exactly one result per input URL

use crate::config::ScraperConfig;
use crate::harvest::{fetch_with_retry, PageFetcher, PageParser, RetryPolicy};
use crate::model::{FetchOutcome, ScrapeResult};
use crate::FetchErrorKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// Reason recorded when a worker died before reporting its URL
const WORKER_TERMINATED: &str = "worker terminated before completing";

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of workers
    pub concurrency: usize,
    pub retry: RetryPolicy,

    /// Pause before each request a worker makes
    pub request_delay: Option<Duration>,

    /// Deadline for the whole pool
    pub deadline: Option<Duration>,
}

impl SchedulerConfig {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            concurrency: config.concurrency as usize,
            retry: config.retry_policy(),
            request_delay: config.request_delay(),
            deadline: config.overall_deadline(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            retry: RetryPolicy::default(),
            request_delay: None,
            deadline: None,
        }
    }
}

type WorkQueue = Arc<Mutex<mpsc::Receiver<Url>>>;
type ResultSink = Arc<Mutex<HashMap<Url, ScrapeResult>>>;

/// Runs fetch → parse for every URL on a fixed-size worker pool
///
/// Workers share nothing but the work queue and the result sink. Output
/// order is unspecified; aggregation restores determinism.
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Processes every URL and returns exactly one result per URL
    ///
    /// When the deadline elapses, outstanding workers are aborted (dropping
    /// their in-flight connections), completed results are kept, and every
    /// unresolved URL is reported as a transient `deadline exceeded` failure.
    pub async fn run(
        &self,
        urls: HashSet<Url>,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn PageParser>,
    ) -> Vec<ScrapeResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let total = urls.len();
        let workers = self.config.concurrency.clamp(1, total);
        tracing::info!("Scheduling {} URLs on {} workers", total, workers);

        // Work queue sized to hold the whole set, then closed
        let (tx, rx) = mpsc::channel(total);
        for url in &urls {
            if tx.try_send(url.clone()).is_err() {
                tracing::error!("Work queue rejected {}", url);
            }
        }
        drop(tx);

        let queue: WorkQueue = Arc::new(Mutex::new(rx));
        let sink: ResultSink = Arc::new(Mutex::new(HashMap::with_capacity(total)));

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker_loop(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&sink),
                Arc::clone(&fetcher),
                Arc::clone(&parser),
                self.config.clone(),
            ));
        }

        let finished = match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, drain(&mut pool)).await.is_ok(),
            None => {
                drain(&mut pool).await;
                true
            }
        };

        if !finished {
            tracing::warn!("Overall deadline elapsed, aborting outstanding fetches");
            pool.abort_all();
            while pool.join_next().await.is_some() {}
        }

        let mut completed = std::mem::take(&mut *sink.lock().await);
        let results: Vec<ScrapeResult> = urls
            .into_iter()
            .map(|url| match completed.remove(&url) {
                Some(result) => result,
                None if !finished => ScrapeResult::deadline_exceeded(url),
                None => ScrapeResult::fetch_failure(url, FetchErrorKind::Transient, WORKER_TERMINATED),
            })
            .collect();

        tracing::info!(
            "Pool finished: {} succeeded, {} failed",
            results.iter().filter(|r| r.is_success()).count(),
            results.iter().filter(|r| !r.is_success()).count()
        );
        results
    }
}

/// Waits for every worker, logging any that panicked
async fn drain(pool: &mut JoinSet<()>) {
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!("Worker panicked: {}", e);
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: WorkQueue,
    sink: ResultSink,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    config: SchedulerConfig,
) {
    let mut processed = 0usize;
    loop {
        let next = queue.lock().await.recv().await;
        let Some(url) = next else {
            break;
        };

        if let Some(delay) = config.request_delay {
            tokio::time::sleep(delay).await;
        }

        let result = process_url(&url, fetcher.as_ref(), parser.as_ref(), &config.retry).await;
        sink.lock().await.insert(url, result);
        processed += 1;
    }
    tracing::debug!("Worker {} done after {} URLs", worker_id, processed);
}

/// Fetches and parses one URL into its result
pub async fn process_url(
    url: &Url,
    fetcher: &dyn PageFetcher,
    parser: &dyn PageParser,
    retry: &RetryPolicy,
) -> ScrapeResult {
    tracing::debug!("Processing URL: {}", url);

    match fetch_with_retry(fetcher, url, retry).await {
        FetchOutcome::Success(body) => match parser.parse(&body) {
            Ok(record) => ScrapeResult::record(url.clone(), record),
            Err(failure) => {
                tracing::warn!("Failed to parse {}: {}", url, failure);
                ScrapeResult::parse_failure(url.clone(), failure)
            }
        },
        FetchOutcome::TransientFailure(reason) => {
            tracing::warn!("Giving up on {}: {}", url, reason);
            ScrapeResult::fetch_failure(url.clone(), FetchErrorKind::Transient, reason)
        }
        FetchOutcome::PermanentFailure(reason) => {
            tracing::warn!("Permanent failure for {}: {}", url, reason);
            ScrapeResult::fetch_failure(url.clone(), FetchErrorKind::Permanent, reason)
        }
    }
}
