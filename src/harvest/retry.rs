//! Retry policy for transient fetch failures

use crate::harvest::PageFetcher;
use crate::model::FetchOutcome;
use std::time::Duration;
use url::Url;

/// Bounded exponential backoff
///
/// Retry `n` (0-based) waits `base_backoff * 2^n`, capped at `max_backoff`.
/// Only `TransientFailure` outcomes are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub limit: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            limit: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Fetches `url`, retrying transient failures according to `policy`
///
/// Returns the first success or permanent failure, or the last transient
/// failure once the retry budget is spent.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &Url,
    policy: &RetryPolicy,
) -> FetchOutcome {
    let mut attempt = 0;
    loop {
        match fetcher.fetch(url).await {
            FetchOutcome::TransientFailure(reason) if attempt < policy.limit => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    "Transient failure for {} ({}), retry {}/{} in {:?}",
                    url,
                    reason,
                    attempt + 1,
                    policy.limit,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
