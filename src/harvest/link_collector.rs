//! Catalog link collection from the index page

use crate::config::SelectorConfig;
use crate::harvest::{compile_selector, fetch_with_retry, PageFetcher, RetryPolicy};
use crate::model::FetchOutcome;
use crate::url::canonicalize_url;
use crate::{ConfigError, FetchErrorKind, HarvestError};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Derives the work set of species URLs from the catalog index page
pub struct LinkCollector {
    fetcher: Arc<dyn PageFetcher>,
    row: Selector,
    link: Selector,
    retry: RetryPolicy,
}

impl LinkCollector {
    pub fn new(fetcher: Arc<dyn PageFetcher>, selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            row: compile_selector("index-row", &selectors.index_row)?,
            link: compile_selector("index-link", &selectors.index_link)?,
            retry: RetryPolicy::none(),
        })
    }

    /// Retries transient index failures with `retry`
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches the index page and returns its canonical, deduplicated links
    ///
    /// # Errors
    ///
    /// * `HarvestError::Fetch` - the index page could not be retrieved
    /// * `HarvestError::EmptyResult` - the index yielded no links, which
    ///   usually means the markup drifted away from the selectors
    pub async fn collect(&self, index_url: &Url) -> Result<HashSet<Url>, HarvestError> {
        tracing::info!("Collecting catalog links from {}", index_url);

        let body = match fetch_with_retry(self.fetcher.as_ref(), index_url, &self.retry).await {
            FetchOutcome::Success(body) => body,
            FetchOutcome::TransientFailure(reason) => {
                return Err(HarvestError::Fetch {
                    url: index_url.to_string(),
                    kind: FetchErrorKind::Transient,
                    reason,
                });
            }
            FetchOutcome::PermanentFailure(reason) => {
                return Err(HarvestError::Fetch {
                    url: index_url.to_string(),
                    kind: FetchErrorKind::Permanent,
                    reason,
                });
            }
        };

        let links = extract_catalog_links(&body, index_url, &self.row, &self.link);
        if links.is_empty() {
            return Err(HarvestError::EmptyResult {
                url: index_url.to_string(),
            });
        }

        tracing::info!("Found {} catalog links", links.len());
        Ok(links)
    }
}

/// Extracts the first link of every catalog row
///
/// Rows without a usable link (header rows, fragment-only or non-HTTP
/// anchors) are skipped.
pub fn extract_catalog_links(
    html: &str,
    base_url: &Url,
    row: &Selector,
    link: &Selector,
) -> HashSet<Url> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    for entry in document.select(row) {
        let Some(href) = entry
            .select(link)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
        else {
            continue;
        };

        if href.trim().is_empty() || href.trim_start().starts_with('#') {
            continue;
        }

        match canonicalize_url(href, base_url) {
            Ok(url) => {
                if !links.insert(url) {
                    tracing::trace!("Duplicate catalog link {}", href);
                }
            }
            Err(e) => tracing::debug!("Skipping catalog link {}: {}", href, e),
        }
    }

    links
}
