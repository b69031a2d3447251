//! Harvest module: the concurrent fetch-and-extract pipeline
//!
//! This module contains the pipeline stages, leaves first:
//! - HTTP fetching with failure classification
//! - Retry with exponential backoff for transient failures
//! - Species page parsing into typed records
//! - Catalog link collection from the index page
//! - Bounded worker-pool scheduling
//! - Deterministic result aggregation
//! - Overall run coordination

mod aggregator;
mod coordinator;
mod fetcher;
mod link_collector;
mod page_parser;
mod retry;
mod scheduler;

pub use aggregator::{aggregate, FailureEntry, FailureKind, Harvest, DUPLICATE_CATALOG_ID};
pub use coordinator::{run_harvest, HarvestReport, Harvester};
pub use fetcher::{build_http_client, classify_status, fetch_url, FetchOptions, HttpFetcher, PageFetcher};
pub use link_collector::{extract_catalog_links, LinkCollector};
pub use page_parser::{compile_selector, PageParser, PageSelectors, SpeciesPageParser};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use scheduler::{process_url, Scheduler, SchedulerConfig};
