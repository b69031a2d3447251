//! Data model shared by every pipeline stage
//!
//! - [`PageRecord`]: the typed record extracted from one species page
//! - [`FetchOutcome`]: the classified result of one network retrieval
//! - [`ScrapeResult`]: the per-URL result handed from the pool to aggregation

mod outcome;
mod record;

pub use outcome::{FetchOutcome, ParseFailure, ScrapeOutcome, ScrapeResult, DEADLINE_EXCEEDED};
pub use record::{DataQualityWarning, MetricLabel, Metrics, PageRecord};
