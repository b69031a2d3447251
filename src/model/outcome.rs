//! Per-URL outcome types passed between pipeline stages

use crate::model::PageRecord;
use crate::FetchErrorKind;
use thiserror::Error;
use url::Url;

/// Reason recorded for URLs still unresolved when the deadline elapses
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Classified result of a single network retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page body
    Success(String),

    /// Worth retrying: connection errors, timeouts, 5xx, 429
    TransientFailure(String),

    /// Never retried: 4xx, malformed URL, redirect limit
    PermanentFailure(String),
}

impl FetchOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}

/// A field extractor could not produce its value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to extract {field}: {reason}")]
pub struct ParseFailure {
    /// Name of the failing field (`catalogId`, `name`, `categories`, `metrics`, `generationTag`)
    pub field: &'static str,
    pub reason: String,
}

impl ParseFailure {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// What happened to one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Record(PageRecord),
    ParseFailure(ParseFailure),
    FetchFailure { kind: FetchErrorKind, reason: String },
}

/// The single result the pool emits for each input URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResult {
    pub url: Url,
    pub outcome: ScrapeOutcome,
}

impl ScrapeResult {
    pub fn record(url: Url, record: PageRecord) -> Self {
        Self {
            url,
            outcome: ScrapeOutcome::Record(record),
        }
    }

    pub fn parse_failure(url: Url, failure: ParseFailure) -> Self {
        Self {
            url,
            outcome: ScrapeOutcome::ParseFailure(failure),
        }
    }

    pub fn fetch_failure(url: Url, kind: FetchErrorKind, reason: impl Into<String>) -> Self {
        Self {
            url,
            outcome: ScrapeOutcome::FetchFailure {
                kind,
                reason: reason.into(),
            },
        }
    }

    /// Result for a URL cancelled by the overall deadline
    pub fn deadline_exceeded(url: Url) -> Self {
        Self::fetch_failure(url, FetchErrorKind::Transient, DEADLINE_EXCEEDED)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ScrapeOutcome::Record(_))
    }
}
