//! Deterministic merge of per-URL results

use crate::model::{DataQualityWarning, PageRecord, ScrapeOutcome, ScrapeResult};
use crate::FetchErrorKind;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Reason attached to records dropped for reusing a catalog id
pub const DUPLICATE_CATALOG_ID: &str = "duplicate catalogId";

/// Category of a failed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    TransientFetch,
    PermanentFetch,
    Parse { field: &'static str },
    DuplicateCatalogId,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientFetch => write!(f, "transient fetch"),
            Self::PermanentFetch => write!(f, "permanent fetch"),
            Self::Parse { field } => write!(f, "parse ({})", field),
            Self::DuplicateCatalogId => write!(f, "duplicate"),
        }
    }
}

/// A URL that produced no record, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub url: Url,
    pub kind: FailureKind,
    pub reason: String,
}

/// The immutable outcome of a harvest
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Harvest {
    /// Sorted by `catalog_id`, ids unique
    pub records: Vec<PageRecord>,

    /// Sorted by URL
    pub failures: Vec<FailureEntry>,
}

impl Harvest {
    /// Records whose metric total disagrees with their components
    pub fn data_quality_warnings(&self) -> Vec<DataQualityWarning> {
        self.records
            .iter()
            .filter_map(PageRecord::data_quality_warning)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record(&self, catalog_id: u32) -> Option<&PageRecord> {
        self.records
            .binary_search_by_key(&catalog_id, |r| r.catalog_id)
            .ok()
            .map(|idx| &self.records[idx])
    }
}

/// Partitions results into records and failures
///
/// Records sharing a `catalog_id` keep the one from the lexicographically
/// smallest URL; the rest become `duplicate catalogId` failures. Output is
/// independent of input order.
pub fn aggregate(results: Vec<ScrapeResult>) -> Harvest {
    let mut successes: Vec<(Url, PageRecord)> = Vec::new();
    let mut failures: Vec<FailureEntry> = Vec::new();

    for ScrapeResult { url, outcome } in results {
        match outcome {
            ScrapeOutcome::Record(record) => successes.push((url, record)),
            ScrapeOutcome::ParseFailure(failure) => failures.push(FailureEntry {
                url,
                kind: FailureKind::Parse {
                    field: failure.field,
                },
                reason: failure.to_string(),
            }),
            ScrapeOutcome::FetchFailure { kind, reason } => failures.push(FailureEntry {
                url,
                kind: match kind {
                    FetchErrorKind::Transient => FailureKind::TransientFetch,
                    FetchErrorKind::Permanent => FailureKind::PermanentFetch,
                },
                reason,
            }),
        }
    }

    successes.sort_by(|(url_a, a), (url_b, b)| {
        a.catalog_id
            .cmp(&b.catalog_id)
            .then_with(|| url_a.as_str().cmp(url_b.as_str()))
    });

    let mut records: Vec<PageRecord> = Vec::with_capacity(successes.len());
    for (url, record) in successes {
        if records.last().map(|r| r.catalog_id) == Some(record.catalog_id) {
            tracing::warn!(
                "Catalog #{} already taken, dropping record from {}",
                record.catalog_id,
                url
            );
            failures.push(FailureEntry {
                url,
                kind: FailureKind::DuplicateCatalogId,
                reason: DUPLICATE_CATALOG_ID.to_string(),
            });
        } else {
            records.push(record);
        }
    }

    failures.sort_by(|a, b| {
        a.url
            .as_str()
            .cmp(b.url.as_str())
            .then_with(|| a.reason.cmp(&b.reason))
    });

    Harvest { records, failures }
}
