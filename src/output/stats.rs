//! Statistics for a finished harvest
//!
//! This module provides functionality for summarizing a harvest report
//! and printing the summary to the console.

use crate::harvest::HarvestReport;
use std::collections::BTreeMap;

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestStatistics {
    /// Distinct catalog URLs found on the index page
    pub urls_discovered: usize,

    /// Records that made it into the harvest
    pub records: usize,

    /// URLs that produced no record
    pub failures: usize,

    /// Failure counts keyed by failure kind
    pub failures_by_kind: BTreeMap<String, usize>,

    /// Record counts keyed by primary category
    pub records_by_category: BTreeMap<String, usize>,

    /// Record counts keyed by generation
    pub records_by_generation: BTreeMap<u32, usize>,

    /// Records whose metric total disagrees with the components
    pub data_quality_warnings: usize,

    pub duration_seconds: f64,
}

impl HarvestStatistics {
    pub fn from_report(report: &HarvestReport) -> Self {
        let harvest = &report.harvest;

        let mut failures_by_kind = BTreeMap::new();
        for failure in &harvest.failures {
            *failures_by_kind.entry(failure.kind.to_string()).or_insert(0) += 1;
        }

        let mut records_by_category = BTreeMap::new();
        let mut records_by_generation = BTreeMap::new();
        for record in &harvest.records {
            *records_by_category
                .entry(record.primary_category.clone())
                .or_insert(0) += 1;
            *records_by_generation.entry(record.generation_tag).or_insert(0) += 1;
        }

        Self {
            urls_discovered: report.urls_discovered,
            records: harvest.records.len(),
            failures: harvest.failures.len(),
            failures_by_kind,
            records_by_category,
            records_by_generation,
            data_quality_warnings: harvest.data_quality_warnings().len(),
            duration_seconds: report.duration_seconds(),
        }
    }

    /// Share of discovered URLs that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.urls_discovered == 0 {
            return 0.0;
        }
        (self.records as f64 / self.urls_discovered as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Catalog URLs discovered: {}", stats.urls_discovered);
    println!("  Records extracted: {}", stats.records);
    println!("  Failures: {}", stats.failures);
    println!("  Data quality warnings: {}", stats.data_quality_warnings);
    println!("  Duration: {:.2}s", stats.duration_seconds);
    println!();

    if !stats.records_by_generation.is_empty() {
        println!("Records by Generation:");
        for (generation, count) in &stats.records_by_generation {
            println!("  Generation {}: {}", generation, count);
        }
        println!();
    }

    if !stats.failures_by_kind.is_empty() {
        println!("Failure Summary:");
        let mut kinds: Vec<_> = stats.failures_by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in kinds {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages extracted)",
        stats.success_rate(),
        stats.records,
        stats.urls_discovered
    );
}
