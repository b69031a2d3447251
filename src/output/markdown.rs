//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a harvest,
//! including run metadata, the extracted records, failures and data-quality
//! warnings.

use crate::harvest::HarvestReport;
use crate::output::stats::HarvestStatistics;
use crate::HarvestError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
pub fn generate_markdown_summary(
    report: &HarvestReport,
    output_path: &Path,
) -> Result<(), HarvestError> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest report as markdown
pub fn format_markdown_summary(report: &HarvestReport) -> String {
    let stats = HarvestStatistics::from_report(report);
    let harvest = &report.harvest;
    let mut md = String::new();

    md.push_str("# Dex-Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Index**: {}\n", report.index_url));
    md.push_str(&format!("- **Started**: {}\n", report.started_at));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n\n",
        stats.duration_seconds
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **URLs Discovered**: {}\n",
        stats.urls_discovered
    ));
    md.push_str(&format!("- **Records**: {}\n", stats.records));
    md.push_str(&format!("- **Failures**: {}\n", stats.failures));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    // Records
    if !harvest.records.is_empty() {
        md.push_str("## Records\n\n");
        md.push_str("| # | Name | Primary | Secondary | Total | Generation |\n");
        md.push_str("|---|------|---------|-----------|-------|------------|\n");
        for record in &harvest.records {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                record.catalog_id,
                record.name,
                record.primary_category,
                record.secondary_category_label(),
                record.metrics.total(),
                record.generation_tag
            ));
        }
        md.push('\n');
    }

    // Failures
    if !harvest.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Kind | Reason |\n");
        md.push_str("|-----|------|--------|\n");
        for failure in &harvest.failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.url, failure.kind, failure.reason
            ));
        }
        md.push('\n');
    }

    let warnings = harvest.data_quality_warnings();
    if !warnings.is_empty() {
        md.push_str("## Data Quality Warnings\n\n");
        for warning in &warnings {
            md.push_str(&format!("- {}\n", warning));
        }
        md.push('\n');
    }

    md
}
