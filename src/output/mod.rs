//! Output module: hands a finished harvest to its consumers
//!
//! This module handles:
//! - Exporting the report as JSON
//! - Generating a markdown summary of records and failures
//! - Computing and printing run statistics

mod json;
mod markdown;
pub mod stats;

pub use json::{to_json, write_json};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, HarvestStatistics};
