//! JSON export of a harvest report

use crate::harvest::HarvestReport;
use crate::HarvestError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes the report as pretty-printed JSON
pub fn to_json(report: &HarvestReport) -> Result<String, HarvestError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes the report as pretty-printed JSON to `output_path`
pub fn write_json(report: &HarvestReport, output_path: &Path) -> Result<(), HarvestError> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
