//! OpenVAS Reporting - convert scanner XML exports into readable reports
//!
//! This library ingests OpenVAS vulnerability-scan XML reports, normalizes
//! the loosely structured result records into a canonical model, applies
//! the configured filters, and writes the aggregate as a spreadsheet,
//! document or tabular text summary.

use std::path::PathBuf;

use chrono::Utc;

pub mod core;
pub mod models;
pub mod parser;
pub mod report;

pub use crate::core::config::{Config, ReportMode};
pub use crate::core::errors::{ConfigError, ReportingError, ReportingResult};
pub use crate::models::{Host, Port, ResultTree, ThreatLevel, Vulnerability};
pub use crate::report::{ReportFormat, ScanReport};

/// Run one full conversion: parse and filter every input file, aggregate
/// per the configured report mode, and write the output. Returns the
/// path of the file written.
pub fn run(config: &Config) -> ReportingResult<PathBuf> {
    config.validate()?;

    let metadata = report::ReportMetadata {
        generated_at: Utc::now(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        input_files: config.input_files.clone(),
        min_level: config.min_level,
    };

    let scan_report = match config.report_type {
        ReportMode::Vulnerability => {
            let vulns = parser::parse_by_vulnerability(config)?;
            ScanReport::by_vulnerability(vulns, metadata)
        }
        ReportMode::Host => {
            let tree = parser::parse_by_host(config)?;
            ScanReport::by_host(tree, metadata)
        }
    };

    Ok(report::manager::write_report(
        &scan_report,
        config.format,
        &config.output_file,
    )?)
}
