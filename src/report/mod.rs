use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ResultTree, SeverityCounts, ThreatLevel, Vulnerability};

pub mod csv_reporter;
pub mod html_reporter;
pub mod json_reporter;
pub mod manager;
pub mod txt_reporter;

/// Report formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Txt,
    Html,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "txt" | "text" => Ok(ReportFormat::Txt),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            _ => Err(ReportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Txt => "txt",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }
}

/// Report errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("serialization error: {0}")]
    SerializationError(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("rendering error: {0}")]
    RenderingError(String),
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub input_files: Vec<PathBuf>,
    pub min_level: ThreatLevel,
}

/// Per-level totals shared by every output format.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Summary {
    pub total_vulnerabilities: u32,
    pub total_hosts: u32,
    /// Distinct findings per level.
    pub vulns_by_level: SeverityCounts,
    /// Affected endpoints per level (one per host/port occurrence in
    /// vulnerability mode, one per host in host mode).
    pub hosts_by_level: SeverityCounts,
}

/// The aggregated model handed to a reporter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportData {
    Vulnerabilities(Vec<Vulnerability>),
    Hosts(ResultTree),
}

/// Everything a reporter needs to produce one output file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub metadata: ReportMetadata,
    pub summary: Summary,
    pub data: ReportData,
}

impl ScanReport {
    /// Vulnerability-centric report. Findings are ordered by descending
    /// CVSS; ties keep their first-seen order.
    pub fn by_vulnerability(mut vulns: Vec<Vulnerability>, metadata: ReportMetadata) -> Self {
        vulns.sort_by(|a, b| b.cvss.total_cmp(&a.cvss));
        let summary = summarize_vulnerabilities(&vulns);
        ScanReport {
            metadata,
            summary,
            data: ReportData::Vulnerabilities(vulns),
        }
    }

    /// Host-centric report.
    pub fn by_host(tree: ResultTree, metadata: ReportMetadata) -> Self {
        let summary = summarize_hosts(&tree);
        ScanReport {
            metadata,
            summary,
            data: ReportData::Hosts(tree),
        }
    }
}

fn summarize_vulnerabilities(vulns: &[Vulnerability]) -> Summary {
    let mut summary = Summary {
        total_vulnerabilities: vulns.len() as u32,
        ..Summary::default()
    };
    let mut distinct_hosts: HashSet<&str> = HashSet::new();
    for vuln in vulns {
        summary.vulns_by_level.bump(vuln.level);
        summary
            .hosts_by_level
            .add(vuln.level, vuln.hosts.len() as u32);
        for (host, _) in &vuln.hosts {
            distinct_hosts.insert(host.ip.as_str());
        }
    }
    summary.total_hosts = distinct_hosts.len() as u32;
    summary
}

fn summarize_hosts(tree: &ResultTree) -> Summary {
    let mut summary = Summary {
        total_hosts: tree.len() as u32,
        ..Summary::default()
    };
    for entry in tree.iter() {
        summary.total_vulnerabilities += entry.num_vulns() as u32;
        for level in ThreatLevel::ALL {
            let count = entry.counts.get(level);
            summary.vulns_by_level.add(level, count);
            if count > 0 {
                summary.hosts_by_level.bump(level);
            }
        }
    }
    summary
}

/// Reporter trait - each output format implements this trait
pub trait Reporter {
    fn generate(&self, report: &ScanReport, output_path: &Path) -> Result<PathBuf, ReportError>;
    fn format_name(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
}

/// Shared file-writing plumbing for reporters.
pub(crate) fn write_output(output_path: &Path, contents: &str) -> Result<PathBuf, ReportError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ReportError::IoError(format!("failed to create output directory: {e}")))?;
    }
    fs::write(output_path, contents)
        .map_err(|e| ReportError::IoError(format!("failed to write report: {e}")))?;
    Ok(output_path.to_path_buf())
}
