//! Spreadsheet-style CSV output.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::models::{HostEntry, Vulnerability};
use crate::report::{write_output, ReportData, ReportError, Reporter, ScanReport};

pub struct CsvReporter;

impl CsvReporter {
    pub fn render(&self, report: &ScanReport) -> Result<String, ReportError> {
        match &report.data {
            ReportData::Vulnerabilities(vulns) => render_vulnerabilities(vulns),
            ReportData::Hosts(tree) => render_hosts(&tree.ordered_by_rank()),
        }
        .map_err(|e| ReportError::RenderingError(e.to_string()))
    }
}

impl Reporter for CsvReporter {
    fn generate(&self, report: &ScanReport, output_path: &Path) -> Result<PathBuf, ReportError> {
        let contents = self.render(report)?;
        write_output(output_path, &contents)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }
}

/// One row per (finding, endpoint) pair.
fn render_vulnerabilities(vulns: &[Vulnerability]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "hostname,ip,port,protocol,vulnerability,cvss,level,family,summary,detection,insight,impact,affected,solution,solution_type,vuln_id,cves,references"
    )?;
    for vuln in vulns {
        for (host, port) in &vuln.hosts {
            writeln!(
                out,
                "{},{},{},{},{},{:.1},{},{},{},{},{},{},{},{},{},{},{},{}",
                csv_escape(&host.host_name),
                csv_escape(&host.ip),
                port.number,
                csv_escape(&port.protocol),
                csv_escape(&vuln.name),
                vuln.cvss,
                vuln.level,
                csv_escape(&vuln.family),
                csv_escape(vuln.tags.summary.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.detection.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.insight.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.impact.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.affected.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.solution.as_deref().unwrap_or("")),
                csv_escape(vuln.tags.solution_type.as_deref().unwrap_or("")),
                csv_escape(&vuln.id),
                csv_escape(&vuln.cves.join(" ")),
                csv_escape(&vuln.references.join(" ")),
            )?;
        }
    }
    Ok(out)
}

/// One row per host, in triage rank order.
fn render_hosts(entries: &[&HostEntry]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "ip,hostname,num_vulns,critical,high,medium,low,none,cumulative_cvss,max_cvss"
    )?;
    for entry in entries {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{:.1},{:.1}",
            csv_escape(&entry.host.ip),
            csv_escape(&entry.host.host_name),
            entry.num_vulns(),
            entry.counts.critical,
            entry.counts.high,
            entry.counts.medium,
            entry.counts.low,
            entry.counts.none,
            entry.cumulative_cvss,
            entry.max_cvss,
        )?;
    }
    Ok(out)
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
