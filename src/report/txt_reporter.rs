//! Plain tabular text output.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::models::{HostEntry, ThreatLevel, Vulnerability};
use crate::report::{write_output, ReportData, ReportError, Reporter, ScanReport, Summary};

const RULE: &str =
    "================================================================================";

pub struct TxtReporter;

impl TxtReporter {
    pub fn render(&self, report: &ScanReport) -> Result<String, ReportError> {
        let mut out = String::new();
        render_header(&mut out, report)
            .and_then(|_| match &report.data {
                ReportData::Vulnerabilities(vulns) => render_vulnerabilities(&mut out, vulns),
                ReportData::Hosts(tree) => render_hosts(&mut out, &tree.ordered_by_rank()),
            })
            .map_err(|e| ReportError::RenderingError(e.to_string()))?;
        Ok(out)
    }
}

impl Reporter for TxtReporter {
    fn generate(&self, report: &ScanReport, output_path: &Path) -> Result<PathBuf, ReportError> {
        let contents = self.render(report)?;
        write_output(output_path, &contents)
    }

    fn format_name(&self) -> &'static str {
        "text"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

fn render_header(out: &mut String, report: &ScanReport) -> Result<(), std::fmt::Error> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "OpenVAS scan report summary")?;
    writeln!(
        out,
        "generated {} | minimum level: {}",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.metadata.min_level
    )?;
    for input in &report.metadata.input_files {
        writeln!(out, "input: {}", input.display())?;
    }
    writeln!(out, "{RULE}")?;
    render_summary(out, &report.summary)?;
    writeln!(out, "{RULE}")?;
    Ok(())
}

fn render_summary(out: &mut String, summary: &Summary) -> Result<(), std::fmt::Error> {
    writeln!(
        out,
        "{} vulnerabilities on {} hosts",
        summary.total_vulnerabilities, summary.total_hosts
    )?;
    writeln!(out)?;
    writeln!(out, "{:<10} {:>8} {:>10}", "level", "vulns", "affected")?;
    for level in ThreatLevel::ALL {
        writeln!(
            out,
            "{:<10} {:>8} {:>10}",
            level.label(),
            summary.vulns_by_level.get(level),
            summary.hosts_by_level.get(level)
        )?;
    }
    Ok(())
}

fn render_vulnerabilities(
    out: &mut String,
    vulns: &[Vulnerability],
) -> Result<(), std::fmt::Error> {
    for vuln in vulns {
        writeln!(out)?;
        writeln!(out, "[{}] {} (CVSS {:.1})", vuln.level.label(), vuln.name, vuln.cvss)?;
        writeln!(out, "  plugin: {} | family: {}", vuln.id, vuln.family)?;
        if !vuln.cves.is_empty() {
            writeln!(out, "  cves: {}", vuln.cves.join(", "))?;
        }
        if let Some(summary) = vuln.tags.summary.as_deref() {
            writeln!(out, "  summary: {}", indent_continuations(summary))?;
        }
        if let Some(solution) = vuln.tags.solution.as_deref() {
            writeln!(out, "  solution: {}", indent_continuations(solution))?;
        }
        writeln!(out, "  seen on:")?;
        for (host, port) in &vuln.hosts {
            writeln!(out, "    {host} {port}")?;
        }
    }
    Ok(())
}

fn render_hosts(out: &mut String, entries: &[&HostEntry]) -> Result<(), std::fmt::Error> {
    for entry in entries {
        writeln!(out)?;
        writeln!(
            out,
            "{} - {} findings (max CVSS {:.1}, cumulative {:.1})",
            entry.host,
            entry.num_vulns(),
            entry.max_cvss,
            entry.cumulative_cvss
        )?;
        writeln!(
            out,
            "  critical: {} | high: {} | medium: {} | low: {} | none: {}",
            entry.counts.critical,
            entry.counts.high,
            entry.counts.medium,
            entry.counts.low,
            entry.counts.none
        )?;
        for vuln in &entry.vulns {
            writeln!(out, "    [{}] {} (CVSS {:.1})", vuln.level.label(), vuln.name, vuln.cvss)?;
        }
    }
    Ok(())
}

/// Keep multi-line tag text aligned under its label.
fn indent_continuations(text: &str) -> String {
    text.replace('\n', "\n    ")
}
