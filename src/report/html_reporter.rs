//! Document-style HTML output.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::models::{HostEntry, ThreatLevel, Vulnerability};
use crate::report::{write_output, ReportData, ReportError, Reporter, ScanReport, Summary};

pub struct HtmlReporter;

impl HtmlReporter {
    pub fn render(&self, report: &ScanReport) -> Result<String, ReportError> {
        let mut html = String::new();
        render_head(&mut html, report)
            .and_then(|_| {
                render_summary(&mut html, &report.summary)?;
                match &report.data {
                    ReportData::Vulnerabilities(vulns) => render_vulnerabilities(&mut html, vulns),
                    ReportData::Hosts(tree) => render_hosts(&mut html, &tree.ordered_by_rank()),
                }
            })
            .and_then(|_| writeln!(html, "</body>\n</html>"))
            .map_err(|e| ReportError::RenderingError(e.to_string()))?;
        Ok(html)
    }
}

impl Reporter for HtmlReporter {
    fn generate(&self, report: &ScanReport, output_path: &Path) -> Result<PathBuf, ReportError> {
        let contents = self.render(report)?;
        write_output(output_path, &contents)
    }

    fn format_name(&self) -> &'static str {
        "HTML"
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }
}

/// Accent color per level, shared with the original report palette.
fn level_color(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::Critical => "#702da0",
        ThreatLevel::High => "#c80000",
        ThreatLevel::Medium => "#ffc000",
        ThreatLevel::Low => "#00b050",
        ThreatLevel::None => "#0070c0",
    }
}

fn render_head(html: &mut String, report: &ScanReport) -> Result<(), std::fmt::Error> {
    writeln!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>OpenVAS scan report</title>
<style>
body {{ font-family: sans-serif; margin: 2em; color: #222; }}
table {{ border-collapse: collapse; margin: 1em 0; }}
th, td {{ border: 1px solid #bbb; padding: 0.3em 0.8em; text-align: left; }}
th {{ background: #183868; color: #fff; }}
.level {{ color: #fff; padding: 0.1em 0.5em; border-radius: 3px; }}
.finding {{ margin: 1.5em 0; border-left: 4px solid #bbb; padding-left: 1em; }}
</style>
</head>
<body>
<h1>OpenVAS scan report</h1>
<p>generated {} &mdash; minimum level: {}</p>"#,
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.metadata.min_level
    )
}

fn render_summary(html: &mut String, summary: &Summary) -> Result<(), std::fmt::Error> {
    writeln!(html, "<h2>Summary</h2>")?;
    writeln!(
        html,
        "<p>{} vulnerabilities on {} hosts</p>",
        summary.total_vulnerabilities, summary.total_hosts
    )?;
    writeln!(
        html,
        "<table><tr><th>Level</th><th>Vulnerabilities</th><th>Affected</th></tr>"
    )?;
    for level in ThreatLevel::ALL {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            level_badge(level),
            summary.vulns_by_level.get(level),
            summary.hosts_by_level.get(level)
        )?;
    }
    writeln!(html, "</table>")
}

fn level_badge(level: ThreatLevel) -> String {
    format!(
        r#"<span class="level" style="background:{}">{}</span>"#,
        level_color(level),
        level.label()
    )
}

fn render_vulnerabilities(
    html: &mut String,
    vulns: &[Vulnerability],
) -> Result<(), std::fmt::Error> {
    writeln!(html, "<h2>Findings</h2>")?;
    for vuln in vulns {
        writeln!(
            html,
            r#"<div class="finding" style="border-left-color:{}">"#,
            level_color(vuln.level)
        )?;
        writeln!(
            html,
            "<h3>{} {} (CVSS {:.1})</h3>",
            level_badge(vuln.level),
            escape(&vuln.name),
            vuln.cvss
        )?;
        writeln!(
            html,
            "<p>plugin {} &mdash; family {}</p>",
            escape(&vuln.id),
            escape(&vuln.family)
        )?;
        if !vuln.cves.is_empty() {
            writeln!(html, "<p>CVEs: {}</p>", escape(&vuln.cves.join(", ")))?;
        }
        for (label, text) in [
            ("Summary", vuln.tags.summary.as_deref()),
            ("Insight", vuln.tags.insight.as_deref()),
            ("Impact", vuln.tags.impact.as_deref()),
            ("Affected", vuln.tags.affected.as_deref()),
            ("Solution", vuln.tags.solution.as_deref()),
        ] {
            if let Some(text) = text {
                writeln!(html, "<p><b>{label}:</b> {}</p>", escape(text))?;
            }
        }
        writeln!(html, "<table><tr><th>Host</th><th>Name</th><th>Port</th></tr>")?;
        for (host, port) in &vuln.hosts {
            writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&host.ip),
                escape(&host.host_name),
                port
            )?;
        }
        writeln!(html, "</table></div>")?;
    }
    Ok(())
}

fn render_hosts(html: &mut String, entries: &[&HostEntry]) -> Result<(), std::fmt::Error> {
    writeln!(html, "<h2>Hosts</h2>")?;
    writeln!(
        html,
        "<table><tr><th>Host</th><th>Name</th><th>Findings</th><th>Critical</th><th>High</th><th>Medium</th><th>Low</th><th>None</th><th>Max CVSS</th><th>Cumulative</th></tr>"
    )?;
    for entry in entries {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td></tr>",
            escape(&entry.host.ip),
            escape(&entry.host.host_name),
            entry.num_vulns(),
            entry.counts.critical,
            entry.counts.high,
            entry.counts.medium,
            entry.counts.low,
            entry.counts.none,
            entry.max_cvss,
            entry.cumulative_cvss
        )?;
    }
    writeln!(html, "</table>")?;

    for entry in entries {
        writeln!(html, "<h3>{}</h3>", escape(&entry.host.to_string()))?;
        writeln!(html, "<ul>")?;
        for vuln in &entry.vulns {
            writeln!(
                html,
                "<li>{} {} (CVSS {:.1})</li>",
                level_badge(vuln.level),
                escape(&vuln.name),
                vuln.cvss
            )?;
        }
        writeln!(html, "</ul>")?;
    }
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
