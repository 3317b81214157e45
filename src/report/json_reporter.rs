//! Machine-readable JSON output of the full report model.

use std::path::{Path, PathBuf};

use crate::report::{write_output, ReportError, Reporter, ScanReport};

pub struct JsonReporter {
    pretty_print: bool,
}

impl JsonReporter {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    pub fn render(&self, report: &ScanReport) -> Result<String, ReportError> {
        if self.pretty_print {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
        .map_err(|e| ReportError::SerializationError(e.to_string()))
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for JsonReporter {
    fn generate(&self, report: &ScanReport, output_path: &Path) -> Result<PathBuf, ReportError> {
        let contents = self.render(report)?;
        write_output(output_path, &contents)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Host, Port, ThreatLevel, VulnTags, Vulnerability};
    use crate::report::{ReportMetadata, ScanReport};
    use chrono::Utc;

    #[test]
    fn serializes_full_model() {
        let mut vuln = Vulnerability {
            id: "1.2.3".to_string(),
            name: "Test".to_string(),
            threat: "medium".to_string(),
            level: ThreatLevel::Medium,
            cvss: 5.0,
            family: "General".to_string(),
            cves: vec!["CVE-2020-0001".to_string()],
            references: vec![],
            tags: VulnTags::default(),
            hosts: vec![],
        };
        vuln.add_occurrence(
            Host::new("10.0.0.1", None),
            Port::from_string("80/tcp", None).unwrap(),
        );
        let report = ScanReport::by_vulnerability(
            vec![vuln],
            ReportMetadata {
                generated_at: Utc::now(),
                tool_version: "test".to_string(),
                input_files: vec![],
                min_level: ThreatLevel::None,
            },
        );

        let json = JsonReporter::default().render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total_vulnerabilities"], 1);
        assert_eq!(
            value["data"]["vulnerabilities"][0]["level"],
            serde_json::json!("medium")
        );
    }
}
