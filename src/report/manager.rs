use std::path::{Path, PathBuf};

use tracing::info;

use crate::report::{
    csv_reporter::CsvReporter, html_reporter::HtmlReporter, json_reporter::JsonReporter,
    txt_reporter::TxtReporter, ReportError, ReportFormat, Reporter, ScanReport,
};

/// Write `report` in the requested format, appending the format's file
/// extension when the output path lacks it. Returns the path written.
pub fn write_report(
    report: &ScanReport,
    format: ReportFormat,
    output_path: &Path,
) -> Result<PathBuf, ReportError> {
    let reporter: Box<dyn Reporter> = match format {
        ReportFormat::Csv => Box::new(CsvReporter),
        ReportFormat::Txt => Box::new(TxtReporter),
        ReportFormat::Html => Box::new(HtmlReporter),
        ReportFormat::Json => Box::new(JsonReporter::default()),
    };

    let final_path = ensure_extension(output_path, reporter.file_extension());
    let written = reporter.generate(report, &final_path)?;
    info!(
        format = reporter.format_name(),
        path = %written.display(),
        "report written"
    );
    Ok(written)
}

fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(extension) => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(extension);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreatLevel;
    use crate::report::{ReportData, ReportMetadata, Summary};
    use chrono::Utc;

    fn empty_report() -> ScanReport {
        ScanReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                tool_version: "test".to_string(),
                input_files: vec![],
                min_level: ThreatLevel::None,
            },
            summary: Summary::default(),
            data: ReportData::Vulnerabilities(vec![]),
        }
    }

    #[test]
    fn extension_is_appended_once() {
        assert_eq!(
            ensure_extension(Path::new("out/report"), "csv"),
            PathBuf::from("out/report.csv")
        );
        assert_eq!(
            ensure_extension(Path::new("out/report.csv"), "csv"),
            PathBuf::from("out/report.csv")
        );
        assert_eq!(
            ensure_extension(Path::new("out/report.xml"), "csv"),
            PathBuf::from("out/report.xml.csv")
        );
    }

    #[test]
    fn writes_to_requested_format() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("report");
        for (format, ext) in [
            (ReportFormat::Csv, "csv"),
            (ReportFormat::Txt, "txt"),
            (ReportFormat::Html, "html"),
            (ReportFormat::Json, "json"),
        ] {
            let written = write_report(&empty_report(), format, &base).unwrap();
            assert_eq!(written, dir.path().join(format!("report.{ext}")));
            assert!(written.exists());
        }
    }
}
