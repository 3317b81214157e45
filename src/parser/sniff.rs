//! Cheap first-line check that an input file is an OpenVAS report.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parser::ParseError;

const REQUIRED_MARKERS: [&str; 3] = ["extension", "format_id", "content_type"];

/// Verify that the first line of `path` looks like an OpenVAS report
/// element. This is a sniff test, not schema validation: the line must
/// start with `<report` and mention the export attributes the scanner
/// always writes.
pub fn check_report_header(path: &Path) -> Result<(), ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let ok = first_line.starts_with("<report")
        && REQUIRED_MARKERS.iter().all(|m| first_line.contains(m));
    if ok {
        Ok(())
    } else {
        Err(ParseError::InvalidReportFormat {
            path: path.to_path_buf(),
        })
    }
}
