//! Report ingestion pipeline: sniff test, XML extraction, record
//! normalization, filtering and aggregation.

pub mod filter;
pub mod networks;
pub mod normalizer;
pub mod sniff;
pub mod xml;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::errors::ReportingResult;
use crate::models::{Host, Port, PortParseError, ResultTree, Vulnerability};

pub use filter::FilterEngine;
pub use normalizer::ParsedResult;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("'{}' is not an OpenVAS report export", .path.display())]
    InvalidReportFormat { path: PathBuf },
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed XML in '{}': {source}", .path.display())]
    Xml {
        path: PathBuf,
        source: xml::XmlError,
    },
    #[error(transparent)]
    Port(#[from] PortParseError),
    #[error("no hosts are left after filtering; check scope and exclusion settings")]
    NoResults,
}

/// Aggregate accepted records by plugin id: duplicate ids merge into one
/// `Vulnerability` (first-seen metadata wins) accumulating host/port
/// occurrences across all input files.
pub fn parse_by_vulnerability(config: &Config) -> ReportingResult<Vec<Vulnerability>> {
    let engine = FilterEngine::from_config(config)?;

    let mut vulns: Vec<Vulnerability> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    each_accepted(config, &engine, |record| {
        let (vuln, host, port) = split_record(record)?;
        match index.get(&vuln.id) {
            Some(&slot) => {
                vulns[slot].add_occurrence(host, port);
            }
            None => {
                let mut vuln = vuln;
                vuln.add_occurrence(host, port);
                index.insert(vuln.id.clone(), vulns.len());
                vulns.push(vuln);
            }
        }
        Ok(())
    })?;

    info!(vulnerabilities = vulns.len(), "aggregated findings by vulnerability");
    Ok(vulns)
}

/// Aggregate accepted records per host IP into a `ResultTree`.
///
/// An empty tree after all files were processed is an error: it means
/// the filters removed everything, which is distinct from a clean scan.
pub fn parse_by_host(config: &Config) -> ReportingResult<ResultTree> {
    let engine = FilterEngine::from_config(config)?;

    let mut tree = ResultTree::new();
    each_accepted(config, &engine, |record| {
        let (mut vuln, host, port) = split_record(record)?;
        vuln.add_occurrence(host.clone(), port);
        tree.entry(host).add_vulnerability(vuln);
        Ok(())
    })?;

    if tree.is_empty() {
        return Err(ParseError::NoResults.into());
    }
    info!(hosts = tree.len(), "aggregated findings by host");
    Ok(tree)
}

/// Run every input file through extraction, normalization and the filter
/// engine, handing accepted records to `apply` in document order.
///
/// All files are sniff-tested before the first one is parsed, so a batch
/// with one bad file produces no partial work.
fn each_accepted<F>(config: &Config, engine: &FilterEngine, mut apply: F) -> Result<(), ParseError>
where
    F: FnMut(ParsedResult) -> Result<(), ParseError>,
{
    for path in &config.input_files {
        sniff::check_report_header(path)?;
    }

    for path in &config.input_files {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        let raws = xml::read_results(&content).map_err(|source| ParseError::Xml {
            path: path.clone(),
            source,
        })?;

        let mut kept = 0usize;
        for raw in &raws {
            let Some(record) = normalizer::normalize(raw) else {
                continue;
            };
            if !engine.accept(&record) {
                continue;
            }
            kept += 1;
            apply(record)?;
        }
        debug!(
            file = %path.display(),
            results = raws.len(),
            kept,
            "processed report file"
        );
    }
    Ok(())
}

/// Turn a normalized record into its model pieces. Port parsing happens
/// here, after filtering, so rejected records never fail the batch.
fn split_record(record: ParsedResult) -> Result<(Vulnerability, Host, Port), ParseError> {
    let port = Port::from_string(&record.port, record.result_text.as_deref())?;
    let host = Host::new(record.host_ip, record.host_name);
    let vuln = Vulnerability {
        id: record.oid,
        name: record.name,
        threat: record.threat,
        level: record.level,
        cvss: record.cvss,
        family: record.family,
        cves: record.cves,
        references: record.references,
        tags: record.tags,
        hosts: Vec::new(),
    };
    Ok((vuln, host, port))
}
