//! Error types shared across the crate.

use thiserror::Error;

/// Problems with the run configuration. All of these are raised before
/// the first input file is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("included and excluded networks cannot be combined")]
    NetworkScopeConflict,
    #[error("invalid minimum level '{0}' (expected critical, high, medium, low or none)")]
    InvalidLevel(String),
    #[error("invalid report type '{0}' (expected vulnerability or host)")]
    InvalidReportMode(String),
    #[error("invalid network range '{range}': {reason}")]
    InvalidNetwork { range: String, reason: String },
    #[error("invalid name filter pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
    #[error("no input files were given")]
    NoInputFiles,
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level error for a whole conversion run.
#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] crate::parser::ParseError),
    #[error(transparent)]
    Report(#[from] crate::report::ReportError),
}

/// Result type for conversion runs.
pub type ReportingResult<T> = Result<T, ReportingError>;
