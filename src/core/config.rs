use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;
use crate::models::ThreatLevel;
use crate::report::ReportFormat;

/// How findings are grouped in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// One entry per distinct finding, listing affected hosts.
    #[default]
    Vulnerability,
    /// One entry per host, listing its findings and statistics.
    Host,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportMode::Vulnerability => "vulnerability",
            ReportMode::Host => "host",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vulnerability" | "vuln" => Ok(ReportMode::Vulnerability),
            "host" => Ok(ReportMode::Host),
            _ => Err(ConfigError::InvalidReportMode(s.to_string())),
        }
    }
}

/// Run configuration: inputs, output, and the filter surface consumed by
/// the ingestion pipeline. Loadable from a YAML file; command-line flags
/// override file values field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_files: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub min_level: ThreatLevel,
    pub report_type: ReportMode,
    pub format: ReportFormat,
    /// Only hosts inside these ranges are reported. Mutually exclusive
    /// with `networks_excluded`.
    pub networks_included: Vec<String>,
    /// Hosts inside these ranges are dropped.
    pub networks_excluded: Vec<String>,
    /// Keep only findings whose name matches one of these patterns.
    pub regex_included: Vec<String>,
    /// Drop findings whose name matches one of these patterns.
    pub regex_excluded: Vec<String>,
    pub cve_included: Vec<String>,
    pub cve_excluded: Vec<String>,
    /// Raw scanner threat labels to drop (e.g. "log", "debug").
    pub excluded_threats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_files: Vec::new(),
            output_file: PathBuf::from("openvas_report"),
            min_level: ThreatLevel::None,
            report_type: ReportMode::Vulnerability,
            format: ReportFormat::Csv,
            networks_included: Vec::new(),
            networks_excluded: Vec::new(),
            regex_included: Vec::new(),
            regex_excluded: Vec::new(),
            cve_included: Vec::new(),
            cve_excluded: Vec::new(),
            excluded_threats: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Cheap structural checks, run before any input file is opened.
    /// Filter patterns and network ranges are validated when the filter
    /// engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_files.is_empty() {
            return Err(ConfigError::NoInputFiles);
        }
        if !self.networks_included.is_empty() && !self.networks_excluded.is_empty() {
            return Err(ConfigError::NetworkScopeConflict);
        }
        Ok(())
    }
}
