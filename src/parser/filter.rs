//! Record filtering against the active configuration.

use std::collections::HashSet;
use std::net::IpAddr;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::core::config::Config;
use crate::core::errors::ConfigError;
use crate::models::ThreatLevel;
use crate::parser::networks::NetworkScope;
use crate::parser::normalizer::ParsedResult;

/// Compiled filter set. Built once, before any input file is opened, so
/// that every configuration problem surfaces up front.
#[derive(Debug)]
pub struct FilterEngine {
    min_level: ThreatLevel,
    excluded_threats: Vec<String>,
    included_networks: NetworkScope,
    excluded_networks: NetworkScope,
    included_names: Vec<Regex>,
    excluded_names: Vec<Regex>,
    included_cves: HashSet<String>,
    excluded_cves: HashSet<String>,
}

impl FilterEngine {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if !config.networks_included.is_empty() && !config.networks_excluded.is_empty() {
            return Err(ConfigError::NetworkScopeConflict);
        }

        Ok(Self {
            min_level: config.min_level,
            excluded_threats: config
                .excluded_threats
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            included_networks: NetworkScope::parse(&config.networks_included)?,
            excluded_networks: NetworkScope::parse(&config.networks_excluded)?,
            included_names: compile_patterns(&config.regex_included)?,
            excluded_names: compile_patterns(&config.regex_excluded)?,
            included_cves: normalize_cves(&config.cve_included),
            excluded_cves: normalize_cves(&config.cve_excluded),
        })
    }

    /// Decide whether a normalized record enters the report. Checks
    /// short-circuit on the first rejection.
    pub fn accept(&self, record: &ParsedResult) -> bool {
        let ip = record.host_ip.parse::<IpAddr>().ok();

        if !self.excluded_networks.is_empty() {
            if let Some(ip) = ip {
                if self.excluded_networks.contains(ip) {
                    debug!(oid = %record.oid, host = %record.host_ip, "rejected: excluded network");
                    return false;
                }
            }
        }
        if !self.included_networks.is_empty() {
            match ip {
                Some(ip) if self.included_networks.contains(ip) => {}
                _ => {
                    debug!(oid = %record.oid, host = %record.host_ip, "rejected: outside included networks");
                    return false;
                }
            }
        }

        if self.excluded_names.iter().any(|re| re.is_match(&record.name)) {
            debug!(oid = %record.oid, name = %record.name, "rejected: name exclusion pattern");
            return false;
        }
        if !self.included_names.is_empty()
            && !self.included_names.iter().any(|re| re.is_match(&record.name))
        {
            debug!(oid = %record.oid, name = %record.name, "rejected: no name inclusion pattern matched");
            return false;
        }

        if record.cves.iter().any(|cve| self.excluded_cves.contains(cve)) {
            debug!(oid = %record.oid, "rejected: excluded CVE");
            return false;
        }
        if !self.included_cves.is_empty()
            && !record.cves.iter().any(|cve| self.included_cves.contains(cve))
        {
            debug!(oid = %record.oid, "rejected: no included CVE matched");
            return false;
        }

        if !record.level.meets(self.min_level) {
            debug!(oid = %record.oid, level = %record.level, "rejected: below minimum level");
            return false;
        }
        if self.excluded_threats.iter().any(|t| *t == record.threat) {
            debug!(oid = %record.oid, threat = %record.threat, "rejected: excluded threat type");
            return false;
        }

        true
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

fn normalize_cves(cves: &[String]) -> HashSet<String> {
    cves.iter().map(|cve| cve.trim().to_uppercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VulnTags;

    fn record(name: &str, cvss: f32) -> ParsedResult {
        ParsedResult {
            oid: "1.2.3".to_string(),
            name: name.to_string(),
            family: "General".to_string(),
            cvss,
            level: ThreatLevel::from_cvss(cvss),
            threat: "high".to_string(),
            host_ip: "192.168.1.10".to_string(),
            host_name: None,
            port: "80/tcp".to_string(),
            result_text: None,
            cves: vec!["CVE-2020-0001".to_string()],
            references: vec![],
            tags: VulnTags::default(),
        }
    }

    fn build(mutate: impl FnOnce(&mut Config)) -> FilterEngine {
        let mut config = Config::default();
        mutate(&mut config);
        FilterEngine::from_config(&config).unwrap()
    }

    #[test]
    fn default_config_accepts_everything() {
        let engine = build(|_| {});
        assert!(engine.accept(&record("anything", 0.0)));
    }

    #[test]
    fn include_and_exclude_networks_conflict() {
        let mut config = Config::default();
        config.networks_included = vec!["10.0.0.0/8".to_string()];
        config.networks_excluded = vec!["10.1.0.0/16".to_string()];
        assert!(matches!(
            FilterEngine::from_config(&config),
            Err(ConfigError::NetworkScopeConflict)
        ));
    }

    #[test]
    fn network_exclusion() {
        let engine = build(|c| c.networks_excluded = vec!["192.168.1.0/24".to_string()]);
        assert!(!engine.accept(&record("x", 5.0)));

        let engine = build(|c| c.networks_excluded = vec!["10.0.0.0/8".to_string()]);
        assert!(engine.accept(&record("x", 5.0)));
    }

    #[test]
    fn network_inclusion() {
        let engine = build(|c| c.networks_included = vec!["192.168.0.0/16".to_string()]);
        assert!(engine.accept(&record("x", 5.0)));

        let engine = build(|c| c.networks_included = vec!["172.16.0.0/12".to_string()]);
        assert!(!engine.accept(&record("x", 5.0)));
    }

    #[test]
    fn unparsable_host_is_never_in_a_network() {
        let mut rec = record("x", 5.0);
        rec.host_ip = "not-an-address".to_string();

        let engine = build(|c| c.networks_excluded = vec!["0.0.0.0/0".to_string()]);
        assert!(engine.accept(&rec));

        let engine = build(|c| c.networks_included = vec!["0.0.0.0/0".to_string()]);
        assert!(!engine.accept(&rec));
    }

    #[test]
    fn name_patterns_are_case_insensitive() {
        let engine = build(|c| c.regex_excluded = vec!["ssl.*certificate".to_string()]);
        assert!(!engine.accept(&record("SSL/TLS Certificate Expired", 5.0)));
        assert!(engine.accept(&record("Open port", 5.0)));

        let engine = build(|c| c.regex_included = vec!["apache".to_string()]);
        assert!(engine.accept(&record("Apache HTTPD outdated", 5.0)));
        assert!(!engine.accept(&record("nginx outdated", 5.0)));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let mut config = Config::default();
        config.regex_included = vec!["(unclosed".to_string()];
        assert!(matches!(
            FilterEngine::from_config(&config),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn cve_lists_match_case_insensitively() {
        let engine = build(|c| c.cve_excluded = vec!["cve-2020-0001".to_string()]);
        assert!(!engine.accept(&record("x", 5.0)));

        let engine = build(|c| c.cve_included = vec!["CVE-1999-9999".to_string()]);
        assert!(!engine.accept(&record("x", 5.0)));

        let engine = build(|c| c.cve_included = vec!["CVE-2020-0001".to_string()]);
        assert!(engine.accept(&record("x", 5.0)));
    }

    #[test]
    fn minimum_level_threshold() {
        let engine = build(|c| c.min_level = ThreatLevel::High);
        assert!(!engine.accept(&record("x", 5.0)));
        assert!(engine.accept(&record("x", 7.0)));
    }

    #[test]
    fn excluded_threat_types() {
        let engine = build(|c| c.excluded_threats = vec!["Log".to_string()]);
        let mut rec = record("x", 5.0);
        rec.threat = "log".to_string();
        assert!(!engine.accept(&rec));
        rec.threat = "high".to_string();
        assert!(engine.accept(&rec));
    }
}
