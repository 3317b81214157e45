//! Host-centric aggregation of findings.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::host::Host;
use crate::models::severity::ThreatLevel;
use crate::models::vulnerability::Vulnerability;

/// Per-level finding counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub none: u32,
}

impl SeverityCounts {
    pub fn bump(&mut self, level: ThreatLevel) {
        self.add(level, 1);
    }

    pub fn add(&mut self, level: ThreatLevel, n: u32) {
        match level {
            ThreatLevel::Critical => self.critical += n,
            ThreatLevel::High => self.high += n,
            ThreatLevel::Medium => self.medium += n,
            ThreatLevel::Low => self.low += n,
            ThreatLevel::None => self.none += n,
        }
    }

    pub fn get(&self, level: ThreatLevel) -> u32 {
        match level {
            ThreatLevel::Critical => self.critical,
            ThreatLevel::High => self.high,
            ThreatLevel::Medium => self.medium,
            ThreatLevel::Low => self.low,
            ThreatLevel::None => self.none,
        }
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low + self.none
    }
}

/// A host together with its attached findings and running statistics.
#[derive(Debug, Clone, Serialize)]
pub struct HostEntry {
    pub host: Host,
    pub vulns: Vec<Vulnerability>,
    pub counts: SeverityCounts,
    pub cumulative_cvss: f32,
    pub max_cvss: f32,
}

impl HostEntry {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            vulns: Vec::new(),
            counts: SeverityCounts::default(),
            cumulative_cvss: 0.0,
            max_cvss: 0.0,
        }
    }

    /// Attach a finding to this host. A no-op when a finding with the
    /// same plugin id is already attached; otherwise the running
    /// statistics are updated. Returns whether the finding was added.
    pub fn add_vulnerability(&mut self, vuln: Vulnerability) -> bool {
        if self.vulns.iter().any(|v| v.id == vuln.id) {
            return false;
        }
        self.counts.bump(vuln.level);
        self.cumulative_cvss += vuln.cvss;
        if vuln.cvss > self.max_cvss {
            self.max_cvss = vuln.cvss;
        }
        self.vulns.push(vuln);
        true
    }

    pub fn num_vulns(&self) -> usize {
        self.vulns.len()
    }
}

/// Host-centric report model, keyed by IP.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTree {
    hosts: BTreeMap<String, HostEntry>,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Entry for `host`, created on first use.
    pub fn entry(&mut self, host: Host) -> &mut HostEntry {
        self.hosts
            .entry(host.ip.clone())
            .or_insert_with(|| HostEntry::new(host))
    }

    pub fn get(&self, ip: &str) -> Option<&HostEntry> {
        self.hosts.get(ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostEntry> {
        self.hosts.values()
    }

    /// Hosts ordered by descending cumulative CVSS.
    pub fn ordered_by_cvss(&self) -> Vec<&HostEntry> {
        let mut entries: Vec<&HostEntry> = self.hosts.values().collect();
        entries.sort_by(|a, b| b.cumulative_cvss.total_cmp(&a.cumulative_cvss));
        entries
    }

    /// Hosts ordered by descending number of findings.
    pub fn ordered_by_count(&self) -> Vec<&HostEntry> {
        let mut entries: Vec<&HostEntry> = self.hosts.values().collect();
        entries.sort_by(|a, b| b.num_vulns().cmp(&a.num_vulns()));
        entries
    }

    /// Triage order: descending by (max CVSS, critical, high, medium,
    /// low counts).
    pub fn ordered_by_rank(&self) -> Vec<&HostEntry> {
        let mut entries: Vec<&HostEntry> = self.hosts.values().collect();
        entries.sort_by(|a, b| {
            b.max_cvss
                .total_cmp(&a.max_cvss)
                .then(b.counts.critical.cmp(&a.counts.critical))
                .then(b.counts.high.cmp(&a.counts.high))
                .then(b.counts.medium.cmp(&a.counts.medium))
                .then(b.counts.low.cmp(&a.counts.low))
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vulnerability::VulnTags;

    fn vuln(id: &str, cvss: f32) -> Vulnerability {
        Vulnerability {
            id: id.to_string(),
            name: format!("finding {id}"),
            threat: "high".to_string(),
            level: ThreatLevel::from_cvss(cvss),
            cvss,
            family: "General".to_string(),
            cves: vec![],
            references: vec![],
            tags: VulnTags::default(),
            hosts: vec![],
        }
    }

    #[test]
    fn entry_statistics_track_additions() {
        let mut tree = ResultTree::new();
        let entry = tree.entry(Host::new("10.0.0.1", None));
        assert!(entry.add_vulnerability(vuln("a", 9.5)));
        assert!(entry.add_vulnerability(vuln("b", 5.0)));
        // same plugin id again is a no-op
        assert!(!entry.add_vulnerability(vuln("a", 1.0)));

        let entry = tree.get("10.0.0.1").unwrap();
        assert_eq!(entry.num_vulns(), 2);
        assert_eq!(entry.counts.critical, 1);
        assert_eq!(entry.counts.medium, 1);
        assert!((entry.cumulative_cvss - 14.5).abs() < f32::EPSILON);
        assert!((entry.max_cvss - 9.5).abs() < f32::EPSILON);
    }

    #[test]
    fn same_ip_maps_to_one_entry() {
        let mut tree = ResultTree::new();
        tree.entry(Host::new("10.0.0.1", None));
        tree.entry(Host::new("10.0.0.1", Some("web".to_string())));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn orderings() {
        let mut tree = ResultTree::new();
        {
            let quiet = tree.entry(Host::new("10.0.0.1", None));
            quiet.add_vulnerability(vuln("a", 2.0));
            quiet.add_vulnerability(vuln("b", 2.0));
            quiet.add_vulnerability(vuln("c", 2.0));
        }
        {
            let loud = tree.entry(Host::new("10.0.0.2", None));
            loud.add_vulnerability(vuln("d", 9.8));
        }

        let by_cvss: Vec<&str> = tree
            .ordered_by_cvss()
            .iter()
            .map(|e| e.host.ip.as_str())
            .collect();
        assert_eq!(by_cvss, ["10.0.0.2", "10.0.0.1"]);

        let by_count: Vec<&str> = tree
            .ordered_by_count()
            .iter()
            .map(|e| e.host.ip.as_str())
            .collect();
        assert_eq!(by_count, ["10.0.0.1", "10.0.0.2"]);

        let by_rank: Vec<&str> = tree
            .ordered_by_rank()
            .iter()
            .map(|e| e.host.ip.as_str())
            .collect();
        assert_eq!(by_rank, ["10.0.0.2", "10.0.0.1"]);
    }
}
