//! A distinct finding and the endpoints it was observed on.

use serde::Serialize;

use crate::models::host::Host;
use crate::models::port::Port;
use crate::models::severity::ThreatLevel;

/// Structured description fields decomposed from the scanner's tag blob.
///
/// The scanner bundles these as one `key=value|key=value` string; unknown
/// keys (CVSS vectors, QoD metadata, ...) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnTags {
    pub summary: Option<String>,
    pub detection: Option<String>,
    pub insight: Option<String>,
    pub impact: Option<String>,
    pub affected: Option<String>,
    pub solution: Option<String>,
    pub solution_type: Option<String>,
}

impl VulnTags {
    /// Parse a raw tag blob.
    ///
    /// Whitespace runs are collapsed first (runs containing a line break
    /// become a single newline, others a single space), then the blob is
    /// split on `|` and each segment on its first `=`.
    pub fn from_blob(raw: &str) -> Self {
        let mut tags = VulnTags::default();
        for segment in normalize_blob(raw).split('|') {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());
            match key.trim() {
                "summary" => tags.summary = value,
                "vuldetect" => tags.detection = value,
                "insight" => tags.insight = value,
                "impact" => tags.impact = value,
                "affected" => tags.affected = value,
                "solution" => tags.solution = value,
                "solution_type" => tags.solution_type = value,
                _ => {}
            }
        }
        tags
    }

    pub fn is_empty(&self) -> bool {
        *self == VulnTags::default()
    }
}

/// Collapse redundant whitespace while preserving line breaks.
fn normalize_blob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut run_pending = false;
    let mut run_has_newline = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            run_pending = true;
            run_has_newline |= ch == '\n' || ch == '\r';
        } else {
            if run_pending && !out.is_empty() {
                out.push(if run_has_newline { '\n' } else { ' ' });
            }
            run_pending = false;
            run_has_newline = false;
            out.push(ch);
        }
    }
    out
}

/// One distinct finding, keyed by the scanner's plugin id (OID).
///
/// Records with the same plugin id merge into a single `Vulnerability`;
/// the first-seen metadata wins and later records only contribute
/// additional host/port occurrences.
#[derive(Debug, Clone, Serialize)]
pub struct Vulnerability {
    pub id: String,
    pub name: String,
    /// Raw scanner threat label, lowercased.
    pub threat: String,
    pub level: ThreatLevel,
    pub cvss: f32,
    pub family: String,
    pub cves: Vec<String>,
    pub references: Vec<String>,
    pub tags: VulnTags,
    /// Where this finding was observed. Pairs are unique.
    pub hosts: Vec<(Host, Port)>,
}

impl Vulnerability {
    /// Record an observation of this finding. Duplicate pairs (by
    /// structural equality) are ignored; returns whether the pair was
    /// added.
    pub fn add_occurrence(&mut self, host: Host, port: Port) -> bool {
        if self
            .hosts
            .iter()
            .any(|(h, p)| *h == host && *p == port)
        {
            return false;
        }
        self.hosts.push((host, port));
        true
    }
}
