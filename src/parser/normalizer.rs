//! Normalization of raw result records into the canonical intermediate
//! representation consumed by filtering and aggregation.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{ThreatLevel, VulnTags};
use crate::parser::xml::RawResult;

/// Plugin id the scanner emits when no information is available.
pub const NO_INFORMATION_OID: &str = "0";

/// Sentinel meaning "no CVE assigned" in legacy reports.
const NO_CVE: &str = "nocve";
/// Sentinel meaning "no cross references" in legacy reports.
const NO_XREF: &str = "noxref";

/// One result record with every field normalized, independent of how
/// records are grouped afterwards.
#[derive(Debug, Clone)]
pub struct ParsedResult {
    pub oid: String,
    pub name: String,
    pub family: String,
    pub cvss: f32,
    pub level: ThreatLevel,
    /// Raw scanner threat label, lowercased.
    pub threat: String,
    pub host_ip: String,
    pub host_name: Option<String>,
    /// Raw port string, parsed into a `Port` at aggregation time.
    pub port: String,
    /// Scanner output for this particular finding instance.
    pub result_text: Option<String>,
    pub cves: Vec<String>,
    pub references: Vec<String>,
    pub tags: VulnTags,
}

/// Normalize one raw record. Returns `None` when the record must be
/// skipped: plugin id missing or the "no information" sentinel, or no
/// host address at all.
pub fn normalize(raw: &RawResult) -> Option<ParsedResult> {
    let oid = raw.oid.as_deref().unwrap_or("").trim();
    if oid.is_empty() || oid == NO_INFORMATION_OID {
        debug!("skipping result without a usable plugin id");
        return None;
    }

    let host_ip = raw.host.as_deref().unwrap_or("").trim();
    if host_ip.is_empty() {
        debug!(oid, "skipping result without a host address");
        return None;
    }

    let cvss = parse_score(raw.severity.as_deref())
        .or_else(|| parse_score(raw.cvss_base.as_deref()))
        .unwrap_or(0.0);
    let level = ThreatLevel::from_cvss(cvss);

    let threat = raw
        .threat
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "none".to_string());

    Some(ParsedResult {
        oid: oid.to_string(),
        name: raw.name.as_deref().unwrap_or("").trim().to_string(),
        family: raw
            .family
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("unknown")
            .to_string(),
        cvss,
        level,
        threat,
        host_ip: host_ip.to_string(),
        host_name: raw.host_name.clone(),
        port: raw.port.as_deref().unwrap_or("").trim().to_string(),
        result_text: raw.description.clone(),
        cves: collect_cves(raw),
        references: collect_references(raw),
        tags: raw
            .tags
            .as_deref()
            .map(VulnTags::from_blob)
            .unwrap_or_default(),
    })
}

/// Parse a severity score, treating absent, unparsable and negative
/// values as unknown.
fn parse_score(text: Option<&str>) -> Option<f32> {
    text.and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|score| *score >= 0.0)
}

/// Merge typed `ref` entries with the legacy `cve` element, uppercase
/// and deduplicate.
fn collect_cves(raw: &RawResult) -> Vec<String> {
    let mut cves: Vec<String> = raw.ref_cves.iter().map(|c| c.trim().to_uppercase()).collect();
    if let Some(text) = raw.cve_text.as_deref() {
        if !text.trim().eq_ignore_ascii_case(NO_CVE) {
            cves.extend(
                text.split(',')
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty()),
            );
        }
    }
    dedup_preserving(cves)
}

/// Merge typed non-CVE `ref` entries with the legacy `xref` element.
fn collect_references(raw: &RawResult) -> Vec<String> {
    let mut refs: Vec<String> = raw
        .ref_others
        .iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    if let Some(text) = raw.xref_text.as_deref() {
        if !text.trim().eq_ignore_ascii_case(NO_XREF) {
            refs.extend(text.split(',').filter_map(|r| {
                let r = r.trim();
                let r = r
                    .get(..4)
                    .filter(|p| p.eq_ignore_ascii_case("url:"))
                    .map(|_| r[4..].trim())
                    .unwrap_or(r);
                (!r.is_empty()).then(|| r.to_string())
            }));
        }
    }
    dedup_preserving(refs)
}

fn dedup_preserving(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_oid(oid: &str) -> RawResult {
        RawResult {
            oid: Some(oid.to_string()),
            host: Some("10.0.0.1".to_string()),
            port: Some("80/tcp".to_string()),
            ..RawResult::default()
        }
    }

    #[test]
    fn sentinel_oid_is_skipped() {
        assert!(normalize(&raw_with_oid("0")).is_none());
        assert!(normalize(&RawResult::default()).is_none());
        assert!(normalize(&raw_with_oid("1.2.3")).is_some());
    }

    #[test]
    fn missing_host_is_skipped() {
        let mut raw = raw_with_oid("1.2.3");
        raw.host = None;
        assert!(normalize(&raw).is_none());
    }

    #[test]
    fn defaults_applied() {
        let rec = normalize(&raw_with_oid("1.2.3")).unwrap();
        assert_eq!(rec.cvss, 0.0);
        assert_eq!(rec.level, ThreatLevel::None);
        assert_eq!(rec.threat, "none");
        assert_eq!(rec.family, "unknown");
        assert_eq!(rec.name, "");
        assert!(rec.cves.is_empty());
        assert!(rec.tags.is_empty());
    }

    #[test]
    fn severity_preferred_over_cvss_base() {
        let mut raw = raw_with_oid("1.2.3");
        raw.severity = Some("7.5".to_string());
        raw.cvss_base = Some("2.0".to_string());
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.cvss, 7.5);
        assert_eq!(rec.level, ThreatLevel::High);

        raw.severity = None;
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.cvss, 2.0);
    }

    #[test]
    fn negative_and_garbage_scores_become_unknown() {
        let mut raw = raw_with_oid("1.2.3");
        raw.severity = Some("-1.0".to_string());
        assert_eq!(normalize(&raw).unwrap().cvss, 0.0);

        raw.severity = Some("not a number".to_string());
        raw.cvss_base = Some("5.0".to_string());
        assert_eq!(normalize(&raw).unwrap().cvss, 5.0);
    }

    #[test]
    fn cves_merge_and_deduplicate() {
        let mut raw = raw_with_oid("1.2.3");
        raw.ref_cves = vec!["CVE-2020-0001".to_string(), "cve-2020-0002".to_string()];
        raw.cve_text = Some("cve-2020-0001, CVE-2020-0003".to_string());
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.cves, ["CVE-2020-0001", "CVE-2020-0002", "CVE-2020-0003"]);
    }

    #[test]
    fn nocve_sentinel_means_empty() {
        let mut raw = raw_with_oid("1.2.3");
        raw.cve_text = Some("NOCVE".to_string());
        assert!(normalize(&raw).unwrap().cves.is_empty());
    }

    #[test]
    fn xref_url_prefix_is_stripped() {
        let mut raw = raw_with_oid("1.2.3");
        raw.xref_text = Some("URL:https://a.example, https://b.example".to_string());
        raw.ref_others = vec!["https://c.example".to_string()];
        let rec = normalize(&raw).unwrap();
        assert_eq!(
            rec.references,
            ["https://c.example", "https://a.example", "https://b.example"]
        );

        raw.xref_text = Some("NOXREF".to_string());
        raw.ref_others = vec![];
        assert!(normalize(&raw).unwrap().references.is_empty());
    }

    #[test]
    fn threat_label_is_lowercased() {
        let mut raw = raw_with_oid("1.2.3");
        raw.threat = Some("High".to_string());
        assert_eq!(normalize(&raw).unwrap().threat, "high");
    }
}
