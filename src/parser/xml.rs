//! Event-driven extraction of raw `<result>` records from report XML.
//!
//! This layer only lifts text out of the known child paths; all
//! normalization (defaults, level classification, tag splitting) happens
//! afterwards.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Parse(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] AttrError),
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
}

/// One `<result>` element, fields as found in the document.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    /// `nvt@oid` — the plugin id.
    pub oid: Option<String>,
    /// `nvt/name`
    pub name: Option<String>,
    /// `nvt/family`
    pub family: Option<String>,
    /// `nvt/cvss_base`
    pub cvss_base: Option<String>,
    /// `nvt/tags`
    pub tags: Option<String>,
    /// `result/severity`
    pub severity: Option<String>,
    /// `result/threat`
    pub threat: Option<String>,
    /// `result/host` text
    pub host: Option<String>,
    /// `result/host/hostname`
    pub host_name: Option<String>,
    /// `result/port`
    pub port: Option<String>,
    /// `result/description`
    pub description: Option<String>,
    /// `nvt/refs/ref[@type="cve"]/@id`
    pub ref_cves: Vec<String>,
    /// `nvt/refs/ref/@id` for every other type
    pub ref_others: Vec<String>,
    /// Legacy `nvt/cve` text (may be the `NOCVE` sentinel)
    pub cve_text: Option<String>,
    /// Legacy `nvt/xref` text (may be the `NOXREF` sentinel)
    pub xref_text: Option<String>,
}

/// Extract every `results/result` element of `xml` in document order.
pub fn read_results(xml: &str) -> Result<Vec<RawResult>, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut results = Vec::new();
    let mut current: Option<RawResult> = None;
    let mut stack: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "result" if stack.last().map(String::as_str) == Some("results") => {
                        current = Some(RawResult::default());
                    }
                    "nvt" => {
                        if let Some(raw) = current.as_mut() {
                            read_nvt_oid(&e, raw)?;
                        }
                    }
                    "ref" => {
                        if let Some(raw) = current.as_mut() {
                            read_ref(&e, raw)?;
                        }
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(raw) = current.as_mut() {
                    match name.as_str() {
                        "ref" => read_ref(&e, raw)?,
                        "nvt" => read_nvt_oid(&e, raw)?,
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "result" {
                    if let Some(raw) = current.take() {
                        results.push(raw);
                    }
                }
                stack.pop();
            }
            Event::Text(e) => {
                if let Some(raw) = current.as_mut() {
                    let text = e.unescape()?;
                    collect_text(&stack, &text, raw);
                }
            }
            Event::CData(e) => {
                if let Some(raw) = current.as_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    collect_text(&stack, &text, raw);
                }
            }
            Event::Eof => {
                if let Some(open) = stack.pop() {
                    return Err(XmlError::UnexpectedEof(open));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(results)
}

fn read_nvt_oid(e: &quick_xml::events::BytesStart<'_>, raw: &mut RawResult) -> Result<(), XmlError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"oid" {
            raw.oid = Some(attr.unescape_value()?.to_string());
        }
    }
    Ok(())
}

fn read_ref(e: &quick_xml::events::BytesStart<'_>, raw: &mut RawResult) -> Result<(), XmlError> {
    let mut ref_type = None;
    let mut ref_id = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"type" => ref_type = Some(attr.unescape_value()?.to_string()),
            b"id" => ref_id = Some(attr.unescape_value()?.to_string()),
            _ => {}
        }
    }
    let Some(id) = ref_id.filter(|id| !id.is_empty()) else {
        return Ok(());
    };
    if ref_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("cve")) {
        raw.ref_cves.push(id);
    } else {
        raw.ref_others.push(id);
    }
    Ok(())
}

/// Route a text node to the field addressed by the element stack.
fn collect_text(stack: &[String], text: &str, raw: &mut RawResult) {
    let current = stack.last().map(String::as_str).unwrap_or_default();
    let parent = stack
        .len()
        .checked_sub(2)
        .map(|i| stack[i].as_str())
        .unwrap_or_default();

    let slot = match (parent, current) {
        ("result", "host") => &mut raw.host,
        ("host", "hostname") => &mut raw.host_name,
        ("result", "port") => &mut raw.port,
        ("result", "threat") => &mut raw.threat,
        ("result", "severity") => &mut raw.severity,
        ("result", "description") => &mut raw.description,
        ("nvt", "name") => &mut raw.name,
        ("nvt", "family") => &mut raw.family,
        ("nvt", "cvss_base") => &mut raw.cvss_base,
        ("nvt", "tags") => &mut raw.tags,
        ("nvt", "cve") => &mut raw.cve_text,
        ("nvt", "xref") => &mut raw.xref_text,
        _ => return,
    };
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<report extension="xml" format_id="a994b278" content_type="text/xml">
  <report>
    <results start="1" max="100">
      <result id="r1">
        <name>FTP Unencrypted Cleartext Login</name>
        <host>192.168.1.5<asset asset_id="x"/><hostname>ftp01</hostname></host>
        <port>21/tcp</port>
        <nvt oid="1.3.6.1.4.1.25623.1.0.108528">
          <name>FTP Unencrypted Cleartext Login</name>
          <family>FTP</family>
          <cvss_base>4.8</cvss_base>
          <tags>summary=The remote host allows cleartext logins.|solution=Enable FTPS.</tags>
          <refs>
            <ref type="cve" id="CVE-1999-0614"/>
            <ref type="url" id="https://example.org/ftp"/>
          </refs>
        </nvt>
        <threat>Medium</threat>
        <severity>4.8</severity>
        <description>The service accepts cleartext credentials.</description>
      </result>
    </results>
  </report>
</report>"#;

    #[test]
    fn extracts_known_paths() {
        let results = read_results(SAMPLE).unwrap();
        assert_eq!(results.len(), 1);
        let raw = &results[0];
        assert_eq!(raw.oid.as_deref(), Some("1.3.6.1.4.1.25623.1.0.108528"));
        assert_eq!(raw.name.as_deref(), Some("FTP Unencrypted Cleartext Login"));
        assert_eq!(raw.family.as_deref(), Some("FTP"));
        assert_eq!(raw.cvss_base.as_deref(), Some("4.8"));
        assert_eq!(raw.severity.as_deref(), Some("4.8"));
        assert_eq!(raw.threat.as_deref(), Some("Medium"));
        assert_eq!(raw.host.as_deref(), Some("192.168.1.5"));
        assert_eq!(raw.host_name.as_deref(), Some("ftp01"));
        assert_eq!(raw.port.as_deref(), Some("21/tcp"));
        assert_eq!(
            raw.description.as_deref(),
            Some("The service accepts cleartext credentials.")
        );
        assert_eq!(raw.ref_cves, ["CVE-1999-0614"]);
        assert_eq!(raw.ref_others, ["https://example.org/ftp"]);
    }

    #[test]
    fn legacy_cve_and_xref_elements() {
        let xml = r#"<report><results><result>
            <nvt oid="1.2.3"><cve>CVE-2020-0001, CVE-2020-0002</cve><xref>NOXREF</xref></nvt>
            <host>10.0.0.1</host><port>general/icmp</port>
        </result></results></report>"#;
        let results = read_results(xml).unwrap();
        assert_eq!(results[0].cve_text.as_deref(), Some("CVE-2020-0001, CVE-2020-0002"));
        assert_eq!(results[0].xref_text.as_deref(), Some("NOXREF"));
    }

    #[test]
    fn results_outside_results_element_are_ignored() {
        let xml = r#"<report><tasks><result><host>1.2.3.4</host></result></tasks>
            <results><result><nvt oid="1"/><host>10.0.0.1</host></result></results></report>"#;
        let results = read_results(xml).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].host.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn multiple_results() {
        let xml = r#"<report><results>
            <result><nvt oid="1"/><host>10.0.0.1</host><port>80/tcp</port></result>
            <result><nvt oid="2"/><host>10.0.0.2</host><port>443/tcp</port></result>
        </results></report>"#;
        let results = read_results(xml).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].oid.as_deref(), Some("2"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(read_results("<report><results><result>").is_err());
    }
}
