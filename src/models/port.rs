//! Transport endpoint a finding was observed on.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Port number used when the scanner reports no specific port
/// (`general/<protocol>` entries such as ICMP findings).
pub const GENERAL_PORT: u16 = 0;

#[derive(Debug, Error)]
pub enum PortParseError {
    #[error("unrecognized port specification '{0}'")]
    Unrecognized(String),
    #[error("port number out of range in '{0}'")]
    OutOfRange(String),
}

/// A transport endpoint as reported by the scanner.
///
/// The canonical grammar is `<digits>/<protocol>` (e.g. `6001/tcp`) or
/// `general/<protocol>` (e.g. `general/icmp`), which maps to port 0.
/// Anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub number: u16,
    pub protocol: String,
    /// Scanner output tied to this specific finding instance.
    pub result: Option<String>,
}

impl Port {
    pub fn new(number: u16, protocol: impl Into<String>, result: Option<String>) -> Self {
        Self {
            number,
            protocol: protocol.into(),
            result,
        }
    }

    /// Parse a scanner-reported port string.
    pub fn from_string(raw: &str, result: Option<&str>) -> Result<Self, PortParseError> {
        let spec = raw.trim();
        let (number, protocol) = spec
            .split_once('/')
            .ok_or_else(|| PortParseError::Unrecognized(raw.to_string()))?;
        let number = number.trim();
        let protocol = protocol.trim();

        if protocol.is_empty() || !protocol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PortParseError::Unrecognized(raw.to_string()));
        }

        let number = if number.eq_ignore_ascii_case("general") {
            GENERAL_PORT
        } else if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
            number
                .parse::<u16>()
                .map_err(|_| PortParseError::OutOfRange(raw.to_string()))?
        } else {
            return Err(PortParseError::Unrecognized(raw.to_string()));
        };

        Ok(Port::new(
            number,
            protocol.to_lowercase(),
            result.filter(|r| !r.trim().is_empty()).map(str::to_string),
        ))
    }

    /// Whether this is a `general/<protocol>` pseudo-port.
    pub fn is_general(&self) -> bool {
        self.number == GENERAL_PORT
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_general() {
            write!(f, "general/{}", self.protocol)
        } else {
            write!(f, "{}/{}", self.number, self.protocol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numbered_port() {
        let port = Port::from_string("6001/tcp", None).unwrap();
        assert_eq!(port.number, 6001);
        assert_eq!(port.protocol, "tcp");
        assert!(port.result.is_none());
    }

    #[test]
    fn parse_general_port() {
        let port = Port::from_string("general/icmp", None).unwrap();
        assert_eq!(port.number, GENERAL_PORT);
        assert_eq!(port.protocol, "icmp");
        assert!(port.is_general());
    }

    #[test]
    fn round_trip_display() {
        for raw in ["22/tcp", "53/udp", "general/icmp"] {
            let port = Port::from_string(raw, None).unwrap();
            assert_eq!(port.to_string(), raw);
        }
    }

    #[test]
    fn keeps_result_text() {
        let port = Port::from_string("443/tcp", Some("banner: nginx")).unwrap();
        assert_eq!(port.result.as_deref(), Some("banner: nginx"));

        let port = Port::from_string("443/tcp", Some("   ")).unwrap();
        assert!(port.result.is_none());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(Port::from_string("no-slash", None).is_err());
        assert!(Port::from_string("abc/tcp", None).is_err());
        assert!(Port::from_string("80/", None).is_err());
        assert!(Port::from_string("/tcp", None).is_err());
        assert!(Port::from_string("callbook (2000/tcp)", None).is_err());
        assert!(Port::from_string("99999/tcp", None).is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a = Port::from_string("80/tcp", Some("x")).unwrap();
        let b = Port::from_string("80/tcp", Some("x")).unwrap();
        let c = Port::from_string("80/tcp", Some("y")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
