//! Scanned host identity.

use std::fmt;

use serde::Serialize;

/// Placeholder used when the scanner did not resolve a host name.
pub const UNKNOWN_HOST_NAME: &str = "N/A";

/// A scanned address with its optionally resolved name.
///
/// The address is kept as reported by the scanner and is not validated
/// here; network-scope filtering parses it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    pub ip: String,
    pub host_name: String,
}

impl Host {
    pub fn new(ip: impl Into<String>, host_name: Option<String>) -> Self {
        let host_name = host_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_HOST_NAME.to_string());
        Self {
            ip: ip.into(),
            host_name,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host_name == UNKNOWN_HOST_NAME {
            f.write_str(&self.ip)
        } else {
            write!(f, "{} ({})", self.ip, self.host_name)
        }
    }
}
