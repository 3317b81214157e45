//! Network ranges used by the host inclusion/exclusion filters.

use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::core::errors::ConfigError;

/// One configured range: a bare address, a CIDR block, or an explicit
/// `start-end` span.
#[derive(Debug, Clone)]
pub enum NetworkRange {
    Single(IpAddr),
    Cidr(IpNetwork),
    Span(IpAddr, IpAddr),
}

impl NetworkRange {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match self {
            NetworkRange::Single(addr) => *addr == ip,
            NetworkRange::Cidr(network) => network.contains(ip),
            NetworkRange::Span(start, end) => {
                // Endpoints are checked to share a family at parse time.
                match (ip, start, end) {
                    (IpAddr::V4(ip), IpAddr::V4(s), IpAddr::V4(e)) => ip >= *s && ip <= *e,
                    (IpAddr::V6(ip), IpAddr::V6(s), IpAddr::V6(e)) => ip >= *s && ip <= *e,
                    _ => false,
                }
            }
        }
    }
}

impl FromStr for NetworkRange {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let spec = raw.trim();
        let invalid = |reason: &str| ConfigError::InvalidNetwork {
            range: raw.to_string(),
            reason: reason.to_string(),
        };

        if spec.is_empty() {
            return Err(invalid("empty range"));
        }
        if spec.contains('/') {
            let network = spec
                .parse::<IpNetwork>()
                .map_err(|e| invalid(&e.to_string()))?;
            return Ok(NetworkRange::Cidr(network));
        }
        if let Some((start, end)) = spec.split_once('-') {
            let start: IpAddr = start
                .trim()
                .parse()
                .map_err(|_| invalid("invalid start address"))?;
            let end: IpAddr = end
                .trim()
                .parse()
                .map_err(|_| invalid("invalid end address"))?;
            if start.is_ipv4() != end.is_ipv4() {
                return Err(invalid("range endpoints mix address families"));
            }
            if start > end {
                return Err(invalid("range start is after its end"));
            }
            return Ok(NetworkRange::Span(start, end));
        }
        let addr: IpAddr = spec.parse().map_err(|_| invalid("invalid address"))?;
        Ok(NetworkRange::Single(addr))
    }
}

/// A set of configured network ranges.
#[derive(Debug, Clone, Default)]
pub struct NetworkScope {
    ranges: Vec<NetworkRange>,
}

impl NetworkScope {
    pub fn parse(specs: &[String]) -> Result<Self, ConfigError> {
        let ranges = specs
            .iter()
            .map(|spec| spec.parse())
            .collect::<Result<Vec<NetworkRange>, ConfigError>>()?;
        Ok(Self { ranges })
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }
}
