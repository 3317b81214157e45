//! Canonical in-memory model built from scan reports.

pub mod host;
pub mod port;
pub mod result_tree;
pub mod severity;
pub mod vulnerability;

pub use host::{Host, UNKNOWN_HOST_NAME};
pub use port::{Port, PortParseError, GENERAL_PORT};
pub use result_tree::{HostEntry, ResultTree, SeverityCounts};
pub use severity::ThreatLevel;
pub use vulnerability::{VulnTags, Vulnerability};
