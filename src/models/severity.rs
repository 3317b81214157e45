//! Threat levels derived from CVSS scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;

/// Discrete severity classification of a finding.
///
/// Variants are ordered ascending so that `level >= min_level` expresses
/// "at least as severe as".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    /// No security impact (CVSS below 0.1).
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// All levels, most severe first.
    pub const ALL: [ThreatLevel; 5] = [
        ThreatLevel::Critical,
        ThreatLevel::High,
        ThreatLevel::Medium,
        ThreatLevel::Low,
        ThreatLevel::None,
    ];

    /// Classify a CVSS score. Thresholds are checked from highest to
    /// lowest; the first match wins.
    pub fn from_cvss(score: f32) -> Self {
        match score {
            s if s >= 9.0 => ThreatLevel::Critical,
            s if s >= 7.0 => ThreatLevel::High,
            s if s >= 4.0 => ThreatLevel::Medium,
            s if s >= 0.1 => ThreatLevel::Low,
            _ => ThreatLevel::None,
        }
    }

    /// Levels that satisfy `min` as a configured minimum, most severe
    /// first. A minimum of `None` admits every level.
    pub fn at_or_above(min: ThreatLevel) -> &'static [ThreatLevel] {
        let cutoff = ThreatLevel::ALL
            .iter()
            .position(|l| *l == min)
            .unwrap_or(ThreatLevel::ALL.len() - 1);
        &ThreatLevel::ALL[..=cutoff]
    }

    /// Whether this level satisfies the configured minimum.
    pub fn meets(self, min: ThreatLevel) -> bool {
        self >= min
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatLevel::Critical => "critical",
            ThreatLevel::High => "high",
            ThreatLevel::Medium => "medium",
            ThreatLevel::Low => "low",
            ThreatLevel::None => "none",
        }
    }

    /// Capitalized form for report output.
    pub fn label(self) -> &'static str {
        match self {
            ThreatLevel::Critical => "Critical",
            ThreatLevel::High => "High",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::Low => "Low",
            ThreatLevel::None => "None",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreatLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" | "c" => Ok(ThreatLevel::Critical),
            "high" | "h" => Ok(ThreatLevel::High),
            "medium" | "m" => Ok(ThreatLevel::Medium),
            "low" | "l" => Ok(ThreatLevel::Low),
            "none" | "n" => Ok(ThreatLevel::None),
            _ => Err(ConfigError::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_thresholds() {
        assert_eq!(ThreatLevel::from_cvss(10.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_cvss(9.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_cvss(8.99), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_cvss(7.0), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_cvss(6.9), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_cvss(4.0), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_cvss(3.9), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_cvss(0.1), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_cvss(0.0), ThreatLevel::None);
    }

    #[test]
    fn classification_is_monotonic() {
        let scores = [10.0, 9.0, 8.99, 7.0, 6.9, 4.0, 3.9, 0.1, 0.0];
        let levels: Vec<ThreatLevel> = scores.iter().map(|s| ThreatLevel::from_cvss(*s)).collect();
        for pair in levels.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn min_level_expansion() {
        assert_eq!(
            ThreatLevel::at_or_above(ThreatLevel::Medium),
            &[ThreatLevel::Critical, ThreatLevel::High, ThreatLevel::Medium]
        );
        assert_eq!(ThreatLevel::at_or_above(ThreatLevel::None).len(), 5);
        assert_eq!(
            ThreatLevel::at_or_above(ThreatLevel::Critical),
            &[ThreatLevel::Critical]
        );
    }

    #[test]
    fn meets_minimum() {
        assert!(ThreatLevel::High.meets(ThreatLevel::Medium));
        assert!(ThreatLevel::Medium.meets(ThreatLevel::Medium));
        assert!(!ThreatLevel::Low.meets(ThreatLevel::Medium));
        assert!(ThreatLevel::None.meets(ThreatLevel::None));
    }

    #[test]
    fn parse_level_tokens() {
        assert_eq!("critical".parse::<ThreatLevel>().unwrap(), ThreatLevel::Critical);
        assert_eq!("HIGH".parse::<ThreatLevel>().unwrap(), ThreatLevel::High);
        assert_eq!("m".parse::<ThreatLevel>().unwrap(), ThreatLevel::Medium);
        assert!("severe".parse::<ThreatLevel>().is_err());
    }
}
