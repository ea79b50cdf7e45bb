//! Typed assessment results.
//!
//! Everything the engine returns is converted into these types by
//! [`super::validate`] before it reaches the rest of the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed dimension vocabulary used by the project breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Usability,
    Navigation,
    Clarity,
    Accessibility,
    Aesthetics,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Usability,
        Dimension::Navigation,
        Dimension::Clarity,
        Dimension::Accessibility,
        Dimension::Aesthetics,
    ];

    /// Key used in dimension maps (`"usability"`, ...)
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Usability => "usability",
            Self::Navigation => "navigation",
            Self::Clarity => "clarity",
            Self::Accessibility => "accessibility",
            Self::Aesthetics => "aesthetics",
        }
    }

    /// Display name, also the wire form of the matching issue category
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Usability => "Usability",
            Self::Navigation => "Navigation",
            Self::Clarity => "Clarity",
            Self::Accessibility => "Accessibility",
            Self::Aesthetics => "Aesthetics",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.key() == wanted)
            .ok_or_else(|| format!("unknown dimension: {s}"))
    }
}

/// Issue severity, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Points removed from a dimension per issue when scores are derived
    /// from the issue list.
    #[must_use]
    pub const fn penalty(self) -> f64 {
        match self {
            Self::Critical => 25.0,
            Self::High => 15.0,
            Self::Medium => 8.0,
            Self::Low => 3.0,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single UX issue found on a page.
///
/// The category is one of the dimension-adjacent categories, so it reuses
/// [`Dimension`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: Dimension,
    pub suggestion: Option<String>,
}

/// Validated output of one engine call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assessment {
    /// Dimension key -> score in `0..=100`. Only valid values are present.
    pub dimensions: BTreeMap<String, f64>,
    pub issues: Vec<Issue>,
    pub summary: String,
    #[serde(default)]
    pub positive_highlights: Vec<String>,
}

impl Assessment {
    /// Unweighted mean of every dimension value present, rounded.
    ///
    /// `None` when the assessment carries no usable dimension.
    #[must_use]
    pub fn overall_score(&self) -> Option<u8> {
        crate::scoring::mean_score(self.dimensions.values().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" Accessibility ".parse::<Dimension>(), Ok(Dimension::Accessibility));
        assert!("Performance".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_overall_score_uses_present_dimensions_only() {
        let mut assessment = Assessment::default();
        assert_eq!(assessment.overall_score(), None);

        assessment.dimensions.insert("usability".into(), 60.0);
        assessment.dimensions.insert("clarity".into(), 90.0);
        assert_eq!(assessment.overall_score(), Some(75));
    }
}
