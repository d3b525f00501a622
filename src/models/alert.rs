//! Active weather alerts and their severity

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// CAP severity levels as used by the NWS alerts feed, most severe first
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl Severity {
    /// Parse the feed's severity string, case-insensitively
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "extreme" => Self::Extreme,
            "severe" => Self::Severe,
            "moderate" => Self::Moderate,
            "minor" => Self::Minor,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extreme => "Extreme",
            Self::Severe => "Severe",
            Self::Moderate => "Moderate",
            Self::Minor => "Minor",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether an alert at this level activates Skywarn spotter operations
    #[must_use]
    pub fn activates_skywarn(self) -> bool {
        matches!(self, Self::Extreme | Self::Severe)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    /// Event name, e.g. `Flash Flood Warning`
    pub event: String,
    pub headline: String,
    pub description: String,
    pub severity: Severity,
    pub expires: Option<DateTime<FixedOffset>>,
    /// Link to the full alert text
    pub url: String,
}
