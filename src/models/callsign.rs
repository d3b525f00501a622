//! Operator metadata returned by the callsign directory

use serde::{Deserialize, Serialize};

/// Base URL of the public QRZ profile pages
pub const QRZ_PROFILE_URL: &str = "https://www.qrz.com/db/";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CallsignRecord {
    pub callsign: String,
    pub name: String,
    pub country: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Maidenhead locator as published by the operator
    pub grid: Option<String>,
    pub license_class: Option<String>,
    /// License expiration, `YYYY-MM-DD`
    pub expires: Option<String>,
}

impl CallsignRecord {
    /// `state, country`, skipping whichever part is missing
    #[must_use]
    pub fn location(&self) -> String {
        [self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Public profile page for this callsign
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("{QRZ_PROFILE_URL}{}", self.callsign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CallsignRecord {
        CallsignRecord {
            callsign: "KJ5IRQ".to_string(),
            name: "Jane Operator".to_string(),
            country: Some("United States".to_string()),
            state: Some("TX".to_string()),
            grid: Some("EM12os".to_string()),
            license_class: Some("General".to_string()),
            expires: Some("2033-04-01".to_string()),
        }
    }

    #[test]
    fn test_location_joins_parts() {
        assert_eq!(record().location(), "TX, United States");

        let mut no_state = record();
        no_state.state = None;
        assert_eq!(no_state.location(), "United States");
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(record().profile_url(), "https://www.qrz.com/db/KJ5IRQ");
    }
}
