use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};

use super::AlertSource;
use crate::config::AlertsConfig;
use crate::http;
use crate::models::{Alert, Coordinate, Severity};
use crate::{ErrorCode, Result, StationError};

/// National Weather Service alerts client (api.weather.gov).
pub struct NwsClient {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default = "Vec::new")]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    id: String,
    #[serde(rename = "@id")]
    url: Option<String>,
    event: String,
    headline: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    expires: Option<DateTime<FixedOffset>>,
}

impl From<AlertProperties> for Alert {
    fn from(p: AlertProperties) -> Self {
        Alert {
            headline: p.headline.unwrap_or_else(|| p.event.clone()),
            url: p.url.unwrap_or_default(),
            id: p.id,
            event: p.event,
            description: p.description.unwrap_or_default(),
            severity: p.severity.as_deref().map_or(Severity::Unknown, Severity::parse),
            expires: p.expires,
        }
    }
}

impl NwsClient {
    /// Create a new alerts client; NWS rejects requests without a User-Agent.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &AlertsConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_seconds, 2, &config.user_agent)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AlertSource for NwsClient {
    #[tracing::instrument(name = "active_alerts", skip(self))]
    async fn active_alerts(&self, point: Coordinate) -> Result<Vec<Alert>> {
        let url = format!(
            "{}/alerts/active?point={}",
            self.base_url,
            point.format_coordinates()
        );
        debug!("GET {}", url);

        let body = http::get_text(&self.client, &url, "application/geo+json").await?;
        let collection: FeatureCollection = serde_json::from_str(&body).map_err(|e| {
            StationError::api(
                format!("Invalid data received from NWS: {e}"),
                ErrorCode::ApiInvalidResponse,
            )
        })?;

        let mut alerts: Vec<Alert> = collection
            .features
            .into_iter()
            .map(|f| f.properties.into())
            .collect();
        alerts.sort_by_key(|a| a.severity);

        info!("{} active alerts", alerts.len());
        Ok(alerts)
    }
}
