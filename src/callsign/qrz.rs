use async_trait::async_trait;
use quick_xml::de::from_str;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::CallsignDirectory;
use crate::config::CallsignConfig;
use crate::http::{self, redact};
use crate::models::CallsignRecord;
use crate::{ErrorCode, Result, StationError};

/// QRZ XML data client using a pre-issued session key.
pub struct QrzClient {
    client: ClientWithMiddleware,
    base_url: String,
    session_key: Option<String>,
}

/// Top-level `<QRZDatabase>` document
#[derive(Debug, Deserialize)]
struct QrzDatabase {
    #[serde(rename = "Callsign")]
    callsign: Option<QrzCallsign>,
    #[serde(rename = "Session")]
    session: Option<QrzSession>,
}

#[derive(Debug, Deserialize)]
struct QrzCallsign {
    call: String,
    fname: Option<String>,
    name: Option<String>,
    state: Option<String>,
    country: Option<String>,
    grid: Option<String>,
    class: Option<String>,
    expdate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QrzSession {
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl QrzCallsign {
    fn into_record(self) -> CallsignRecord {
        let name = [self.fname.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        CallsignRecord {
            callsign: self.call.to_ascii_uppercase(),
            name,
            country: non_empty(self.country),
            state: non_empty(self.state),
            grid: non_empty(self.grid),
            license_class: non_empty(self.class),
            expires: non_empty(self.expdate),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a directory response into a record or the error it reports
fn parse_response(xml: &str, callsign: &str) -> Result<CallsignRecord> {
    let database: QrzDatabase = from_str(xml).map_err(|e| {
        warn!("Failed to parse callsign directory response: {}", e);
        StationError::api(
            format!("Invalid data received from callsign directory: {e}"),
            ErrorCode::ApiInvalidResponse,
        )
    })?;

    if let Some(record) = database.callsign {
        return Ok(record.into_record());
    }

    match database.session.and_then(|s| s.error) {
        Some(error) if error.trim_start().starts_with("Not found") => Err(StationError::api(
            format!("Callsign {callsign} not found"),
            ErrorCode::ApiNotFound,
        )),
        Some(error) => {
            warn!("Callsign directory session error: {}", error);
            Err(StationError::api(
                format!("Callsign directory error: {error}"),
                ErrorCode::ApiUnauthorized,
            ))
        }
        None => Err(StationError::api(
            "Callsign directory returned neither a record nor an error",
            ErrorCode::ApiInvalidResponse,
        )),
    }
}

impl QrzClient {
    /// Create a new directory client.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &CallsignConfig) -> Result<Self> {
        let client = http::build_client(
            config.timeout_seconds,
            1,
            &format!("shackboard/{}", crate::VERSION),
        )?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session_key: config.session_key.clone(),
        })
    }
}

#[async_trait]
impl CallsignDirectory for QrzClient {
    #[tracing::instrument(name = "callsign_lookup", skip(self))]
    async fn lookup(&self, callsign: &str) -> Result<CallsignRecord> {
        let session_key = self.session_key.as_deref().ok_or_else(|| {
            StationError::config(
                "Callsign session key not configured. Set callsign.session_key or SHACKBOARD__CALLSIGN__SESSION_KEY.",
            )
        })?;

        // The XML interface separates parameters with ';'
        let url = format!(
            "{}?s={};callsign={}",
            self.base_url,
            urlencoding::encode(session_key),
            urlencoding::encode(callsign)
        );
        debug!("GET {}", redact(&url));

        let body = http::get_text(&self.client, &url, "text/xml").await?;
        let record = parse_response(&body, callsign)?;
        info!("Found callsign {}", record.callsign);
        Ok(record)
    }
}
