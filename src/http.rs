//! Shared HTTP plumbing for the upstream data sources
//!
//! Every client goes through the same reqwest stack: a per-request timeout,
//! an identifying User-Agent, and transient-failure retries with exponential
//! backoff. Status codes are mapped onto [`ErrorCode`]s in one place so the
//! HTTP layer can tell "not found" from "upstream is down".

use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{ErrorCode, Result, StationError};

/// Responses slower than this get a warning in the logs
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Build the retrying client used by every upstream source.
///
/// # Errors
/// Fails only if the TLS backend cannot be initialised.
pub fn build_client(
    timeout_seconds: u32,
    max_retries: u32,
    user_agent: &str,
) -> Result<ClientWithMiddleware> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(user_agent)
        .build()
        .map_err(|e| StationError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Send a GET and hand back the response if the status was a success.
pub async fn get(client: &ClientWithMiddleware, url: &str, accept: &str) -> Result<Response> {
    let start = Instant::now();

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, accept)
        .send()
        .await
        .map_err(|e| {
            warn!("Network error: {}", e);
            StationError::api(format!("Network error: {e}"), ErrorCode::ApiNetworkError)
        })?;

    let elapsed = start.elapsed();
    let status = response.status();
    debug!("HTTP response {} in {:.3}s", status, elapsed.as_secs_f64());

    if elapsed > SLOW_RESPONSE {
        warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
    }

    if status.is_success() {
        return Ok(response);
    }

    Err(match status.as_u16() {
        401 | 403 => StationError::api(
            "Upstream rejected the API credentials",
            ErrorCode::ApiUnauthorized,
        ),
        404 => StationError::api("Requested data not found upstream", ErrorCode::ApiNotFound),
        429 => StationError::api("Upstream rate limit exceeded", ErrorCode::ApiRateLimit),
        _ => StationError::api(
            format!(
                "API request failed with status: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown error")
            ),
            ErrorCode::ApiNetworkError,
        ),
    })
}

/// GET and decode a JSON body.
pub async fn get_json<T: DeserializeOwned>(client: &ClientWithMiddleware, url: &str) -> Result<T> {
    get(client, url, "application/json")
        .await?
        .json()
        .await
        .map_err(|e| invalid_response(&e))
}

/// GET and return the body as text.
pub async fn get_text(client: &ClientWithMiddleware, url: &str, accept: &str) -> Result<String> {
    get(client, url, accept)
        .await?
        .text()
        .await
        .map_err(|e| invalid_response(&e))
}

fn invalid_response(e: &reqwest::Error) -> StationError {
    warn!("Failed to parse upstream response: {}", e);
    StationError::api(
        format!("Invalid data received from upstream: {e}"),
        ErrorCode::ApiInvalidResponse,
    )
}

/// Query parameters that carry credentials
const SECRET_PARAMS: [&str; 2] = ["apiKey", "s"];

/// Strip credentials from a URL before it reaches the logs.
#[must_use]
pub fn redact(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let mut out = format!("{base}?");
    let mut rest = query;
    loop {
        let end = rest.find(['&', ';']).unwrap_or(rest.len());
        let (param, tail) = rest.split_at(end);
        match param.split_once('=') {
            Some((name, _)) if SECRET_PARAMS.contains(&name) => {
                out.push_str(name);
                out.push_str("=***");
            }
            _ => out.push_str(param),
        }
        if tail.is_empty() {
            break;
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out
}
