//! Callsign directory lookups

use async_trait::async_trait;

use crate::models::CallsignRecord;
use crate::{Result, StationError};

pub mod qrz;

pub use qrz::QrzClient;

/// Longest callsign accepted, prefixes and suffixes included (`VP2E/KJ5IRQ/P`)
pub const MAX_CALLSIGN_LEN: usize = 16;

#[async_trait]
pub trait CallsignDirectory: Send + Sync {
    /// Look up an already normalized callsign.
    async fn lookup(&self, callsign: &str) -> Result<CallsignRecord>;
}

/// Trim and upper-case user input, rejecting anything that cannot be a callsign.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] for empty input, characters other than
/// letters, digits and `/`, or input longer than [`MAX_CALLSIGN_LEN`].
pub fn normalize_callsign(input: &str) -> Result<String> {
    let callsign = input.trim().to_ascii_uppercase();

    if callsign.is_empty() {
        return Err(StationError::invalid_input("Please enter a callsign"));
    }
    if callsign.len() > MAX_CALLSIGN_LEN {
        return Err(StationError::invalid_input(format!(
            "Callsign is longer than {MAX_CALLSIGN_LEN} characters"
        )));
    }
    if !callsign
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '/')
    {
        return Err(StationError::invalid_input(format!(
            "'{}' is not a valid callsign",
            input.trim()
        )));
    }

    Ok(callsign)
}
