//! Coordinate model for geographic positions

use serde::{Deserialize, Serialize};

use crate::{Result, StationError};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// # Errors
    /// Returns [`StationError::InvalidInput`] when either value is non-finite or
    /// falls outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_latitude(latitude)?;
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(StationError::invalid_input(format!(
                "longitude {longitude} must be within [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude with hemisphere suffix, e.g. `32.7767°N`
    #[must_use]
    pub fn format_latitude(&self) -> String {
        let hemisphere = if self.latitude < 0.0 { 'S' } else { 'N' };
        format!("{:.4}°{hemisphere}", self.latitude.abs())
    }

    /// Longitude with hemisphere suffix, e.g. `96.7970°W`
    #[must_use]
    pub fn format_longitude(&self) -> String {
        let hemisphere = if self.longitude < 0.0 { 'W' } else { 'E' };
        format!("{:.4}°{hemisphere}", self.longitude.abs())
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Reject latitudes that cannot be placed on the globe.
pub(crate) fn validate_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(StationError::invalid_input(format!(
            "latitude {latitude} must be within [-90, 90]"
        )));
    }
    Ok(())
}
