//! Current observation model for the personal weather station

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest observation reported by the station, imperial units throughout.
///
/// Only the air temperature is guaranteed; a station without a given sensor
/// reports `None` for it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// PWS network station identifier, e.g. `KTXMINER45`
    pub station_id: String,
    /// Observation time in UTC
    pub observed_at: DateTime<Utc>,
    /// Observation time as reported in the station's local time
    pub observed_local: String,
    /// Textual conditions, when the source provides them
    pub conditions: Option<String>,
    /// Air temperature in °F
    pub temperature_f: f64,
    /// Heat index ("feels like") in °F; equals the air temperature when the
    /// station omits it
    pub heat_index_f: f64,
    /// Dew point in °F
    pub dew_point_f: Option<f64>,
    /// Wind chill in °F; equals the air temperature when the station omits it
    pub wind_chill_f: f64,
    /// Sustained wind speed in mph
    pub wind_speed_mph: Option<f64>,
    /// Wind gust in mph
    pub wind_gust_mph: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Option<u16>,
    /// Relative humidity percentage (0-100)
    pub humidity: Option<f64>,
    /// Barometric pressure in inHg
    pub pressure_inhg: Option<f64>,
    /// Precipitation rate in inches per hour
    pub precip_rate_in: Option<f64>,
    /// Precipitation accumulated today in inches
    pub precip_total_in: Option<f64>,
    /// Station elevation in feet
    pub elevation_ft: Option<f64>,
    /// UV index
    pub uv_index: Option<f64>,
    /// Solar radiation in W/m²
    pub solar_radiation: Option<f64>,
}
