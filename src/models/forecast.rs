//! Forecast rows for the station location

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One forecast day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`
    pub day_of_week: String,
    /// Forecast high in °F; the current day loses its high once the afternoon has passed
    pub high_f: Option<f64>,
    /// Forecast low in °F
    pub low_f: f64,
    /// Chance of precipitation, percent
    pub precip_chance: u8,
    /// Wind speed in mph
    pub wind_speed_mph: f64,
    pub conditions: String,
    pub narrative: String,
}

/// One forecast hour
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyForecast {
    /// Start of the hour in the station's local offset
    pub valid_time: DateTime<FixedOffset>,
    /// Temperature in °F
    pub temperature_f: f64,
    /// Chance of precipitation, percent
    pub precip_chance: u8,
    /// Wind speed in mph
    pub wind_speed_mph: f64,
    pub conditions: String,
}
