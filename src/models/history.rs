//! Daily summaries of past station observations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary of one past day at the station. A day only exists once its
/// high and low are known.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoricalDay {
    pub date: NaiveDate,
    /// Highest temperature in °F
    pub high_f: f64,
    /// Lowest temperature in °F
    pub low_f: f64,
    /// Average relative humidity, percent
    pub humidity_avg: Option<f64>,
    /// Total precipitation in inches
    pub precip_total_in: Option<f64>,
    /// Average wind speed in mph
    pub wind_speed_avg_mph: Option<f64>,
}
