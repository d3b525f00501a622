//! Data models for the shackboard service
//!
//! Every measurement stored here is imperial (°F, mph, inches, inHg, ft), exactly
//! as the upstream sources report it. Metric values only exist as display
//! projections produced by [`crate::units`].
//!
//! - Location: validated coordinates
//! - Weather: current observations
//! - Forecast: daily and hourly forecast rows
//! - History: daily summaries of past observations
//! - Alert: active weather alerts and their severity
//! - Callsign: operator metadata from the callsign directory

pub mod alert;
pub mod callsign;
pub mod forecast;
pub mod history;
pub mod location;
pub mod weather;

pub use alert::{Alert, Severity};
pub use callsign::CallsignRecord;
pub use forecast::{DailyForecast, HourlyForecast};
pub use history::HistoricalDay;
pub use location::Coordinate;
pub use weather::CurrentConditions;
