//! `Shackboard` - Amateur-radio station and weather dashboard
//!
//! This library provides the Maidenhead grid locator, imperial/metric unit
//! formatting, the weather, callsign and alert sources, and the dashboard
//! state served over HTTP.

pub mod alerts;
pub mod api;
pub mod cache;
pub mod callsign;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod grid;
pub mod http;
pub mod models;
pub mod telemetry;
pub mod units;
pub mod views;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::ResponseCache;
pub use config::StationConfig;
pub use dashboard::{Dashboard, DashboardEvent, DashboardState};
pub use error::{ErrorCode, StationError};
pub use grid::{GridLocator, calculate_grid_locator};
pub use models::{Alert, CallsignRecord, Coordinate, CurrentConditions};
pub use units::{UnitSystem, format_precipitation, format_temperature, format_wind_speed};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, StationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
