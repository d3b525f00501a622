//! Weather data sources
//!
//! The dashboard only talks to [`WeatherSource`]; the Weather Company client
//! and the caching decorator both implement it, so tests can swap in fakes.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use futures::future::join_all;

use crate::models::{CurrentConditions, DailyForecast, HistoricalDay, HourlyForecast};
use crate::{Result, StationError};

pub mod cached;
pub mod wunderground;

pub use cached::CachedWeatherSource;
pub use wunderground::WundergroundClient;

/// Longest history window the dashboard will request
pub const MAX_HISTORY_DAYS: u32 = 30;

/// History windows offered by the dashboard
pub const HISTORY_DAY_CHOICES: [u32; 4] = [3, 7, 14, 30];

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Latest observation from the station.
    async fn current_conditions(&self) -> Result<CurrentConditions>;

    /// Daily forecast for the station's position, today first.
    async fn daily_forecast(&self) -> Result<Vec<DailyForecast>>;

    /// Hourly forecast for the station's position, next hour first.
    async fn hourly_forecast(&self) -> Result<Vec<HourlyForecast>>;

    /// Daily summary for one date, `None` when the station reported nothing.
    async fn history_day(&self, date: NaiveDate) -> Result<Option<HistoricalDay>>;

    /// Daily summaries for the `days` days ending with `today`, oldest first.
    ///
    /// Days are requested concurrently. Days without observations are
    /// skipped; any failed request fails the whole window.
    async fn history(&self, days: u32, today: NaiveDate) -> Result<Vec<HistoricalDay>> {
        let days = validate_history_days(days)?;

        let dates: Vec<NaiveDate> = (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back.into())))
            .collect();

        let results = join_all(dates.into_iter().map(|date| self.history_day(date))).await;

        let mut history = Vec::with_capacity(results.len());
        for day in results {
            if let Some(day) = day? {
                history.push(day);
            }
        }
        Ok(history)
    }
}

/// Check a requested history window.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] unless `days` is in `1..=30`.
pub fn validate_history_days(days: u32) -> Result<u32> {
    if (1..=MAX_HISTORY_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(StationError::invalid_input(format!(
            "History range must be between 1 and {MAX_HISTORY_DAYS} days, got {days}"
        )))
    }
}
