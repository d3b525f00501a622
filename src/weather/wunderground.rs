use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::WeatherSource;
use crate::config::WeatherConfig;
use crate::http::{self, redact};
use crate::models::{Coordinate, CurrentConditions, DailyForecast, HistoricalDay, HourlyForecast};
use crate::{ErrorCode, Result, StationError};

/// Weather Company client for one personal weather station.
///
/// Observations and history come from the station itself; forecasts are
/// looked up by the station's coordinates. Everything is requested in
/// imperial units (`units=e`).
pub struct WundergroundClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    station_id: String,
    position: Coordinate,
    forecast_days: usize,
    hourly_hours: usize,
}

impl WundergroundClient {
    /// Create a client for the configured station.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &WeatherConfig, position: Coordinate) -> Result<Self> {
        let client = http::build_client(
            config.timeout_seconds,
            config.max_retries,
            &format!("shackboard/{}", crate::VERSION),
        )?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            station_id: config.station_id.clone(),
            position,
            forecast_days: config.forecast_days as usize,
            hourly_hours: config.hourly_hours as usize,
        })
    }

    fn api_key(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(|key| urlencoding::encode(key).into_owned())
            .ok_or_else(|| {
                StationError::config(
                    "Weather API key not configured. Set weather.api_key or SHACKBOARD__WEATHER__API_KEY.",
                )
            })
    }

    fn station_url(&self, path: &str, extra: &str) -> Result<String> {
        Ok(format!(
            "{}{}?stationId={}&format=json&units=e{}&apiKey={}",
            self.base_url,
            path,
            urlencoding::encode(&self.station_id),
            extra,
            self.api_key()?
        ))
    }

    fn forecast_url(&self, path: &str) -> Result<String> {
        Ok(format!(
            "{}{}?geocode={:.4},{:.4}&format=json&units=e&language=en-US&apiKey={}",
            self.base_url,
            path,
            self.position.latitude,
            self.position.longitude,
            self.api_key()?
        ))
    }

    /// Fetch a station endpoint; an empty body (HTTP 204) means no observations.
    async fn fetch_observations<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!("GET {}", redact(url));
        let body = http::get_text(&self.client, url, "application/json").await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).map(Some).map_err(|e| {
            StationError::api(
                format!("Invalid data received from upstream: {e}"),
                ErrorCode::ApiInvalidResponse,
            )
        })
    }
}

#[async_trait]
impl WeatherSource for WundergroundClient {
    #[tracing::instrument(name = "current_conditions", skip(self), fields(station = %self.station_id))]
    async fn current_conditions(&self) -> Result<CurrentConditions> {
        let url = self.station_url("/v2/pws/observations/current", "")?;
        let response: Option<ObservationsResponse<CurrentObservation>> =
            self.fetch_observations(&url).await?;

        let observation = response
            .and_then(|r| r.observations.into_iter().next())
            .ok_or_else(|| {
                StationError::api(
                    format!("Station {} is not reporting observations", self.station_id),
                    ErrorCode::ApiNotFound,
                )
            })?;

        info!("Received current conditions from {}", observation.station_id);
        observation.into_conditions()
    }

    #[tracing::instrument(name = "daily_forecast", skip(self))]
    async fn daily_forecast(&self) -> Result<Vec<DailyForecast>> {
        let url = self.forecast_url("/v3/wx/forecast/daily/5day")?;
        debug!("GET {}", redact(&url));
        let response: DailyForecastResponse = http::get_json(&self.client, &url).await?;
        let mut days = response.into_days()?;
        days.truncate(self.forecast_days);
        Ok(days)
    }

    #[tracing::instrument(name = "hourly_forecast", skip(self))]
    async fn hourly_forecast(&self) -> Result<Vec<HourlyForecast>> {
        let url = self.forecast_url("/v3/wx/forecast/hourly/2day")?;
        debug!("GET {}", redact(&url));
        let response: HourlyForecastResponse = http::get_json(&self.client, &url).await?;
        let mut hours = response.into_hours()?;
        hours.truncate(self.hourly_hours);
        Ok(hours)
    }

    #[tracing::instrument(name = "history_day", skip(self))]
    async fn history_day(&self, date: NaiveDate) -> Result<Option<HistoricalDay>> {
        let extra = format!("&date={}", date.format("%Y%m%d"));
        let url = self.station_url("/v2/pws/history/daily", &extra)?;
        let response: Option<ObservationsResponse<HistoryObservation>> =
            self.fetch_observations(&url).await?;

        Ok(response
            .and_then(|r| r.observations.into_iter().next())
            .and_then(|o| o.into_day(date)))
    }
}

fn invalid(message: impl Into<String>) -> StationError {
    StationError::api(message, ErrorCode::ApiInvalidResponse)
}

/// Forecast timestamps look like `2026-10-19T07:00:00-0500`
fn parse_local_time(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map_err(|e| invalid(format!("Bad forecast timestamp '{value}': {e}")))
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse<T> {
    #[serde(default = "Vec::new")]
    observations: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentObservation {
    #[serde(rename = "stationID")]
    station_id: String,
    obs_time_utc: DateTime<Utc>,
    obs_time_local: Option<String>,
    solar_radiation: Option<f64>,
    uv: Option<f64>,
    #[serde(rename = "winddir")]
    wind_direction: Option<u16>,
    humidity: Option<f64>,
    imperial: ImperialReadings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImperialReadings {
    temp: Option<f64>,
    heat_index: Option<f64>,
    #[serde(rename = "dewpt")]
    dew_point: Option<f64>,
    wind_chill: Option<f64>,
    wind_speed: Option<f64>,
    wind_gust: Option<f64>,
    pressure: Option<f64>,
    precip_rate: Option<f64>,
    precip_total: Option<f64>,
    #[serde(rename = "elev")]
    elevation: Option<f64>,
}

impl CurrentObservation {
    fn into_conditions(self) -> Result<CurrentConditions> {
        let imperial = self.imperial;
        let temperature_f = imperial
            .temp
            .ok_or_else(|| invalid("Observation is missing a temperature"))?;

        Ok(CurrentConditions {
            observed_local: self
                .obs_time_local
                .unwrap_or_else(|| self.obs_time_utc.format("%Y-%m-%d %H:%M:%S").to_string()),
            station_id: self.station_id,
            observed_at: self.obs_time_utc,
            conditions: None,
            temperature_f,
            heat_index_f: imperial.heat_index.unwrap_or(temperature_f),
            dew_point_f: imperial.dew_point,
            wind_chill_f: imperial.wind_chill.unwrap_or(temperature_f),
            wind_speed_mph: imperial.wind_speed,
            wind_gust_mph: imperial.wind_gust,
            wind_direction: self.wind_direction,
            humidity: self.humidity,
            pressure_inhg: imperial.pressure,
            precip_rate_in: imperial.precip_rate,
            precip_total_in: imperial.precip_total,
            elevation_ft: imperial.elevation,
            uv_index: self.uv,
            solar_radiation: self.solar_radiation,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryObservation {
    humidity_avg: Option<f64>,
    imperial: HistoryReadings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryReadings {
    temp_high: Option<f64>,
    temp_low: Option<f64>,
    #[serde(rename = "windspeedAvg")]
    wind_speed_avg: Option<f64>,
    precip_total: Option<f64>,
}

impl HistoryObservation {
    /// `None` when the summary has no temperature range
    fn into_day(self, date: NaiveDate) -> Option<HistoricalDay> {
        let (Some(high_f), Some(low_f)) = (self.imperial.temp_high, self.imperial.temp_low) else {
            warn!("History for {} has no temperature range; skipping the day", date);
            return None;
        };

        Some(HistoricalDay {
            date,
            high_f,
            low_f,
            humidity_avg: self.humidity_avg,
            precip_total_in: self.imperial.precip_total,
            wind_speed_avg_mph: self.imperial.wind_speed_avg,
        })
    }
}

/// The v3 forecast is columnar: one array per field, one entry per day
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyForecastResponse {
    day_of_week: Vec<String>,
    valid_time_local: Vec<String>,
    temperature_max: Vec<Option<f64>>,
    temperature_min: Vec<Option<f64>>,
    narrative: Vec<Option<String>>,
    #[serde(default = "Vec::new")]
    daypart: Vec<Daypart>,
}

/// Day and night halves interleaved: index `2n` is day `n`, `2n + 1` its night
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Daypart {
    precip_chance: Vec<Option<u8>>,
    wind_speed: Vec<Option<f64>>,
    wx_phrase_long: Vec<Option<String>>,
}

impl Daypart {
    /// Prefer the daytime half; it is null once the day is over
    fn pick<T: Clone>(values: &[Option<T>], day: usize) -> Option<T> {
        values
            .get(day * 2)
            .cloned()
            .flatten()
            .or_else(|| values.get(day * 2 + 1).cloned().flatten())
    }
}

impl DailyForecastResponse {
    fn into_days(self) -> Result<Vec<DailyForecast>> {
        let daypart = self.daypart.into_iter().next();
        let mut days = Vec::with_capacity(self.day_of_week.len());

        for (i, day_of_week) in self.day_of_week.into_iter().enumerate() {
            let valid = self
                .valid_time_local
                .get(i)
                .ok_or_else(|| invalid("Forecast arrays have mismatched lengths"))?;
            let date = parse_local_time(valid)?.date_naive();

            let low_f = self
                .temperature_min
                .get(i)
                .copied()
                .flatten()
                .ok_or_else(|| invalid("Forecast day is missing a low temperature"))?;

            let (precip_chance, wind_speed_mph, conditions) = match &daypart {
                Some(part) => (
                    Daypart::pick(&part.precip_chance, i).unwrap_or(0),
                    Daypart::pick(&part.wind_speed, i).unwrap_or(0.0),
                    Daypart::pick(&part.wx_phrase_long, i).unwrap_or_default(),
                ),
                None => (0, 0.0, String::new()),
            };

            days.push(DailyForecast {
                date,
                day_of_week,
                high_f: self.temperature_max.get(i).copied().flatten(),
                low_f,
                precip_chance,
                wind_speed_mph,
                conditions,
                narrative: self.narrative.get(i).cloned().flatten().unwrap_or_default(),
            });
        }

        Ok(days)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HourlyForecastResponse {
    valid_time_local: Vec<String>,
    temperature: Vec<Option<f64>>,
    precip_chance: Vec<Option<u8>>,
    wind_speed: Vec<Option<f64>>,
    wx_phrase_long: Vec<Option<String>>,
}

impl HourlyForecastResponse {
    fn into_hours(self) -> Result<Vec<HourlyForecast>> {
        self.valid_time_local
            .iter()
            .enumerate()
            .map(|(i, valid)| {
                Ok(HourlyForecast {
                    valid_time: parse_local_time(valid)?,
                    temperature_f: self
                        .temperature
                        .get(i)
                        .copied()
                        .flatten()
                        .ok_or_else(|| invalid("Forecast hour is missing a temperature"))?,
                    precip_chance: self.precip_chance.get(i).copied().flatten().unwrap_or(0),
                    wind_speed_mph: self.wind_speed.get(i).copied().flatten().unwrap_or(0.0),
                    conditions: self
                        .wx_phrase_long
                        .get(i)
                        .cloned()
                        .flatten()
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}
