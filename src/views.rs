//! Display view models
//!
//! Pure projections of stored (imperial) data into the strings and series a
//! client renders. Every reading goes through [`crate::units`], so a unit
//! toggle only ever changes what is built here, never what is stored.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::grid::{GridLocator, bearing_degrees, calculate_grid_locator, distance_km};
use crate::models::{
    Alert, CallsignRecord, Coordinate, CurrentConditions, DailyForecast, HistoricalDay,
    HourlyForecast,
};
use crate::units::{
    Quantity, UnitSystem, format_fixed, format_precipitation, format_temperature,
    format_wind_speed, km_to_miles, round_to, wind_direction_to_cardinal,
};
use crate::Result;

const DEFAULT_CONDITIONS: &str = "Clear";
const NOT_AVAILABLE: &str = "N/A";

/// Format a reading the station may not report; absent readings show `N/A`.
fn or_not_available(
    reading: Option<f64>,
    format: impl FnOnce(f64) -> Result<String>,
) -> Result<String> {
    reading.map_or_else(|| Ok(NOT_AVAILABLE.to_string()), format)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentView {
    pub station_id: String,
    pub units: UnitSystem,
    pub temperature: String,
    pub feels_like: String,
    pub dew_point: String,
    pub wind_chill: String,
    pub wind_speed: String,
    pub wind_gust: String,
    /// Cardinal plus degrees, e.g. `S (180°)`
    pub wind_direction: String,
    pub humidity: String,
    pub precip_total: String,
    pub precip_rate: String,
    pub pressure: String,
    pub uv_index: String,
    pub solar_radiation: String,
    pub elevation: String,
    pub conditions: String,
    pub last_updated: String,
    pub toggle_label: String,
}

/// Build the current-conditions card.
///
/// # Errors
/// Fails if any reading is not a finite number.
pub fn current_view(current: &CurrentConditions, units: UnitSystem) -> Result<CurrentView> {
    Ok(CurrentView {
        station_id: current.station_id.clone(),
        units,
        temperature: format_temperature(current.temperature_f, units)?,
        feels_like: format_temperature(current.heat_index_f, units)?,
        dew_point: or_not_available(current.dew_point_f, |t| format_temperature(t, units))?,
        wind_chill: format_temperature(current.wind_chill_f, units)?,
        wind_speed: or_not_available(current.wind_speed_mph, |s| format_wind_speed(s, units))?,
        wind_gust: or_not_available(current.wind_gust_mph, |s| format_wind_speed(s, units))?,
        wind_direction: current.wind_direction.map_or_else(
            || NOT_AVAILABLE.to_string(),
            |degrees| format!("{} ({degrees}°)", wind_direction_to_cardinal(degrees)),
        ),
        humidity: or_not_available(current.humidity, |h| Ok(format!("{}%", format_fixed(h, 0))))?,
        precip_total: or_not_available(current.precip_total_in, |p| {
            format_precipitation(p, units)
        })?,
        precip_rate: or_not_available(current.precip_rate_in, |p| {
            Ok(format!("{}/hr", format_precipitation(p, units)?))
        })?,
        pressure: or_not_available(current.pressure_inhg, |p| {
            Ok(format!("{} inHg", format_fixed(p, 2)))
        })?,
        uv_index: current
            .uv_index
            .map_or_else(|| NOT_AVAILABLE.to_string(), |uv| format!("{}", round_to(uv, 1))),
        solar_radiation: format!(
            "{} W/m²",
            current
                .solar_radiation
                .map_or_else(|| NOT_AVAILABLE.to_string(), |w| format!("{}", round_to(w, 1)))
        ),
        elevation: or_not_available(current.elevation_ft, |e| {
            Ok(format!("{} ft", format_fixed(e, 0)))
        })?,
        conditions: current
            .conditions
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONDITIONS.to_string()),
        last_updated: format!("Last updated: {}", current.observed_local),
        toggle_label: units.toggle_label().to_string(),
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyRow {
    /// Short weekday, e.g. `Mon`
    pub day: String,
    /// `MM/DD/YYYY`
    pub date: String,
    /// Missing once the day's high has passed
    pub high: Option<String>,
    pub low: String,
    pub precip_chance: String,
    pub wind: String,
    pub conditions: String,
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HourlyRow {
    /// e.g. `3 PM`
    pub hour: String,
    pub date: String,
    pub temperature: String,
    pub precip_chance: String,
    pub wind: String,
    pub conditions: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "rows", rename_all = "lowercase")]
pub enum ForecastView {
    Daily(Vec<DailyRow>),
    Hourly(Vec<HourlyRow>),
}

fn conditions_or_default(conditions: &str) -> String {
    if conditions.trim().is_empty() {
        DEFAULT_CONDITIONS.to_string()
    } else {
        conditions.to_string()
    }
}

/// # Errors
/// Fails if any reading is not a finite number.
pub fn daily_view(days: &[DailyForecast], units: UnitSystem) -> Result<ForecastView> {
    let rows = days
        .iter()
        .map(|d| {
            Ok(DailyRow {
                day: d.date.format("%a").to_string(),
                date: d.date.format("%m/%d/%Y").to_string(),
                high: d.high_f.map(|h| format_temperature(h, units)).transpose()?,
                low: format_temperature(d.low_f, units)?,
                precip_chance: format!("{}%", d.precip_chance),
                wind: format_wind_speed(d.wind_speed_mph, units)?,
                conditions: conditions_or_default(&d.conditions),
                narrative: d.narrative.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ForecastView::Daily(rows))
}

/// # Errors
/// Fails if any reading is not a finite number.
pub fn hourly_view(hours: &[HourlyForecast], units: UnitSystem) -> Result<ForecastView> {
    let rows = hours
        .iter()
        .map(|h| {
            Ok(HourlyRow {
                hour: h.valid_time.format("%-I %p").to_string(),
                date: h.valid_time.format("%m/%d/%Y").to_string(),
                temperature: format_temperature(h.temperature_f, units)?,
                precip_chance: format!("{}%", h.precip_chance),
                wind: format_wind_speed(h.wind_speed_mph, units)?,
                conditions: conditions_or_default(&h.conditions),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ForecastView::Hourly(rows))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryRow {
    pub date: String,
    pub high: String,
    pub low: String,
    pub humidity: String,
    pub precipitation: String,
    pub wind: String,
}

/// One chart point. Temperatures are rounded to one decimal; precipitation
/// and wind are converted but left unrounded, and are `null` when the
/// station did not report them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryPoint {
    /// ISO date, used as the x value
    pub date: String,
    pub high: f64,
    pub low: f64,
    pub precipitation: Option<f64>,
    pub wind: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryView {
    pub days: usize,
    pub rows: Vec<HistoryRow>,
    pub series: Vec<HistoryPoint>,
    pub temperature_axis: String,
    pub precipitation_axis: String,
}

/// # Errors
/// Fails if any reading is not a finite number.
pub fn history_view(history: &[HistoricalDay], units: UnitSystem) -> Result<HistoryView> {
    let mut rows = Vec::with_capacity(history.len());
    let mut series = Vec::with_capacity(history.len());

    for day in history {
        rows.push(HistoryRow {
            date: day.date.format("%m/%d/%Y").to_string(),
            high: format_temperature(day.high_f, units)?,
            low: format_temperature(day.low_f, units)?,
            humidity: or_not_available(day.humidity_avg, |h| {
                Ok(format!("{}%", format_fixed(h, 0)))
            })?,
            precipitation: or_not_available(day.precip_total_in, |p| {
                format_precipitation(p, units)
            })?,
            wind: or_not_available(day.wind_speed_avg_mph, |w| format_wind_speed(w, units))?,
        });

        series.push(HistoryPoint {
            date: day.date.to_string(),
            high: round_to(Quantity::Temperature.measure(day.high_f, units)?.value, 1),
            low: round_to(Quantity::Temperature.measure(day.low_f, units)?.value, 1),
            precipitation: day
                .precip_total_in
                .map(|p| Quantity::Precipitation.measure(p, units).map(|m| m.value))
                .transpose()?,
            wind: day
                .wind_speed_avg_mph
                .map(|w| Quantity::WindSpeed.measure(w, units).map(|m| m.value))
                .transpose()?,
        });
    }

    Ok(HistoryView {
        days: history.len(),
        rows,
        series,
        temperature_axis: format!("Temperature ({})", Quantity::Temperature.symbol(units)),
        precipitation_axis: format!("Precipitation ({})", Quantity::Precipitation.symbol(units)),
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationView {
    pub callsign: String,
    pub latitude: String,
    pub longitude: String,
    pub grid: GridLocator,
    /// `HH:MM:SS UTC DD Mon YYYY`
    pub utc_clock: String,
    pub local_time: String,
    pub local_date: String,
    pub timezone: String,
}

/// Header block with the station identity and clocks at `now`.
///
/// # Errors
/// Fails if the station position cannot be placed on the grid.
pub fn station_view(
    callsign: &str,
    position: Coordinate,
    timezone: Tz,
    now: DateTime<Utc>,
) -> Result<StationView> {
    let local = now.with_timezone(&timezone);
    Ok(StationView {
        callsign: callsign.to_string(),
        latitude: position.format_latitude(),
        longitude: position.format_longitude(),
        grid: calculate_grid_locator(position.latitude, position.longitude)?,
        utc_clock: now.format("%H:%M:%S UTC %d %b %Y").to_string(),
        local_time: local.format("%H:%M:%S %Z").to_string(),
        local_date: local.format("%A, %b %-d, %Y").to_string(),
        timezone: timezone.name().to_string(),
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallsignView {
    pub callsign: String,
    pub name: String,
    pub location: String,
    pub grid: Option<String>,
    pub license_class: Option<String>,
    pub expires: Option<String>,
    pub profile_url: String,
    /// Present when the record's grid parses
    pub distance: Option<String>,
    pub bearing: Option<String>,
}

/// Render a directory record relative to the station.
///
/// Distance is in miles for imperial and kilometers for metric.
#[must_use]
pub fn callsign_view(record: &CallsignRecord, station: Coordinate, units: UnitSystem) -> CallsignView {
    let target = record
        .grid
        .as_deref()
        .and_then(|g| g.parse::<GridLocator>().ok())
        .map(|g| g.center());

    let (distance, bearing) = match target {
        Some(target) => {
            let km = distance_km(&station, &target);
            let distance = match units {
                UnitSystem::Imperial => format!("{:.0} mi", km_to_miles(km)),
                UnitSystem::Metric => format!("{km:.0} km"),
            };
            let degrees = bearing_degrees(&station, &target);
            // Cardinal lookup works on whole degrees
            let whole = round_to(degrees, 0) as u16 % 360;
            (
                Some(distance),
                Some(format!("{whole}° {}", wind_direction_to_cardinal(whole))),
            )
        }
        None => (None, None),
    };

    CallsignView {
        callsign: record.callsign.clone(),
        name: record.name.clone(),
        location: record.location(),
        grid: record.grid.clone(),
        license_class: record.license_class.clone(),
        expires: record.expires.clone(),
        profile_url: record.profile_url(),
        distance,
        bearing,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SkywarnStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertsView {
    pub skywarn: SkywarnStatus,
    pub alerts: Vec<Alert>,
}

#[must_use]
pub fn alerts_view(alerts: &[Alert]) -> AlertsView {
    let skywarn = if alerts.iter().any(|a| a.severity.activates_skywarn()) {
        SkywarnStatus::Active
    } else {
        SkywarnStatus::Inactive
    };
    AlertsView {
        skywarn,
        alerts: alerts.to_vec(),
    }
}
