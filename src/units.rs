//! Unit conversion and display formatting
//!
//! Stored measurements are always imperial. Everything here projects an
//! imperial value into the viewer's [`UnitSystem`] and renders it; nothing
//! mutates the source reading, so toggling units is a pure re-render.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, StationError};

pub const KMH_PER_MPH: f64 = 1.60934;
pub const KM_PER_MILE: f64 = 1.609_344;
pub const MM_PER_INCH: f64 = 25.4;

/// Display unit preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// °F, mph, inches
    #[default]
    Imperial,
    /// °C, km/h, millimetres
    Metric,
}

impl UnitSystem {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Imperial => Self::Metric,
            Self::Metric => Self::Imperial,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }

    /// Label for the button that switches away from this system
    #[must_use]
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Imperial => "Switch to °C",
            Self::Metric => "Switch to °F",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" | "e" => Ok(Self::Imperial),
            "metric" | "m" => Ok(Self::Metric),
            other => Err(StationError::invalid_input(format!(
                "unknown unit system '{other}', expected 'imperial' or 'metric'"
            ))),
        }
    }
}

/// The kinds of reading the dashboard converts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    WindSpeed,
    Precipitation,
}

impl Quantity {
    /// Project an imperial value into `units` without rounding.
    #[must_use]
    pub fn convert(self, imperial: f64, units: UnitSystem) -> f64 {
        match (self, units) {
            (_, UnitSystem::Imperial) => imperial,
            (Self::Temperature, UnitSystem::Metric) => fahrenheit_to_celsius(imperial),
            (Self::WindSpeed, UnitSystem::Metric) => mph_to_kmh(imperial),
            (Self::Precipitation, UnitSystem::Metric) => inches_to_mm(imperial),
        }
    }

    /// Decimal places shown for this quantity
    #[must_use]
    pub fn precision(self, units: UnitSystem) -> usize {
        match (self, units) {
            (Self::Precipitation, UnitSystem::Imperial) => 2,
            _ => 1,
        }
    }

    /// Unit symbol as rendered after the number
    #[must_use]
    pub fn symbol(self, units: UnitSystem) -> &'static str {
        match (self, units) {
            (Self::Temperature, UnitSystem::Imperial) => "°F",
            (Self::Temperature, UnitSystem::Metric) => "°C",
            (Self::WindSpeed, UnitSystem::Imperial) => "mph",
            (Self::WindSpeed, UnitSystem::Metric) => "km/h",
            (Self::Precipitation, UnitSystem::Imperial) => "in",
            (Self::Precipitation, UnitSystem::Metric) => "mm",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Temperature => "",
            Self::WindSpeed | Self::Precipitation => " ",
        }
    }

    /// Convert an imperial reading into a display measurement.
    ///
    /// # Errors
    /// Non-finite readings are rejected rather than rendered as `NaN`.
    pub fn measure(self, imperial: f64, units: UnitSystem) -> Result<Measurement> {
        if !imperial.is_finite() {
            return Err(StationError::invalid_input(format!(
                "{self:?} reading {imperial} is not a finite number"
            )));
        }
        Ok(Measurement {
            quantity: self,
            value: self.convert(imperial, units),
            unit: units,
        })
    }

    /// Convert and render in one step, e.g. `"9.3 km/h"`.
    ///
    /// # Errors
    /// See [`Quantity::measure`].
    pub fn format(self, imperial: f64, units: UnitSystem) -> Result<String> {
        Ok(self.measure(imperial, units)?.to_string())
    }
}

/// A reading projected into a unit system, ready for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub quantity: Quantity,
    pub value: f64,
    pub unit: UnitSystem,
}

impl Measurement {
    /// Value rounded to the display precision
    #[must_use]
    pub fn rounded(&self) -> f64 {
        round_to(self.value, self.quantity.precision(self.unit))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            format_fixed(self.value, self.quantity.precision(self.unit)),
            self.quantity.separator(),
            self.quantity.symbol(self.unit)
        )
    }
}

/// Render `value` with `decimals` places.
///
/// Rounds the exact binary value, so `1.45` (stored just below the tie)
/// renders as `1.4`. Exact ties such as `74.25` round away from zero, and a
/// result of zero never carries a minus sign.
#[must_use]
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let places = i32::try_from(decimals).unwrap_or(i32::MAX);
    let value = if is_exact_tie(value, places) {
        let scale = 10_f64.powi(places);
        (value * scale).round() / scale
    } else {
        value
    };

    let text = format!("{value:.decimals$}");
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => unsigned.to_string(),
        _ => text,
    }
}

/// True when `value` lies exactly halfway between two `places`-decimal numbers.
///
/// That holds only for odd multiples of `2^-(places + 1)`; scaling by a power
/// of two is exact, so the test is too.
fn is_exact_tie(value: f64, places: i32) -> bool {
    let doubled = value * 2_f64.powi(places.saturating_add(1));
    doubled.fract() == 0.0 && doubled.abs() % 2.0 == 1.0
}

/// [`format_fixed`] as a number, e.g. for chart series.
#[must_use]
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format_fixed(value, decimals).parse().unwrap_or(value)
}

#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[must_use]
pub fn mph_to_kmh(mph: f64) -> f64 {
    mph * KMH_PER_MPH
}

#[must_use]
pub fn inches_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

#[must_use]
pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// Render a °F reading, e.g. `"72.5°F"` or `"22.5°C"`.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] for non-finite readings.
pub fn format_temperature(temp_f: f64, units: UnitSystem) -> Result<String> {
    Quantity::Temperature.format(temp_f, units)
}

/// Render a mph reading, e.g. `"5.8 mph"` or `"9.3 km/h"`.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] for non-finite readings.
pub fn format_wind_speed(speed_mph: f64, units: UnitSystem) -> Result<String> {
    Quantity::WindSpeed.format(speed_mph, units)
}

/// Render an inches reading, e.g. `"0.05 in"` or `"1.3 mm"`.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] for non-finite readings.
pub fn format_precipitation(inches: f64, units: UnitSystem) -> Result<String> {
    Quantity::Precipitation.format(inches, units)
}

/// Convert wind direction from degrees to a 16-point cardinal direction
#[must_use]
pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
    match degrees {
        0..=11 | 349..=360 => "N",
        12..=33 => "NNE",
        34..=56 => "NE",
        57..=78 => "ENE",
        79..=101 => "E",
        102..=123 => "ESE",
        124..=146 => "SE",
        147..=168 => "SSE",
        169..=191 => "S",
        192..=213 => "SSW",
        214..=236 => "SW",
        237..=258 => "WSW",
        259..=281 => "W",
        282..=303 => "WNW",
        304..=326 => "NW",
        327..=348 => "NNW",
        _ => "Unknown",
    }
}
