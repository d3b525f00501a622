//! Maidenhead grid locators
//!
//! Encodes a latitude/longitude pair into the six-character locator used for
//! location reporting on the air (`EM12os`), and decodes locators published in
//! callsign records back into coordinates.
//!
//! Each pair of characters alternates longitude then latitude: field (A–R,
//! 20°×10°), square (0–9, 2°×1°), subsquare (a–x, 5'×2.5').

use std::fmt;
use std::str::FromStr;

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::models::Coordinate;
use crate::models::location::validate_latitude;
use crate::{Result, StationError};

const FIELD_COUNT: u8 = 18;
const SUBSQUARE_COUNT: u8 = 24;
/// Largest shifted latitude still inside the grid; the north pole maps onto `R9x`.
const LAT_CEILING: f64 = 180.0 - 1e-9;

/// A validated 4- or 6-character Maidenhead locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridLocator(String);

impl GridLocator {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Center of the square or subsquare this locator names.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        let b = self.0.as_bytes();
        let mut lon = f64::from(b[0] - b'A') * 20.0 + f64::from(b[2] - b'0') * 2.0;
        let mut lat = f64::from(b[1] - b'A') * 10.0 + f64::from(b[3] - b'0');

        if b.len() == 6 {
            lon += f64::from(b[4] - b'a') / 12.0 + 1.0 / 24.0;
            lat += f64::from(b[5] - b'a') / 24.0 + 1.0 / 48.0;
        } else {
            lon += 1.0;
            lat += 0.5;
        }

        Coordinate {
            latitude: lat - 90.0,
            longitude: lon - 180.0,
        }
    }
}

impl fmt::Display for GridLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GridLocator {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || StationError::invalid_input(format!("'{s}' is not a Maidenhead locator"));

        let b = s.as_bytes();
        if b.len() != 4 && b.len() != 6 {
            return Err(invalid());
        }

        let mut out = String::with_capacity(b.len());
        for &c in &b[..2] {
            let c = c.to_ascii_uppercase();
            if !(b'A'..b'A' + FIELD_COUNT).contains(&c) {
                return Err(invalid());
            }
            out.push(char::from(c));
        }
        for &c in &b[2..4] {
            if !c.is_ascii_digit() {
                return Err(invalid());
            }
            out.push(char::from(c));
        }
        for &c in &b[4..] {
            let c = c.to_ascii_lowercase();
            if !(b'a'..b'a' + SUBSQUARE_COUNT).contains(&c) {
                return Err(invalid());
            }
            out.push(char::from(c));
        }

        Ok(Self(out))
    }
}

impl TryFrom<String> for GridLocator {
    type Error = StationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<GridLocator> for String {
    fn from(value: GridLocator) -> Self {
        value.0
    }
}

/// Compute the six-character locator for a position.
///
/// Longitude may be any finite value and is wrapped into `[-180, 180)` first.
///
/// # Errors
/// Returns [`StationError::InvalidInput`] for a latitude outside `[-90, 90]` or
/// any non-finite input.
pub fn calculate_grid_locator(lat: f64, lon: f64) -> Result<GridLocator> {
    validate_latitude(lat)?;
    if !lon.is_finite() {
        return Err(StationError::invalid_input(format!(
            "longitude {lon} must be finite"
        )));
    }

    let lon = normalize_longitude(lon);
    let lon_shift = lon + 180.0;
    let lat_shift = (lat + 90.0).min(LAT_CEILING);

    let field_lon = index(lon_shift / 20.0, FIELD_COUNT);
    let field_lat = index(lat_shift / 10.0, FIELD_COUNT);
    let square_lon = index((lon_shift % 20.0) / 2.0, 10);
    let square_lat = index(lat_shift % 10.0, 10);
    let sub_lon = index((lon_shift % 2.0) * 12.0, SUBSQUARE_COUNT);
    let sub_lat = index((lat_shift % 1.0) * 24.0, SUBSQUARE_COUNT);

    let locator: String = [
        b'A' + field_lon,
        b'A' + field_lat,
        b'0' + square_lon,
        b'0' + square_lat,
        b'a' + sub_lon,
        b'a' + sub_lat,
    ]
    .into_iter()
    .map(char::from)
    .collect();

    Ok(GridLocator(locator))
}

/// Wrap any finite longitude into `[-180, 180)`.
#[must_use]
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= 360.0 {
        -180.0
    } else {
        wrapped - 180.0
    }
}

fn index(value: f64, count: u8) -> u8 {
    // value is non-negative and bounded by construction
    let idx = value.floor() as u8;
    idx.min(count - 1)
}

/// Great-circle distance between two positions in kilometers
#[must_use]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        HaversineLocation {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        Units::Kilometers,
    )
}

/// Initial great-circle bearing from `from` to `to`, degrees clockwise from north
#[must_use]
pub fn bearing_degrees(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lat2) = (from.latitude.to_radians(), to.latitude.to_radians());
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_well_formed(locator: &str) -> bool {
        let b = locator.as_bytes();
        b.len() == 6
            && (b'A'..=b'R').contains(&b[0])
            && (b'A'..=b'R').contains(&b[1])
            && b[2].is_ascii_digit()
            && b[3].is_ascii_digit()
            && (b'a'..=b'x').contains(&b[4])
            && (b'a'..=b'x').contains(&b[5])
    }

    #[test]
    fn test_station_fixture() {
        let locator = calculate_grid_locator(32.7767, -96.7970).unwrap();
        assert_eq!(locator.as_str(), "EM12os");
    }

    #[rstest]
    #[case(51.4779, -0.0015, "IO91xl")] // Greenwich
    #[case(40.7128, -74.0060, "FN20xr")] // New York
    #[case(-33.8688, 151.2093, "QF56od")] // Sydney
    #[case(35.6762, 139.6503, "PM95tq")] // Tokyo
    #[case(0.0, 0.0, "JJ00aa")]
    fn test_known_locators(#[case] lat: f64, #[case] lon: f64, #[case] expected: &str) {
        assert_eq!(calculate_grid_locator(lat, lon).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case(-90.0, -180.0, "AA00aa")]
    #[case(90.0, -180.0, "AR09ax")]
    #[case(90.0, 179.999_999, "RR99xx")]
    #[case(-90.0, 180.0, "AA00aa")]
    fn test_grid_corners(#[case] lat: f64, #[case] lon: f64, #[case] expected: &str) {
        assert_eq!(calculate_grid_locator(lat, lon).unwrap().as_str(), expected);
    }

    #[test]
    fn test_every_valid_input_is_well_formed() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                let locator = calculate_grid_locator(lat, lon).unwrap();
                assert!(is_well_formed(locator.as_str()), "{lat},{lon} -> {locator}");
                lon += 7.3;
            }
            lat += 3.7;
        }
    }

    #[rstest]
    #[case(190.0, -170.0)]
    #[case(-190.0, 170.0)]
    #[case(540.0, 180.0)]
    #[case(-96.797 + 720.0, -96.797)]
    fn test_longitude_wraps(#[case] raw: f64, #[case] equivalent: f64) {
        let a = calculate_grid_locator(32.7767, raw).unwrap();
        let b = calculate_grid_locator(32.7767, equivalent).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_longitude_range() {
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert!((normalize_longitude(-1e-20) - (-1e-20)).abs() < 1e-12);
    }

    #[rstest]
    #[case(90.1, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::NAN)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_input_is_rejected(#[case] lat: f64, #[case] lon: f64) {
        let err = calculate_grid_locator(lat, lon).unwrap_err();
        assert!(matches!(err, StationError::InvalidInput { .. }));
    }

    #[test]
    fn test_pure_and_repeatable() {
        let first = calculate_grid_locator(32.7767, -96.7970).unwrap();
        let second = calculate_grid_locator(32.7767, -96.7970).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let locator: GridLocator = "em12OS".parse().unwrap();
        assert_eq!(locator.as_str(), "EM12os");

        let four: GridLocator = " fn20 ".parse().unwrap();
        assert_eq!(four.as_str(), "FN20");
    }

    #[rstest]
    #[case("")]
    #[case("EM1")]
    #[case("EM12o")]
    #[case("ZZ12os")]
    #[case("EM1Aos")]
    #[case("EM12oz")]
    fn test_parse_rejects_garbage(#[case] input: &str) {
        assert!(input.parse::<GridLocator>().is_err());
    }

    #[test]
    fn test_center_round_trips() {
        let locator: GridLocator = "EM12os".parse().unwrap();
        let center = locator.center();
        assert_eq!(
            calculate_grid_locator(center.latitude, center.longitude).unwrap(),
            locator
        );

        let square: GridLocator = "EM12".parse().unwrap();
        let center = square.center();
        assert!((center.longitude - (-97.0)).abs() < 1e-9);
        assert!((center.latitude - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_distance_and_bearing() {
        let dallas = Coordinate::new(32.7767, -96.7970).unwrap();
        let houston = Coordinate::new(29.7604, -95.3698).unwrap();

        let km = distance_km(&dallas, &houston);
        assert!((km - 362.0).abs() < 5.0, "got {km}");

        let bearing = bearing_degrees(&dallas, &houston);
        assert!((150.0..170.0).contains(&bearing), "got {bearing}");

        let north = Coordinate::new(40.0, -96.7970).unwrap();
        assert!(bearing_degrees(&dallas, &north).abs() < 1e-6);
    }
}
