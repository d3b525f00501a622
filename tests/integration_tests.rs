//! Integration tests for the shackboard HTTP API

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use shackboard::alerts::AlertSource;
use shackboard::api::{AppState, Station};
use shackboard::callsign::CallsignDirectory;
use shackboard::models::{
    Alert, CallsignRecord, Coordinate, CurrentConditions, DailyForecast, HistoricalDay,
    HourlyForecast, Severity,
};
use shackboard::weather::WeatherSource;
use shackboard::{ErrorCode, Result, StationError, web};

struct FakeWeather {
    offline: bool,
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn current_conditions(&self) -> Result<CurrentConditions> {
        if self.offline {
            return Err(StationError::api("timeout", ErrorCode::ApiNetworkError));
        }
        Ok(CurrentConditions {
            station_id: "KTXMINER45".to_string(),
            observed_at: Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap(),
            observed_local: "2026-10-19 10:00:00".to_string(),
            conditions: None,
            temperature_f: 72.5,
            heat_index_f: 73.0,
            dew_point_f: Some(60.0),
            wind_chill_f: 72.5,
            wind_speed_mph: Some(5.8),
            wind_gust_mph: Some(9.0),
            wind_direction: Some(180),
            humidity: Some(65.0),
            pressure_inhg: Some(29.92),
            precip_rate_in: Some(0.0),
            precip_total_in: Some(0.05),
            elevation_ft: Some(500.0),
            uv_index: None,
            solar_radiation: Some(450.0),
        })
    }

    async fn daily_forecast(&self) -> Result<Vec<DailyForecast>> {
        Ok(vec![DailyForecast {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            day_of_week: "Monday".to_string(),
            high_f: Some(85.0),
            low_f: 64.0,
            precip_chance: 20,
            wind_speed_mph: 10.0,
            conditions: "Sunny".to_string(),
            narrative: "Sunny and warm.".to_string(),
        }])
    }

    async fn hourly_forecast(&self) -> Result<Vec<HourlyForecast>> {
        let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        Ok(vec![HourlyForecast {
            valid_time: offset.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap(),
            temperature_f: 80.0,
            precip_chance: 0,
            wind_speed_mph: 8.0,
            conditions: "Sunny".to_string(),
        }])
    }

    async fn history_day(&self, date: NaiveDate) -> Result<Option<HistoricalDay>> {
        Ok(Some(HistoricalDay {
            date,
            high_f: 84.0,
            low_f: 66.0,
            humidity_avg: Some(58.0),
            precip_total_in: Some(0.12),
            wind_speed_avg_mph: Some(6.4),
        }))
    }
}

struct FakeAlerts;

#[async_trait]
impl AlertSource for FakeAlerts {
    async fn active_alerts(&self, _point: Coordinate) -> Result<Vec<Alert>> {
        Ok(vec![Alert {
            id: "urn:oid:1".to_string(),
            event: "Severe Thunderstorm Warning".to_string(),
            headline: "Severe Thunderstorm Warning until 6 PM".to_string(),
            description: "Hail up to 1.75 inches.".to_string(),
            severity: Severity::Severe,
            expires: None,
            url: "https://api.weather.gov/alerts/urn:oid:1".to_string(),
        }])
    }
}

struct FakeDirectory;

#[async_trait]
impl CallsignDirectory for FakeDirectory {
    async fn lookup(&self, callsign: &str) -> Result<CallsignRecord> {
        if callsign != "W5ABC" {
            return Err(StationError::api(
                format!("Callsign {callsign} not found"),
                ErrorCode::ApiNotFound,
            ));
        }
        Ok(CallsignRecord {
            callsign: "W5ABC".to_string(),
            name: "Test Operator".to_string(),
            country: Some("United States".to_string()),
            state: Some("TX".to_string()),
            grid: Some("EL29gs".to_string()),
            license_class: Some("E".to_string()),
            expires: Some("2030-01-01".to_string()),
        })
    }
}

fn app_with(offline: bool) -> axum::Router {
    let state = AppState::new(
        Station {
            callsign: "KJ5IRQ".to_string(),
            position: Coordinate::new(32.7767, -96.7970).unwrap(),
            timezone: chrono_tz::America::Chicago,
        },
        Arc::new(FakeWeather { offline }),
        Arc::new(FakeAlerts),
        Arc::new(FakeDirectory),
    );
    web::app(state, std::time::Duration::from_secs(10))
}

fn app() -> axum::Router {
    app_with(false)
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_station() {
    let (status, body) = get(app(), "/api/station").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["callsign"], "KJ5IRQ");
    assert_eq!(body["grid"], "EM12os");
    assert_eq!(body["latitude"], "32.7767°N");
    assert_eq!(body["longitude"], "96.7970°W");
    assert!(body["utc_clock"].as_str().unwrap().contains(" UTC "));
}

#[tokio::test]
async fn test_current_in_both_units() {
    let (status, body) = get(app(), "/api/weather/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["temperature"], "72.5°F");
    assert_eq!(body["uv_index"], "N/A");

    let (_, body) = get(app(), "/api/weather/current?units=metric").await;
    assert_eq!(body["temperature"], "22.5°C");
    assert_eq!(body["wind_speed"], "9.3 km/h");
    assert_eq!(body["precip_total"], "1.3 mm");
    assert_eq!(body["toggle_label"], "Switch to °F");
}

#[tokio::test]
async fn test_unknown_units_is_bad_request() {
    let (status, body) = get(app(), "/api/weather/current?units=kelvin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_upstream_failure_is_unavailable() {
    let (status, body) = get(app_with(true), "/api/weather/current").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Data unavailable. Please try again later.");
}

#[tokio::test]
async fn test_forecast_kinds() {
    let (status, body) = get(app(), "/api/weather/forecast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "daily");
    assert_eq!(body["rows"][0]["high"], "85.0°F");

    let (_, body) = get(app(), "/api/weather/forecast?kind=hourly").await;
    assert_eq!(body["kind"], "hourly");
    assert_eq!(body["rows"][0]["hour"], "3 PM");

    let (status, _) = get(app(), "/api/weather/forecast?kind=weekly").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history() {
    let (status, body) = get(app(), "/api/weather/history?days=3&units=metric").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 3);
    assert_eq!(body["series"][0]["high"], 28.9);
    assert_eq!(body["temperature_axis"], "Temperature (°C)");

    let (status, _) = get(app(), "/api/weather/history?days=31").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alerts_activate_skywarn() {
    let (status, body) = get(app(), "/api/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skywarn"], "Active");
    assert_eq!(body["alerts"][0]["severity"], "Severe");
}

#[tokio::test]
async fn test_callsign_lookup() {
    let (status, body) = get(app(), "/api/callsign/w5abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["callsign"], "W5ABC");
    assert_eq!(body["location"], "TX, United States");
    assert_eq!(body["profile_url"], "https://www.qrz.com/db/W5ABC");
    assert!(body["distance"].as_str().unwrap().ends_with(" mi"));

    let (status, body) = get(app(), "/api/callsign/XX9XXX").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Callsign XX9XXX not found");

    let (status, _) = get(app(), "/api/callsign/KJ5%20IRQ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_grid_calculator() {
    let (status, body) = get(app(), "/api/grid?lat=32.7767&lon=-96.7970").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locator"], "EM12os");

    let (status, _) = get(app(), "/api/grid?lat=95&lon=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app(), "/api/grid?lat=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_flow() {
    let app = app();

    let (status, body) = get(app.clone(), "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["status"], "loading");
    assert_eq!(body["history_day_choices"], json!([3, 7, 14, 30]));

    let (status, body) = post_json(app.clone(), "/api/dashboard/refresh", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["status"], "ready");
    assert_eq!(body["current"]["data"]["temperature"], "72.5°F");
    assert_eq!(body["alerts"]["data"]["skywarn"], "Active");

    let (status, body) = post_json(
        app.clone(),
        "/api/dashboard/events",
        json!({ "type": "toggle_units" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["units"], "metric");
    assert_eq!(body["current"]["data"]["temperature"], "22.5°C");

    let (status, body) = post_json(
        app.clone(),
        "/api/dashboard/events",
        json!({ "type": "select_history_days", "days": 14 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history_days"], 14);
    assert_eq!(body["history"]["data"]["days"], 14);

    // Metric preference now applies to plain requests too
    let (_, body) = get(app.clone(), "/api/weather/current").await;
    assert_eq!(body["temperature"], "22.5°C");
}

#[tokio::test]
async fn test_dashboard_rejects_fetch_events() {
    let (status, _) = post_json(
        app(),
        "/api/dashboard/events",
        json!({ "type": "feed_failed", "feed": "current", "message": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        app(),
        "/api/dashboard/events",
        json!({ "type": "select_history_days", "days": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    for uri in [
        "/api/grid?lat=abc&lon=0",
        "/api/weather/history?days=-3",
    ] {
        let (status, body) = get(app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("Invalid input: "), "{uri}: {body}");
    }

    let (status, body) = post_json(
        app(),
        "/api/dashboard/events",
        json!({ "type": "bogus" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input: "));

    let request = Request::post("/api/dashboard/events")
        .body(Body::from("toggle_units"))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
