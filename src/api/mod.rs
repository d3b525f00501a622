use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    ErrorCode, StationError,
    alerts::AlertSource,
    callsign::{CallsignDirectory, normalize_callsign},
    dashboard::{Dashboard, DashboardEvent, DashboardView, ForecastKind},
    grid::{GridLocator, calculate_grid_locator},
    models::Coordinate,
    units::UnitSystem,
    views::{self, AlertsView, CallsignView, CurrentView, ForecastView, HistoryView, StationView},
    weather::WeatherSource,
};

/// Fixed identity of the station being displayed
#[derive(Debug, Clone)]
pub struct Station {
    pub callsign: String,
    pub position: Coordinate,
    pub timezone: Tz,
}

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub station: Arc<Station>,
    pub weather: Arc<dyn WeatherSource>,
    pub alerts: Arc<dyn AlertSource>,
    pub callsigns: Arc<dyn CallsignDirectory>,
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(
        station: Station,
        weather: Arc<dyn WeatherSource>,
        alerts: Arc<dyn AlertSource>,
        callsigns: Arc<dyn CallsignDirectory>,
    ) -> Self {
        let dashboard = Dashboard::new(
            weather.clone(),
            alerts.clone(),
            station.position,
            station.timezone,
        );
        Self {
            station: Arc::new(station),
            weather,
            alerts,
            callsigns,
            dashboard: Arc::new(dashboard),
        }
    }

    /// Explicit `units` parameter, else the dashboard's current preference
    async fn units(&self, requested: Option<&str>) -> Result<UnitSystem, ApiError> {
        match requested {
            Some(units) => Ok(units.parse()?),
            None => Ok(self.dashboard.state().await.units),
        }
    }
}

/// A [`StationError`] rendered as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(StationError);

impl From<StationError> for ApiError {
    fn from(e: StationError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StationError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            StationError::Api {
                code: ErrorCode::ApiNotFound,
                ..
            } => StatusCode::NOT_FOUND,
            StationError::Api { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(StationError::invalid_input(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(StationError::invalid_input(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(StationError::invalid_input(rejection.body_text()))
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Query extraction whose failure renders through [`ApiError`]
type QueryParams<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Deserialize)]
pub struct UnitsQuery {
    pub units: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub units: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub units: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub locator: GridLocator,
    pub latitude: f64,
    pub longitude: f64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/station", get(get_station))
        .route("/weather/current", get(get_current))
        .route("/weather/forecast", get(get_forecast))
        .route("/weather/history", get(get_history))
        .route("/alerts", get(get_alerts))
        .route("/callsign/{callsign}", get(get_callsign))
        .route("/grid", get(get_grid))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/events", post(post_dashboard_event))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

async fn get_station(State(state): State<AppState>) -> ApiResult<StationView> {
    let station = &state.station;
    Ok(Json(views::station_view(
        &station.callsign,
        station.position,
        station.timezone,
        Utc::now(),
    )?))
}

async fn get_current(
    State(state): State<AppState>,
    query: QueryParams<UnitsQuery>,
) -> ApiResult<CurrentView> {
    let Query(query) = query?;
    let units = state.units(query.units.as_deref()).await?;
    let current = state.weather.current_conditions().await?;
    Ok(Json(views::current_view(&current, units)?))
}

async fn get_forecast(
    State(state): State<AppState>,
    query: QueryParams<ForecastQuery>,
) -> ApiResult<ForecastView> {
    let Query(query) = query?;
    let units = state.units(query.units.as_deref()).await?;
    let kind = match query.kind.as_deref() {
        Some(kind) => kind.parse()?,
        None => state.dashboard.state().await.forecast_kind,
    };

    let view = match kind {
        ForecastKind::Daily => views::daily_view(&state.weather.daily_forecast().await?, units)?,
        ForecastKind::Hourly => {
            views::hourly_view(&state.weather.hourly_forecast().await?, units)?
        }
    };
    Ok(Json(view))
}

async fn get_history(
    State(state): State<AppState>,
    query: QueryParams<HistoryQuery>,
) -> ApiResult<HistoryView> {
    let Query(query) = query?;
    let units = state.units(query.units.as_deref()).await?;
    let days = match query.days {
        Some(days) => days,
        None => state.dashboard.state().await.history_days,
    };

    let today = Utc::now().with_timezone(&state.station.timezone).date_naive();
    let history = state.weather.history(days, today).await?;
    Ok(Json(views::history_view(&history, units)?))
}

async fn get_alerts(State(state): State<AppState>) -> ApiResult<AlertsView> {
    let alerts = state.alerts.active_alerts(state.station.position).await?;
    Ok(Json(views::alerts_view(&alerts)))
}

async fn get_callsign(
    State(state): State<AppState>,
    callsign: Result<Path<String>, PathRejection>,
    query: QueryParams<UnitsQuery>,
) -> ApiResult<CallsignView> {
    let Path(callsign) = callsign?;
    let Query(query) = query?;
    let units = state.units(query.units.as_deref()).await?;
    let callsign = normalize_callsign(&callsign)?;
    let record = state.callsigns.lookup(&callsign).await?;
    Ok(Json(views::callsign_view(
        &record,
        state.station.position,
        units,
    )))
}

async fn get_grid(query: QueryParams<GridQuery>) -> ApiResult<GridResponse> {
    let Query(query) = query?;
    let (Some(latitude), Some(longitude)) = (query.lat, query.lon) else {
        return Err(StationError::invalid_input("Both lat and lon are required").into());
    };
    let locator = calculate_grid_locator(latitude, longitude)?;
    Ok(Json(GridResponse {
        locator,
        latitude,
        longitude,
    }))
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    let snapshot = state.dashboard.state().await;
    Json(snapshot.render(snapshot.units))
}

async fn post_dashboard_event(
    State(state): State<AppState>,
    event: Result<Json<DashboardEvent>, JsonRejection>,
) -> ApiResult<DashboardView> {
    let Json(event) = event?;
    if !event.is_user_event() {
        return Err(StationError::invalid_input(
            "Only unit, tab, forecast and history selections can be sent",
        )
        .into());
    }
    let snapshot = state.dashboard.dispatch(event).await?;
    Ok(Json(snapshot.render(snapshot.units)))
}

async fn refresh_dashboard(State(state): State<AppState>) -> ApiResult<DashboardView> {
    let snapshot = state.dashboard.refresh().await?;
    Ok(Json(snapshot.render(snapshot.units)))
}
