use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use shackboard::alerts::{AlertSource, CachedAlertSource, NwsClient};
use shackboard::api::{AppState, Station};
use shackboard::callsign::QrzClient;
use shackboard::weather::cached::CacheTtls;
use shackboard::weather::{CachedWeatherSource, WeatherSource, WundergroundClient};
use shackboard::{ResponseCache, StationConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = StationConfig::load().context("Failed to load configuration")?;
    let _telemetry = telemetry::init(&config.logging)?;

    let position = config.coordinate()?;
    let timezone = config.timezone()?;
    info!(
        "Starting shackboard {} for {} at {}",
        shackboard::VERSION,
        config.station.callsign,
        position.format_coordinates()
    );

    if config.weather.api_key.is_none() {
        warn!("No weather API key configured; weather feeds will be unavailable");
    }

    let cache = ResponseCache::open(&config.cache.location)
        .with_context(|| format!("Failed to open cache at {}", config.cache.location))?;
    let ttls = CacheTtls::from(&config.cache);

    let weather: Arc<dyn WeatherSource> = Arc::new(CachedWeatherSource::new(
        WundergroundClient::new(&config.weather, position)?,
        cache.clone(),
        ttls,
        config.weather.station_id.clone(),
        timezone,
    ));
    let alerts: Arc<dyn AlertSource> = Arc::new(CachedAlertSource::new(
        NwsClient::new(&config.alerts)?,
        cache,
        ttls.alerts,
    ));
    let callsigns = Arc::new(QrzClient::new(&config.callsign)?);

    let state = AppState::new(
        Station {
            callsign: config.station.callsign.clone(),
            position,
            timezone,
        },
        weather,
        alerts,
        callsigns,
    );

    state.dashboard.refresh().await?;

    web::run(&config.server, state).await
}
