use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::WeatherSource;
use crate::cache::{ResponseCache, jittered};
use crate::config::CacheConfig;
use crate::models::{CurrentConditions, DailyForecast, HistoricalDay, HourlyForecast};
use crate::Result;

/// Finished days never change
const PAST_DAY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTLs for each kind of response
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub current: Duration,
    pub forecast: Duration,
    pub alerts: Duration,
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        let minutes = |m: u32| Duration::from_secs(u64::from(m) * 60);
        Self {
            current: minutes(config.current_ttl_minutes),
            forecast: minutes(config.forecast_ttl_minutes),
            alerts: minutes(config.alerts_ttl_minutes),
        }
    }
}

/// Look `key` up in the cache, otherwise fetch and store it for `ttl`.
///
/// Cache failures are logged and never fail the request.
pub(crate) async fn read_through<T, F, Fut>(
    cache: &ResponseCache,
    key: &str,
    ttl: Option<Duration>,
    fetch: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned + Clone + Debug + Send + 'static,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
{
    match cache.get::<T>(key).await {
        Ok(Some(value)) => {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }
        Ok(None) => debug!("Cache miss for {}", key),
        Err(e) => warn!("Cache read failed for {}: {}", key, e),
    }

    let value = fetch().await?;

    if let Some(ttl) = ttl {
        if let Err(e) = cache.put(key, value.clone(), jittered(ttl)).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    Ok(value)
}

/// Wraps a [`WeatherSource`] with the persistent response cache.
pub struct CachedWeatherSource<S> {
    inner: S,
    cache: ResponseCache,
    ttls: CacheTtls,
    station_id: String,
    timezone: Tz,
}

impl<S: WeatherSource> CachedWeatherSource<S> {
    pub fn new(
        inner: S,
        cache: ResponseCache,
        ttls: CacheTtls,
        station_id: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            inner,
            cache,
            ttls,
            station_id: station_id.into(),
            timezone,
        }
    }

    fn key(&self, kind: &str) -> String {
        format!("weather:{}:{}", self.station_id, kind)
    }

    fn station_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[async_trait]
impl<S: WeatherSource> WeatherSource for CachedWeatherSource<S> {
    async fn current_conditions(&self) -> Result<CurrentConditions> {
        read_through(&self.cache, &self.key("current"), Some(self.ttls.current), || {
            self.inner.current_conditions()
        })
        .await
    }

    async fn daily_forecast(&self) -> Result<Vec<DailyForecast>> {
        read_through(&self.cache, &self.key("daily"), Some(self.ttls.forecast), || {
            self.inner.daily_forecast()
        })
        .await
    }

    async fn hourly_forecast(&self) -> Result<Vec<HourlyForecast>> {
        read_through(&self.cache, &self.key("hourly"), Some(self.ttls.forecast), || {
            self.inner.hourly_forecast()
        })
        .await
    }

    async fn history_day(&self, date: NaiveDate) -> Result<Option<HistoricalDay>> {
        // Today is still accumulating observations
        if date >= self.station_today() {
            return self.inner.history_day(date).await;
        }

        let key = self.key(&format!("history:{date}"));
        match self.cache.get::<HistoricalDay>(&key).await {
            Ok(Some(day)) => return Ok(Some(day)),
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", key, e),
        }

        let day = self.inner.history_day(date).await?;
        if let Some(day) = &day {
            if let Err(e) = self.cache.put(&key, day.clone(), jittered(PAST_DAY_TTL)).await {
                warn!("Cache write failed for {}: {}", key, e);
            }
        }
        Ok(day)
    }
}
