//! Dashboard state and controller
//!
//! [`DashboardState`] is an immutable snapshot; every change is a
//! [`DashboardEvent`] run through the pure [`DashboardState::apply`]. The
//! [`Dashboard`] controller owns the data sources, turns fetch results into
//! events and keeps the latest snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::alerts::AlertSource;
use crate::models::{Alert, Coordinate, CurrentConditions, DailyForecast, HistoricalDay, HourlyForecast};
use crate::units::UnitSystem;
use crate::views::{self, AlertsView, CurrentView, ForecastView, HistoryView};
use crate::weather::{HISTORY_DAY_CHOICES, WeatherSource, validate_history_days};
use crate::{Result, StationError};

/// History window shown before the user picks one
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// One remotely fetched piece of dashboard data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Feed<T> {
    Loading,
    Ready { data: T, fetched_at: DateTime<Utc> },
    Unavailable { message: String },
}

impl<T> Feed<T> {
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Feed::Ready { data, .. } => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Feed::Loading)
    }

    /// Project ready data; a projection failure makes the feed unavailable.
    fn render<V>(&self, view: impl FnOnce(&T) -> Result<V>) -> Feed<V> {
        match self {
            Feed::Loading => Feed::Loading,
            Feed::Unavailable { message } => Feed::Unavailable {
                message: message.clone(),
            },
            Feed::Ready { data, fetched_at } => match view(data) {
                Ok(data) => Feed::Ready {
                    data,
                    fetched_at: *fetched_at,
                },
                Err(e) => Feed::Unavailable {
                    message: e.user_message(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Current,
    Forecast,
    History,
    Station,
    Alerts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastKind {
    #[default]
    Daily,
    Hourly,
}

impl std::str::FromStr for ForecastKind {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            other => Err(StationError::invalid_input(format!(
                "Unknown forecast kind '{other}', expected daily or hourly"
            ))),
        }
    }
}

/// Names a feed in [`DashboardEvent::FeedFailed`]. History failures carry
/// their window and use [`DashboardEvent::HistoryFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Current,
    Daily,
    Hourly,
    Alerts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    ToggleUnits,
    SelectTab {
        tab: Tab,
    },
    SelectForecast {
        kind: ForecastKind,
    },
    SelectHistoryDays {
        days: u32,
    },
    CurrentLoaded {
        data: CurrentConditions,
        at: DateTime<Utc>,
    },
    ForecastLoaded {
        data: Vec<DailyForecast>,
        at: DateTime<Utc>,
    },
    HourlyLoaded {
        data: Vec<HourlyForecast>,
        at: DateTime<Utc>,
    },
    HistoryLoaded {
        days: u32,
        data: Vec<HistoricalDay>,
        at: DateTime<Utc>,
    },
    AlertsLoaded {
        data: Vec<Alert>,
        at: DateTime<Utc>,
    },
    FeedFailed {
        feed: FeedKind,
        message: String,
    },
    HistoryFailed {
        days: u32,
        message: String,
    },
}

impl DashboardEvent {
    /// Events a client may send; the rest come from fetches.
    #[must_use]
    pub fn is_user_event(&self) -> bool {
        matches!(
            self,
            Self::ToggleUnits
                | Self::SelectTab { .. }
                | Self::SelectForecast { .. }
                | Self::SelectHistoryDays { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub units: UnitSystem,
    pub tab: Tab,
    pub forecast_kind: ForecastKind,
    pub history_days: u32,
    pub current: Feed<CurrentConditions>,
    pub daily: Feed<Vec<DailyForecast>>,
    pub hourly: Feed<Vec<HourlyForecast>>,
    pub history: Feed<Vec<HistoricalDay>>,
    pub alerts: Feed<Vec<Alert>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            tab: Tab::default(),
            forecast_kind: ForecastKind::default(),
            history_days: DEFAULT_HISTORY_DAYS,
            current: Feed::Loading,
            daily: Feed::Loading,
            hourly: Feed::Loading,
            history: Feed::Loading,
            alerts: Feed::Loading,
        }
    }
}

impl DashboardState {
    /// The state after `event`.
    ///
    /// # Errors
    /// Returns [`StationError::InvalidInput`] for a history window outside
    /// `1..=30`; the current state is left as it was.
    pub fn apply(&self, event: DashboardEvent) -> Result<DashboardState> {
        let mut next = self.clone();

        match event {
            DashboardEvent::ToggleUnits => next.units = self.units.toggle(),
            DashboardEvent::SelectTab { tab } => next.tab = tab,
            DashboardEvent::SelectForecast { kind } => next.forecast_kind = kind,
            DashboardEvent::SelectHistoryDays { days } => {
                let days = validate_history_days(days)?;
                if days != self.history_days {
                    next.history_days = days;
                    next.history = Feed::Loading;
                }
            }
            DashboardEvent::CurrentLoaded { data, at } => {
                next.current = Feed::Ready { data, fetched_at: at };
            }
            DashboardEvent::ForecastLoaded { data, at } => {
                next.daily = Feed::Ready { data, fetched_at: at };
            }
            DashboardEvent::HourlyLoaded { data, at } => {
                next.hourly = Feed::Ready { data, fetched_at: at };
            }
            DashboardEvent::HistoryLoaded { days, data, at } => {
                // A window the user has since moved away from
                if days == self.history_days {
                    next.history = Feed::Ready { data, fetched_at: at };
                }
            }
            DashboardEvent::AlertsLoaded { data, at } => {
                next.alerts = Feed::Ready { data, fetched_at: at };
            }
            DashboardEvent::FeedFailed { feed, message } => {
                match feed {
                    FeedKind::Current => next.current = Feed::Unavailable { message },
                    FeedKind::Daily => next.daily = Feed::Unavailable { message },
                    FeedKind::Hourly => next.hourly = Feed::Unavailable { message },
                    FeedKind::Alerts => next.alerts = Feed::Unavailable { message },
                }
            }
            DashboardEvent::HistoryFailed { days, message } => {
                if days == self.history_days {
                    next.history = Feed::Unavailable { message };
                }
            }
        }

        Ok(next)
    }

    /// Render every feed in `units`.
    #[must_use]
    pub fn render(&self, units: UnitSystem) -> DashboardView {
        let forecast = match self.forecast_kind {
            ForecastKind::Daily => self.daily.render(|d| views::daily_view(d, units)),
            ForecastKind::Hourly => self.hourly.render(|h| views::hourly_view(h, units)),
        };

        DashboardView {
            units,
            toggle_label: units.toggle_label().to_string(),
            tab: self.tab,
            forecast_kind: self.forecast_kind,
            history_days: self.history_days,
            history_day_choices: &HISTORY_DAY_CHOICES,
            current: self.current.render(|c| views::current_view(c, units)),
            forecast,
            history: self.history.render(|h| views::history_view(h, units)),
            alerts: self.alerts.render(|a| Ok(views::alerts_view(a))),
        }
    }
}

/// A rendered [`DashboardState`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub units: UnitSystem,
    pub toggle_label: String,
    pub tab: Tab,
    pub forecast_kind: ForecastKind,
    pub history_days: u32,
    /// Windows a client may offer for [`DashboardEvent::SelectHistoryDays`]
    pub history_day_choices: &'static [u32],
    pub current: Feed<CurrentView>,
    pub forecast: Feed<ForecastView>,
    pub history: Feed<HistoryView>,
    pub alerts: Feed<AlertsView>,
}

fn failed(feed: FeedKind, error: &StationError) -> DashboardEvent {
    warn!("Failed to load {:?} feed: {}", feed, error);
    DashboardEvent::FeedFailed {
        feed,
        message: error.user_message(),
    }
}

/// Owns the data sources and the current [`DashboardState`].
pub struct Dashboard {
    weather: Arc<dyn WeatherSource>,
    alerts: Arc<dyn AlertSource>,
    position: Coordinate,
    timezone: Tz,
    state: RwLock<DashboardState>,
}

impl Dashboard {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        alerts: Arc<dyn AlertSource>,
        position: Coordinate,
        timezone: Tz,
    ) -> Self {
        Self {
            weather,
            alerts,
            position,
            timezone,
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    async fn apply(&self, event: DashboardEvent) -> Result<DashboardState> {
        let mut state = self.state.write().await;
        let next = state.apply(event)?;
        *state = next.clone();
        Ok(next)
    }

    /// Apply an event, then load whatever feed it left waiting.
    ///
    /// # Errors
    /// Fails only when the event itself is rejected.
    #[tracing::instrument(name = "dashboard_dispatch", skip(self))]
    pub async fn dispatch(&self, event: DashboardEvent) -> Result<DashboardState> {
        let wants_history = matches!(event, DashboardEvent::SelectHistoryDays { .. });
        let wants_hourly = matches!(
            event,
            DashboardEvent::SelectForecast {
                kind: ForecastKind::Hourly
            }
        );

        let state = self.apply(event).await?;

        if wants_history && state.history.is_loading() {
            let event = self.load_history(state.history_days).await;
            self.apply(event).await
        } else if wants_hourly && state.hourly.is_loading() {
            let event = self.load_hourly().await;
            self.apply(event).await
        } else {
            Ok(state)
        }
    }

    /// Fetch every feed concurrently and fold the results into the state.
    ///
    /// Failed feeds become unavailable; the next refresh retries them.
    #[tracing::instrument(name = "dashboard_refresh", skip(self))]
    pub async fn refresh(&self) -> Result<DashboardState> {
        let history_days = self.state.read().await.history_days;

        let (current, daily, hourly, history, alerts) = futures::join!(
            self.load_current(),
            self.load_daily(),
            self.load_hourly(),
            self.load_history(history_days),
            self.load_alerts(),
        );

        let mut state = self.state.write().await;
        let mut next = state.clone();
        for event in [current, daily, hourly, history, alerts] {
            next = next.apply(event)?;
        }
        *state = next.clone();

        info!("Dashboard refreshed");
        Ok(next)
    }

    async fn load_current(&self) -> DashboardEvent {
        match self.weather.current_conditions().await {
            Ok(data) => DashboardEvent::CurrentLoaded { data, at: Utc::now() },
            Err(e) => failed(FeedKind::Current, &e),
        }
    }

    async fn load_daily(&self) -> DashboardEvent {
        match self.weather.daily_forecast().await {
            Ok(data) => DashboardEvent::ForecastLoaded { data, at: Utc::now() },
            Err(e) => failed(FeedKind::Daily, &e),
        }
    }

    async fn load_hourly(&self) -> DashboardEvent {
        match self.weather.hourly_forecast().await {
            Ok(data) => DashboardEvent::HourlyLoaded { data, at: Utc::now() },
            Err(e) => failed(FeedKind::Hourly, &e),
        }
    }

    async fn load_history(&self, days: u32) -> DashboardEvent {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        match self.weather.history(days, today).await {
            Ok(data) => DashboardEvent::HistoryLoaded {
                days,
                data,
                at: Utc::now(),
            },
            Err(e) => {
                warn!("Failed to load {}-day history: {}", days, e);
                DashboardEvent::HistoryFailed {
                    days,
                    message: e.user_message(),
                }
            }
        }
    }

    async fn load_alerts(&self) -> DashboardEvent {
        match self.alerts.active_alerts(self.position).await {
            Ok(data) => DashboardEvent::AlertsLoaded { data, at: Utc::now() },
            Err(e) => failed(FeedKind::Alerts, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::models::Severity;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap()
    }

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            station_id: "KTXMINER45".to_string(),
            observed_at: at(),
            observed_local: "2026-10-19 10:00:00".to_string(),
            conditions: None,
            temperature_f: 72.5,
            heat_index_f: 72.5,
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
            uv_index: Some(3.0),
            solar_radiation: None,
        }
    }

    #[test]
    fn test_toggle_units_keeps_data() {
        let state = DashboardState::default()
            .apply(DashboardEvent::CurrentLoaded {
                data: conditions(),
                at: at(),
            })
            .unwrap();

        let toggled = state.apply(DashboardEvent::ToggleUnits).unwrap();
        assert_eq!(toggled.units, UnitSystem::Metric);
        assert_eq!(toggled.current, state.current);

        let back = toggled.apply(DashboardEvent::ToggleUnits).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_apply_leaves_previous_state_intact() {
        let state = DashboardState::default();
        let _ = state
            .apply(DashboardEvent::SelectTab { tab: Tab::Alerts })
            .unwrap();
        assert_eq!(state.tab, Tab::Current);
    }

    #[test]
    fn test_history_days_validation() {
        let state = DashboardState::default();
        assert!(state
            .apply(DashboardEvent::SelectHistoryDays { days: 0 })
            .is_err());
        assert!(state
            .apply(DashboardEvent::SelectHistoryDays { days: 31 })
            .is_err());

        let loaded = state
            .apply(DashboardEvent::HistoryLoaded {
                days: DEFAULT_HISTORY_DAYS,
                data: vec![],
                at: at(),
            })
            .unwrap();
        let same = loaded
            .apply(DashboardEvent::SelectHistoryDays {
                days: DEFAULT_HISTORY_DAYS,
            })
            .unwrap();
        assert!(same.history.data().is_some());

        let changed = loaded
            .apply(DashboardEvent::SelectHistoryDays { days: 14 })
            .unwrap();
        assert_eq!(changed.history_days, 14);
        assert!(changed.history.is_loading());
    }

    #[test]
    fn test_stale_history_is_ignored() {
        let state = DashboardState::default()
            .apply(DashboardEvent::SelectHistoryDays { days: 30 })
            .unwrap();
        let next = state
            .apply(DashboardEvent::HistoryLoaded {
                days: 3,
                data: vec![],
                at: at(),
            })
            .unwrap();
        assert!(next.history.is_loading());
    }

    #[test]
    fn test_stale_history_failure_is_ignored() {
        let state = DashboardState::default()
            .apply(DashboardEvent::SelectHistoryDays { days: 14 })
            .unwrap()
            .apply(DashboardEvent::HistoryLoaded {
                days: 14,
                data: vec![],
                at: at(),
            })
            .unwrap();

        let next = state
            .apply(DashboardEvent::HistoryFailed {
                days: DEFAULT_HISTORY_DAYS,
                message: "Data unavailable. Please try again later.".to_string(),
            })
            .unwrap();
        assert!(next.history.data().is_some());

        let failed = next
            .apply(DashboardEvent::HistoryFailed {
                days: 14,
                message: "Data unavailable. Please try again later.".to_string(),
            })
            .unwrap();
        assert!(failed.history.data().is_none());
        assert!(!failed.history.is_loading());
    }

    #[test]
    fn test_feed_failure_hides_old_data() {
        let state = DashboardState::default()
            .apply(DashboardEvent::CurrentLoaded {
                data: conditions(),
                at: at(),
            })
            .unwrap()
            .apply(DashboardEvent::FeedFailed {
                feed: FeedKind::Current,
                message: "Data unavailable. Please try again later.".to_string(),
            })
            .unwrap();

        assert!(state.current.data().is_none());
        let view = state.render(UnitSystem::Imperial);
        assert_eq!(
            view.current,
            Feed::Unavailable {
                message: "Data unavailable. Please try again later.".to_string()
            }
        );
    }

    #[test]
    fn test_render_follows_units() {
        let state = DashboardState::default()
            .apply(DashboardEvent::CurrentLoaded {
                data: conditions(),
                at: at(),
            })
            .unwrap();

        let imperial = state.render(UnitSystem::Imperial);
        let metric = state.render(UnitSystem::Metric);
        assert_eq!(imperial.current.data().unwrap().temperature, "72.5°F");
        assert_eq!(metric.current.data().unwrap().temperature, "22.5°C");
        assert_eq!(metric.toggle_label, "Switch to °F");
        assert_eq!(metric.history_day_choices, &[3, 7, 14, 30]);
        assert!(metric.forecast.is_loading());
    }

    #[test]
    fn test_user_events_from_json() {
        let event: DashboardEvent =
            serde_json::from_str(r#"{"type":"select_history_days","days":14}"#).unwrap();
        assert_eq!(event, DashboardEvent::SelectHistoryDays { days: 14 });
        assert!(event.is_user_event());

        let event: DashboardEvent = serde_json::from_str(r#"{"type":"toggle_units"}"#).unwrap();
        assert!(event.is_user_event());

        let event = DashboardEvent::FeedFailed {
            feed: FeedKind::Alerts,
            message: String::new(),
        };
        assert!(!event.is_user_event());
    }

    struct FakeWeather {
        fail_current: AtomicBool,
    }

    #[async_trait]
    impl WeatherSource for FakeWeather {
        async fn current_conditions(&self) -> Result<CurrentConditions> {
            if self.fail_current.load(Ordering::SeqCst) {
                return Err(StationError::api("down", ErrorCode::ApiNetworkError));
            }
            Ok(conditions())
        }

        async fn daily_forecast(&self) -> Result<Vec<DailyForecast>> {
            Ok(vec![])
        }

        async fn hourly_forecast(&self) -> Result<Vec<HourlyForecast>> {
            Ok(vec![])
        }

        async fn history_day(&self, date: NaiveDate) -> Result<Option<HistoricalDay>> {
            Ok(Some(HistoricalDay {
                date,
                high_f: 80.0,
                low_f: 60.0,
                humidity_avg: Some(50.0),
                precip_total_in: Some(0.0),
                wind_speed_avg_mph: Some(5.0),
            }))
        }
    }

    struct FakeAlerts;

    #[async_trait]
    impl AlertSource for FakeAlerts {
        async fn active_alerts(&self, _point: Coordinate) -> Result<Vec<Alert>> {
            Ok(vec![Alert {
                id: "1".to_string(),
                event: "Tornado Warning".to_string(),
                headline: "Tornado Warning".to_string(),
                description: String::new(),
                severity: Severity::Extreme,
                expires: None,
                url: String::new(),
            }])
        }
    }

    fn dashboard(fail_current: bool) -> Dashboard {
        Dashboard::new(
            Arc::new(FakeWeather {
                fail_current: AtomicBool::new(fail_current),
            }),
            Arc::new(FakeAlerts),
            Coordinate::new(32.7767, -96.7970).unwrap(),
            chrono_tz::America::Chicago,
        )
    }

    #[tokio::test]
    async fn test_refresh_loads_all_feeds() {
        let dashboard = dashboard(false);
        let state = dashboard.refresh().await.unwrap();

        assert!(state.current.data().is_some());
        assert!(state.daily.data().is_some());
        assert!(state.hourly.data().is_some());
        assert_eq!(state.history.data().unwrap().len(), 7);
        assert_eq!(state.alerts.data().unwrap().len(), 1);
        assert_eq!(dashboard.state().await, state);
    }

    #[tokio::test]
    async fn test_refresh_isolates_failures() {
        let dashboard = dashboard(true);
        let state = dashboard.refresh().await.unwrap();

        assert_eq!(
            state.current,
            Feed::Unavailable {
                message: "Data unavailable. Please try again later.".to_string()
            }
        );
        assert!(state.alerts.data().is_some());
    }

    #[tokio::test]
    async fn test_dispatch_loads_new_history_window() {
        let dashboard = dashboard(false);
        let state = dashboard
            .dispatch(DashboardEvent::SelectHistoryDays { days: 3 })
            .await
            .unwrap();
        assert_eq!(state.history_days, 3);
        assert_eq!(state.history.data().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_bad_window() {
        let dashboard = dashboard(false);
        let err = dashboard
            .dispatch(DashboardEvent::SelectHistoryDays { days: 45 })
            .await
            .unwrap_err();
        assert!(matches!(err, StationError::InvalidInput { .. }));
        assert_eq!(dashboard.state().await.history_days, DEFAULT_HISTORY_DAYS);
    }
}
