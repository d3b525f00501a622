//! Configuration management for the shackboard service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::StationError;
use crate::models::Coordinate;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the shackboard service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationConfig {
    /// The station being displayed
    #[serde(default)]
    pub station: StationSettings,
    /// Weather Company PWS API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Callsign directory configuration
    #[serde(default)]
    pub callsign: CallsignConfig,
    /// NWS alerts configuration
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Identity and position of the station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSettings {
    /// Operator callsign shown in the header
    #[serde(default = "default_callsign")]
    pub callsign: String,
    /// Station latitude in decimal degrees
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// Station longitude in decimal degrees
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// IANA timezone for the local clock
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Weather Company API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather Company API key
    pub api_key: Option<String>,
    /// Personal weather station identifier
    #[serde(default = "default_station_id")]
    pub station_id: String,
    /// Base URL for the API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Number of forecast days to show
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    /// Number of forecast hours to show
    #[serde(default = "default_hourly_hours")]
    pub hourly_hours: u32,
}

/// Callsign directory (QRZ XML) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallsignConfig {
    /// Base URL of the XML interface
    #[serde(default = "default_callsign_base_url")]
    pub base_url: String,
    /// Session key issued by the directory
    pub session_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// NWS alerts settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Base URL of api.weather.gov
    #[serde(default = "default_alerts_base_url")]
    pub base_url: String,
    /// User-Agent sent to the NWS, which requires contact information
    #[serde(default = "default_alerts_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Current-conditions TTL in minutes
    #[serde(default = "default_current_ttl")]
    pub current_ttl_minutes: u32,
    /// Forecast TTL in minutes
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_minutes: u32,
    /// Alerts TTL in minutes
    #[serde(default = "default_alerts_ttl")]
    pub alerts_ttl_minutes: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; export is disabled when unset
    pub otlp_endpoint: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// PEM certificate chain; HTTPS is served when both cert and key are set
    pub tls_cert: Option<PathBuf>,
    /// PEM private key
    pub tls_key: Option<PathBuf>,
}

// Default value functions
fn default_callsign() -> String {
    "KJ5IRQ".to_string()
}

fn default_latitude() -> f64 {
    32.7767
}

fn default_longitude() -> f64 {
    -96.7970
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_station_id() -> String {
    "KTXMINER45".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.weather.com".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_forecast_days() -> u32 {
    5
}

fn default_hourly_hours() -> u32 {
    24
}

fn default_callsign_base_url() -> String {
    "https://xmldata.qrz.com/xml/current/".to_string()
}

fn default_alerts_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_alerts_user_agent() -> String {
    format!("shackboard/{} ({})", crate::VERSION, default_callsign())
}

fn default_current_ttl() -> u32 {
    5
}

fn default_forecast_ttl() -> u32 {
    30
}

fn default_alerts_ttl() -> u32 {
    2
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("shackboard"))
        .unwrap_or_else(|| PathBuf::from(".cache/shackboard"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u32 {
    60
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            callsign: default_callsign(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            timezone: default_timezone(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            station_id: default_station_id(),
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            forecast_days: default_forecast_days(),
            hourly_hours: default_hourly_hours(),
        }
    }
}

impl Default for CallsignConfig {
    fn default() -> Self {
        Self {
            base_url: default_callsign_base_url(),
            session_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            base_url: default_alerts_base_url(),
            user_agent: default_alerts_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_ttl_minutes: default_current_ttl(),
            forecast_ttl_minutes: default_forecast_ttl(),
            alerts_ttl_minutes: default_alerts_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl StationConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("SHACKBOARD_CONFIG").map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from the given path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SHACKBOARD__WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("SHACKBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: StationConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shackboard").join("config.toml"))
    }

    /// Apply default values to fields left empty or zero
    pub fn apply_defaults(&mut self) {
        if self.station.callsign.trim().is_empty() {
            self.station.callsign = default_callsign();
        }
        if self.station.timezone.is_empty() {
            self.station.timezone = default_timezone();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.weather.forecast_days == 0 {
            self.weather.forecast_days = default_forecast_days();
        }
        if self.weather.hourly_hours == 0 {
            self.weather.hourly_hours = default_hourly_hours();
        }
        if self.callsign.base_url.is_empty() {
            self.callsign.base_url = default_callsign_base_url();
        }
        if self.alerts.base_url.is_empty() {
            self.alerts.base_url = default_alerts_base_url();
        }
        if self.alerts.user_agent.is_empty() {
            self.alerts.user_agent = default_alerts_user_agent();
        }
        if self.cache.current_ttl_minutes == 0 {
            self.cache.current_ttl_minutes = default_current_ttl();
        }
        if self.cache.forecast_ttl_minutes == 0 {
            self.cache.forecast_ttl_minutes = default_forecast_ttl();
        }
        if self.cache.alerts_ttl_minutes == 0 {
            self.cache.alerts_ttl_minutes = default_alerts_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        self.station.callsign = self.station.callsign.trim().to_ascii_uppercase();
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_station()?;
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Station coordinates as a validated [`Coordinate`]
    pub fn coordinate(&self) -> crate::Result<Coordinate> {
        Coordinate::new(self.station.latitude, self.station.longitude)
    }

    /// Parsed station timezone
    pub fn timezone(&self) -> crate::Result<Tz> {
        self.station.timezone.parse::<Tz>().map_err(|_| {
            StationError::config(format!(
                "Unknown timezone '{}'. Use an IANA name such as America/Chicago.",
                self.station.timezone
            ))
        })
    }

    fn validate_station(&self) -> Result<()> {
        self.coordinate()
            .map_err(|e| StationError::config(format!("Station position is invalid: {e}")))?;
        self.timezone()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is optional at startup; the weather source reports it missing on use
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(StationError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(StationError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(StationError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        if let Some(session_key) = &self.callsign.session_key {
            if session_key.trim().is_empty() {
                return Err(StationError::config(
                    "Callsign session key cannot be empty if provided."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Weather API", self.weather.timeout_seconds),
            ("Callsign API", self.callsign.timeout_seconds),
            ("Alerts API", self.alerts.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(StationError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.weather.max_retries > 10 {
            return Err(StationError::config(
                "Weather API max retries cannot exceed 10"
            ).into());
        }

        if self.weather.forecast_days > 5 {
            return Err(StationError::config(
                "Forecast days cannot exceed 5"
            ).into());
        }

        if self.weather.hourly_hours > 48 {
            return Err(StationError::config(
                "Hourly forecast cannot exceed 48 hours"
            ).into());
        }

        for (name, ttl) in [
            ("Current conditions", self.cache.current_ttl_minutes),
            ("Forecast", self.cache.forecast_ttl_minutes),
            ("Alerts", self.cache.alerts_ttl_minutes),
        ] {
            if ttl > 24 * 60 {
                return Err(StationError::config(format!(
                    "{name} cache TTL cannot exceed 1440 minutes (1 day)"
                ))
                .into());
            }
        }

        if self.server.port == 0 {
            return Err(StationError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(StationError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(StationError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        for (name, url) in [
            ("Weather API base URL", &self.weather.base_url),
            ("Callsign API base URL", &self.callsign.base_url),
            ("Alerts API base URL", &self.alerts.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(StationError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(StationError::config(
                    "OTLP endpoint must be a valid HTTP or HTTPS URL"
                ).into());
            }
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(StationError::config(
                "TLS needs both server.tls_cert and server.tls_key"
            ).into());
        }

        Ok(())
    }
}
