//! Logging and trace export
//!
//! Console output always goes through tracing-subscriber. When an OTLP
//! endpoint is configured, spans and log events are also shipped to the
//! collector over OTLP/HTTP.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::LoggingConfig;

const SERVICE_NAME: &str = "shackboard";

/// Crates whose own logging would otherwise feed back into the exporter
const QUIET_TARGETS: &str = "hyper=warn,h2=warn,reqwest=warn,opentelemetry=warn,fjall=warn";

type Filtered = Layered<EnvFilter, Registry>;

/// Flushes and shuts down the exporters when dropped.
#[must_use = "dropping the guard stops trace export"]
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down trace exporter: {e}");
            }
        }
        if let Some(provider) = self.logger_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down log exporter: {e}");
            }
        }
    }
}

/// Build the filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(format!("{},{QUIET_TARGETS}", config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))
}

fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_attribute(KeyValue::new("service.version", crate::VERSION))
        .build()
}

/// OTLP/HTTP uses one path per signal under the collector base URL
fn signal_endpoint(base: &str, signal: &str) -> String {
    format!("{}/v1/{signal}", base.trim_end_matches('/'))
}

/// Install the global subscriber.
///
/// # Errors
/// Fails on an invalid filter, an exporter that cannot be built, or when a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let mut layers: Vec<Box<dyn Layer<Filtered> + Send + Sync>> = Vec::new();

    layers.push(match config.format.as_str() {
        "json" => fmt::layer().json().with_current_span(true).boxed(),
        _ => fmt::layer().with_target(false).boxed(),
    });

    let mut guard = TelemetryGuard::default();

    if let Some(endpoint) = &config.otlp_endpoint {
        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "traces"))
            .build()
            .context("Failed to build OTLP span exporter")?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .with_resource(resource())
            .build();
        let tracer = tracer_provider.tracer(SERVICE_NAME);
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());

        let log_exporter = LogExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "logs"))
            .build()
            .context("Failed to build OTLP log exporter")?;

        let logger_provider = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .with_resource(resource())
            .build();
        layers.push(OpenTelemetryTracingBridge::new(&logger_provider).boxed());

        guard.tracer_provider = Some(tracer_provider);
        guard.logger_provider = Some(logger_provider);
    }

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!("Exporting telemetry to {}", endpoint);
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_endpoint() {
        assert_eq!(
            signal_endpoint("http://localhost:4318/", "traces"),
            "http://localhost:4318/v1/traces"
        );
        assert_eq!(
            signal_endpoint("http://collector:4318", "logs"),
            "http://collector:4318/v1/logs"
        );
    }

    #[test]
    fn test_env_filter_from_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..LoggingConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }
}
