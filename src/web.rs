use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Dashboard events are tiny JSON objects
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;
    let app = app(
        state,
        Duration::from_secs(config.request_timeout_seconds.into()),
    );

    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (&config.tls_cert, &config.tls_key) {
        let tls = tls::load(cert, key).await?;
        tracing::info!("Web server running at https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await
            .context("HTTPS server failed")?;
        return Ok(());
    }

    #[cfg(not(feature = "tls"))]
    if config.tls_cert.is_some() {
        tracing::warn!("TLS certificate configured but built without the tls feature; serving HTTP");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

#[cfg(feature = "tls")]
mod tls {
    use std::path::Path;

    use anyhow::{Context, Result, anyhow};
    use axum_server::tls_rustls::RustlsConfig;

    /// Read a PEM certificate chain and private key into a server config.
    pub async fn load(cert: &Path, key: &Path) -> Result<RustlsConfig> {
        // Only the first provider install wins; later calls are no-ops
        let _ = rustls::crypto::ring::default_provider().install_default();

        let cert_pem = std::fs::read(cert)
            .with_context(|| format!("Failed to read certificate {}", cert.display()))?;
        let key_pem = std::fs::read(key)
            .with_context(|| format!("Failed to read private key {}", key.display()))?;

        let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
            .map(|c| c.map(|c| c.to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid certificate PEM in {}", cert.display()))?;
        if certs.is_empty() {
            return Err(anyhow!("No certificates found in {}", cert.display()));
        }

        let private_key = rustls_pemfile::private_key(&mut key_pem.as_slice())
            .with_context(|| format!("Invalid private key PEM in {}", key.display()))?
            .ok_or_else(|| anyhow!("No private key found in {}", key.display()))?;

        RustlsConfig::from_der(certs, private_key.secret_der().to_vec())
            .await
            .context("Failed to build TLS configuration")
    }
}
