//! Active weather alerts for the station's position

use async_trait::async_trait;

use crate::Result;
use crate::cache::ResponseCache;
use crate::models::{Alert, Coordinate};
use crate::weather::cached::read_through;

pub mod nws;

pub use nws::NwsClient;

#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Alerts currently in effect at `point`, most severe first.
    async fn active_alerts(&self, point: Coordinate) -> Result<Vec<Alert>>;
}

/// Wraps an [`AlertSource`] with the persistent response cache.
pub struct CachedAlertSource<S> {
    inner: S,
    cache: ResponseCache,
    ttl: std::time::Duration,
}

impl<S: AlertSource> CachedAlertSource<S> {
    pub fn new(inner: S, cache: ResponseCache, ttl: std::time::Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<S: AlertSource> AlertSource for CachedAlertSource<S> {
    async fn active_alerts(&self, point: Coordinate) -> Result<Vec<Alert>> {
        let key = format!("alerts:{}", point.format_coordinates());
        read_through(&self.cache, &key, Some(self.ttl), || {
            self.inner.active_alerts(point)
        })
        .await
    }
}
