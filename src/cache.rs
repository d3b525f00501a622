use anyhow::{Result, anyhow};
use fjall::Keyspace;
use rand::RngExt;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Upstream responses keyed by request, each with its own time-to-live.
#[derive(Clone)]
pub struct ResponseCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

/// Spread `ttl` by ±10% so entries written together do not expire together.
#[must_use]
pub fn jittered(ttl: Duration) -> Duration {
    let jitter: f64 = rand::rng().random_range(0.9..1.1);
    ttl.mul_f64(jitter)
}

impl ResponseCache {
    /// Opens (or creates) the cache database under `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("responses", fjall::KeyspaceCreateOptions::default)?;
        Ok(ResponseCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoricalDay;
    use chrono::NaiveDate;

    fn sample_day() -> HistoricalDay {
        HistoricalDay {
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            high_f: 84.0,
            low_f: 66.0,
            humidity_avg: Some(58.0),
            precip_total_in: Some(0.12),
            wind_speed_avg_mph: Some(6.4),
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path()).unwrap();

        cache
            .put("history:2026-10-18", sample_day(), Duration::from_secs(60))
            .await
            .unwrap();

        let cached: Option<HistoricalDay> = cache.get("history:2026-10-18").await.unwrap();
        assert_eq!(cached, Some(sample_day()));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path()).unwrap();

        let cached: Option<String> = cache.get("nope").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path()).unwrap();

        cache
            .put("alerts", "stale".to_string(), Duration::ZERO)
            .await
            .unwrap();

        let cached: Option<String> = cache.get("alerts").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path()).unwrap();

        cache
            .put("k", 7u32, Duration::from_secs(60))
            .await
            .unwrap();
        cache.remove("k").await.unwrap();

        let cached: Option<u32> = cache.get("k").await.unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_jitter_bounds() {
        let ttl = Duration::from_secs(600);
        for _ in 0..100 {
            let j = jittered(ttl);
            assert!(j >= Duration::from_secs(540) && j <= Duration::from_secs(660));
        }
    }
}
