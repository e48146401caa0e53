//! Cache-backed JSON fetch helpers
//!
//! Small upstream lookups (exchange rates, weather) are fetched as JSON and
//! reused for a fixed TTL instead of hitting the provider on every call.

mod entry;

pub use entry::{CachedEntry, TtlCache};

use crate::config::{CacheConfig, MAX_CACHE_TTL_SECONDS};
use crate::storage::StorageError;
use crate::HarvestError;
use chrono::Duration;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// Where a returned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from a fresh cache entry
    Hit,
    /// No entry existed; fetched from upstream
    Miss,
    /// A stale entry existed, or a refresh was forced; fetched from upstream
    Refreshed,
}

/// GETs JSON documents and caches them by key
pub struct CachedJsonFetcher {
    client: Client,
    cache: Mutex<TtlCache<Value>>,
}

impl CachedJsonFetcher {
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self {
            client,
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    pub fn from_config(config: &CacheConfig, client: Client) -> Self {
        let seconds = config.ttl_seconds.min(MAX_CACHE_TTL_SECONDS) as i64;
        Self::new(client, Duration::seconds(seconds))
    }

    /// Returns the document cached under `key`, fetching `url` when the entry
    /// is missing, stale, or `force_refresh` is set
    ///
    /// A failed fetch leaves any existing entry untouched.
    pub async fn get(
        &self,
        key: &str,
        url: &str,
        force_refresh: bool,
    ) -> Result<(Value, CacheStatus), HarvestError> {
        let existed = {
            let cache = self.lock_cache()?;
            if !force_refresh {
                if let Some(value) = cache.get_fresh(key) {
                    tracing::debug!("Cache hit for {}", key);
                    return Ok((value, CacheStatus::Hit));
                }
            }
            cache.contains(key)
        };

        let value = self.fetch_json(url).await?;
        self.lock_cache()?.insert(key, value.clone());

        let status = if existed || force_refresh {
            CacheStatus::Refreshed
        } else {
            CacheStatus::Miss
        };
        tracing::info!("Cached {} from {} ({:?})", key, url, status);

        Ok((value, status))
    }

    pub fn invalidate(&self, key: &str) -> Result<bool, HarvestError> {
        Ok(self.lock_cache()?.invalidate(key))
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, TtlCache<Value>>, HarvestError> {
        self.cache
            .lock()
            .map_err(|_| HarvestError::Storage(StorageError::LockPoisoned))
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, HarvestError> {
        let http_err = |source| HarvestError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Upstream returned {} for {}", status, url);
            return Err(HarvestError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.json().await.map_err(http_err)
    }
}
