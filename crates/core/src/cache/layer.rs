//! Cache layer that orchestrates caching logic with storefront fetching.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use super::key::CacheKey;
use super::store::{FileStore, Freshness};
use crate::Error;

/// Where a served value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Fresh entry served from disk.
    Cache,
    /// Fetched from the storefront and written to disk.
    Network,
    /// Expired entry served because the refetch failed.
    Stale,
}

/// A served value plus its provenance.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
    pub data: T,
    pub source: CacheSource,
    pub cached_at: DateTime<Utc>,
}

impl<T> CacheResult<T> {
    fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, source: CacheSource::Cache, cached_at }
    }

    fn from_network(data: T) -> Self {
        Self { data, source: CacheSource::Network, cached_at: Utc::now() }
    }

    fn stale(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, source: CacheSource::Stale, cached_at }
    }

    pub fn is_stale(&self) -> bool {
        self.source == CacheSource::Stale
    }
}

type KeyLocks = Arc<Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>>;

/// Cache-aside layer over a [`FileStore`].
///
/// Fresh entries are served from disk. Stale entries are refetched, written,
/// then served. Concurrent callers for the same key wait on a per-key lock so
/// one fetch satisfies all of them.
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<FileStore>,
    serve_stale_on_error: bool,
    in_flight: KeyLocks,
}

impl CacheLayer {
    pub fn new(store: FileStore) -> Self {
        Self { store: Arc::new(store), serve_stale_on_error: true, in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Serve an expired entry when the refetch fails (default: on).
    pub fn with_serve_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Fetch-or-serve for one cache key.
    ///
    /// 1. Fresh entry: serve it without calling `fetcher`
    /// 2. Missing or expired: call `fetcher`, write the result, serve it
    /// 3. Fetch failed on an expired entry: serve the stale entry if allowed
    /// 4. Fetch failed on a missing entry: propagate the fetch error
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error when no stale entry may be served, or
    /// `Error::CacheWrite` if the fetched value cannot be persisted.
    pub async fn fetch_or_serve<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<CacheResult<T>, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Some(hit) = self.serve_fresh(key).await? {
            return Ok(hit);
        }

        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;

            // Another caller may have refreshed the entry while we waited.
            match self.serve_fresh(key).await {
                Ok(Some(hit)) => Ok(hit),
                Ok(None) => self.fetch_and_write(key, fetcher).await,
                Err(e) => Err(e),
            }
        };
        self.release_key_lock(key, lock).await;
        result
    }

    /// Fetch unconditionally and replace the entry.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error or `Error::CacheWrite`. Stale entries are
    /// never served from here.
    pub async fn refresh<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<CacheResult<T>, Error>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            tracing::info!(key = %key, "Refreshing cache entry");
            match fetcher().await {
                Ok(data) => self.store.write(key, &data).await.map(|()| CacheResult::from_network(data)),
                Err(e) => Err(e),
            }
        };
        self.release_key_lock(key, lock).await;
        result
    }

    async fn serve_fresh<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CacheResult<T>>, Error> {
        let freshness = self.store.freshness(key).await?;
        if freshness.is_stale() {
            tracing::debug!(key = %key, state = freshness.label(), "Cache miss");
            return Ok(None);
        }

        match self.store.read_entry(key).await {
            Ok(Some(entry)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(Some(CacheResult::from_cache(entry.value, entry.cached_at)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Unreadable cache entry, refetching");
                Ok(None)
            }
        }
    }

    async fn fetch_and_write<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<CacheResult<T>, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match fetcher().await {
            Ok(data) => {
                self.store.write(key, &data).await?;
                tracing::info!(key = %key, "Cached fresh entry");
                Ok(CacheResult::from_network(data))
            }
            Err(fetch_err) => {
                if !self.serve_stale_on_error {
                    return Err(fetch_err);
                }
                if !matches!(self.store.freshness(key).await, Ok(Freshness::Expired { .. })) {
                    return Err(fetch_err);
                }
                match self.store.read_entry::<T>(key).await {
                    Ok(Some(entry)) => {
                        tracing::warn!(key = %key, error = %fetch_err, "Fetch failed, serving stale entry");
                        Ok(CacheResult::stale(entry.value, entry.cached_at))
                    }
                    _ => Err(fetch_err),
                }
            }
        }
    }

    async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Drop the map entry once no other caller holds the key lock.
    async fn release_key_lock(&self, key: &CacheKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.in_flight.lock().await;
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(key);
        }
    }
}
