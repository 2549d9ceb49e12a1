//! JSON file store: freshness gate, atomic writer and reader.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use super::key::{CacheKey, EntityKind};
use crate::Error;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Age of a cache entry relative to the freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never written.
    Missing,
    /// Written longer ago than the freshness window.
    Expired { age: Duration },
    Fresh { age: Duration },
}

impl Freshness {
    /// Missing and expired entries both have to be refetched.
    pub fn is_stale(&self) -> bool {
        !matches!(self, Freshness::Fresh { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Freshness::Missing => "missing",
            Freshness::Expired { .. } => "expired",
            Freshness::Fresh { .. } => "fresh",
        }
    }
}

/// A cached value with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

/// One JSON file per cache key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    ttl: Duration,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheWrite` if the directories cannot be created.
    pub async fn open(root: impl Into<PathBuf>, ttl: Duration) -> Result<Self, Error> {
        let root = root.into();
        for dir in [EntityKind::Product, EntityKind::Pattern, EntityKind::Reviews].iter().filter_map(|k| k.dir()) {
            let path = root.join(dir);
            tokio::fs::create_dir_all(&path).await.map_err(|e| Error::cache_write(&path, e))?;
        }
        tracing::debug!(root = %root.display(), ttl_secs = ttl.as_secs(), "Opened cache store");
        Ok(Self { root, ttl })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Absolute path of the file backing `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Check the entry's age from file metadata only.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheRead` if the metadata exists but cannot be read.
    pub async fn freshness(&self, key: &CacheKey) -> Result<Freshness, Error> {
        let path = self.path_for(key);
        let modified = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified().map_err(|e| Error::cache_read(&path, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Freshness::Missing),
            Err(e) => return Err(Error::cache_read(&path, e)),
        };

        // A clock step backwards makes the file look newer than now; treat it as fresh.
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > self.ttl { Ok(Freshness::Expired { age }) } else { Ok(Freshness::Fresh { age }) }
    }

    /// True when the entry is absent or older than the freshness window.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheRead` if the metadata cannot be read.
    pub async fn is_stale(&self, key: &CacheKey) -> Result<bool, Error> {
        Ok(self.freshness(key).await?.is_stale())
    }

    /// Replace the entry for `key` with `value`.
    ///
    /// The JSON is written to a temporary sibling and renamed over the target,
    /// so readers see either the old entry or the new one.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheWrite` on serialization or filesystem failure.
    pub async fn write<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<(), Error> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| Error::cache_write(&path, e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Error::cache_write(parent, e))?;
        }

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("entry.json");
        let tmp = path.with_file_name(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::cache_write(&path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::cache_write(&path, e));
        }

        tracing::debug!(key = %key, bytes = bytes.len(), "Wrote cache entry");
        Ok(())
    }

    /// Read and decode the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheRead` if the file cannot be read or decoded.
    pub async fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, Error> {
        Ok(self.read_entry(key).await?.map(|entry| entry.value))
    }

    /// Read the entry for `key` together with its write time.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheRead` if the file cannot be read or decoded.
    pub async fn read_entry<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CachedEntry<T>>, Error> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::cache_read(&path, e)),
        };

        let cached_at = tokio::fs::metadata(&path)
            .await
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .map_err(|e| Error::cache_read(&path, e))?;

        let value = serde_json::from_slice(&bytes).map_err(|e| Error::cache_read(&path, e))?;
        Ok(Some(CachedEntry { value, cached_at }))
    }

    /// Delete the entry for `key`. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheWrite` if an existing file cannot be removed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::cache_write(&path, e)),
        }
    }

    /// File stems stored for a per-id kind, sorted.
    ///
    /// Hashed ids come back as their digest.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheRead` if the directory cannot be listed.
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<String>, Error> {
        let Some(dir) = kind.dir() else {
            return Ok(Vec::new());
        };
        let path = self.root.join(dir);

        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::cache_read(&path, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::cache_read(&path, e))? {
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".json"))
                && !id.starts_with('.')
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
