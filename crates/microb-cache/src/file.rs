//! File-based cache implementation.
//!
//! [`FileCache`] keeps one JSON document per fetch, organized as
//! `{root}/{service}/{key}/{timestamp}`. Lookups return the newest document
//! for a key as long as it is younger than the TTL. Older documents stay on
//! disk as history until [`FileCache::clean_expired`] removes them, so the
//! [`reader`](crate::reader) can replay every past fetch.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::clock::{Clock, SystemClock};
use crate::store::{SweepReport, TimestampStore};
use crate::{CacheError, CacheProvider};

/// File-based [`CacheProvider`] for values of type `T`.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- crt_sh/                  # service directory, see `for_service`
///     +-- example.com/         # key directory, created on first write
///     |   +-- 1718000000000000000
///     |   +-- 1718500000000000000
///     +-- example.org/
///         +-- 1718200000000000000
/// ```
pub struct FileCache<T> {
    store: TimestampStore,
    _value: PhantomData<fn() -> T>,
}

impl<T> FileCache<T> {
    /// Create a cache rooted at `dir` with the given TTL.
    ///
    /// A zero TTL means entries never expire. Nothing is created on disk
    /// until the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            store: TimestampStore::new(dir.into(), ttl, Arc::new(SystemClock)),
            _value: PhantomData,
        }
    }

    /// Create the cache for a named service under a shared cache root.
    #[must_use]
    pub fn for_service(cache_root: &Path, service: &str, ttl: Duration) -> Self {
        Self::new(cache_root.join(service), ttl)
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.store.set_clock(clock);
        self
    }

    /// Service directory holding all key directories.
    pub fn dir(&self) -> &Path {
        self.store.dir()
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.store.ttl()
    }

    /// Remove every cache file older than the TTL.
    ///
    /// Does nothing when the TTL is zero. Individual delete failures are
    /// logged and counted in the report; the sweep carries on.
    pub fn clean_expired(&self) -> Result<SweepReport, CacheError> {
        self.store.sweep()
    }

    /// Path of the newest fresh file for `key`.
    pub fn latest_path(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
        self.store.latest(key)
    }
}

impl<T> CacheProvider<T> for FileCache<T>
where
    T: Serialize + DeserializeOwned,
{
    fn has_cached(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.store.latest(key)?.is_some())
    }

    fn get_from_cache(&self, key: &str) -> Result<T, CacheError> {
        let path = self
            .store
            .latest(key)?
            .ok_or_else(|| CacheError::NotFound {
                key: key.to_owned(),
            })?;
        let data = fs::read(&path).map_err(|e| CacheError::io(&path, e))?;
        serde_json::from_slice(&data).map_err(|source| CacheError::Deserialize { path, source })
    }

    fn add_to_cache(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let data = serde_json::to_vec(value).map_err(|source| CacheError::Serialize {
            key: key.to_owned(),
            source,
        })?;
        let path = self.store.write(key, &data)?;
        tracing::debug!("cached {key} at {}", path.display());
        Ok(())
    }
}
