//! Timestamped file cache for microb engines.
//!
//! Every engine stores the raw result of each fetch as a JSON file under
//! `{root}/{service}/{key}/{timestamp}`. This crate owns that layout:
//!
//! - [`CacheProvider`]: lookup/write interface used by the pipeline
//! - [`FileCache`]: file-based implementation with TTL-aware lookups
//! - [`NullCache`]: no-op implementation (always misses)
//! - [`reader`]: fail-fast walk over every stored file for bulk import
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use microb_cache::{CacheProvider, FileCache};
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let cache: FileCache<Vec<String>> =
//!     FileCache::for_service(tmp.path(), "web_archive", Duration::from_secs(3600));
//!
//! cache.add_to_cache("example.com", &vec!["http://example.com/".to_owned()]).unwrap();
//! assert!(cache.has_cached("example.com").unwrap());
//! ```

mod clock;
mod error;
mod file;
pub mod reader;
mod store;

use std::time::Duration;

#[cfg(feature = "mock")]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use error::CacheError;
pub use file::FileCache;
pub use reader::{CacheRecord, for_each_record};
pub use store::SweepReport;

/// One day.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Seven days.
pub const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Thirty days.
pub const MONTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Three hundred sixty-five days.
pub const YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache of fetch results of type `T`, keyed by normalized input.
///
/// Implementations must be safe to share between worker threads.
pub trait CacheProvider<T>: Send + Sync {
    /// Whether a fresh entry exists for `key`.
    ///
    /// A missing key is `Ok(false)`, not an error.
    fn has_cached(&self, key: &str) -> Result<bool, CacheError>;

    /// Return the newest fresh entry for `key`.
    ///
    /// Returns [`CacheError::NotFound`] on a miss and
    /// [`CacheError::Deserialize`] if the stored data no longer decodes.
    fn get_from_cache(&self, key: &str) -> Result<T, CacheError>;

    /// Store a new entry for `key`. Existing entries are never modified.
    fn add_to_cache(&self, key: &str, value: &T) -> Result<(), CacheError>;
}

/// No-op [`CacheProvider`] that never stores or retrieves data.
///
/// Use when caching is disabled. Every lookup misses; every write is
/// discarded.
pub struct NullCache;

impl<T> CacheProvider<T> for NullCache {
    fn has_cached(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn get_from_cache(&self, key: &str) -> Result<T, CacheError> {
        Err(CacheError::NotFound {
            key: key.to_owned(),
        })
    }

    fn add_to_cache(&self, _key: &str, _value: &T) -> Result<(), CacheError> {
        Ok(())
    }
}
