//! Byte-level timestamped store underneath [`FileCache`](crate::FileCache).
//!
//! Every write creates a new file named after the write time in nanoseconds
//! since the Unix epoch. Files are never rewritten in place:
//!
//! ```text
//! {dir}/
//! +-- example.com/
//! |   +-- 1718000000000000000
//! |   +-- 1718500000000000000   # latest, wins on lookup
//! +-- example.org/
//!     +-- 1718200000000000000
//! ```
//!
//! Freshness is decided from the newest parseable file name only. Entries
//! whose names are not base-10 integers are ignored by lookups and sweeps.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::CacheError;
use crate::clock::{Clock, from_nanos, to_nanos};

/// Counters from an expiry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Cache files inspected.
    pub scanned: usize,
    /// Expired files removed.
    pub removed: usize,
    /// Files or directories that could not be read or removed.
    pub failed: usize,
}

pub(crate) struct TimestampStore {
    dir: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    last_issued: AtomicU64,
}

impl TimestampStore {
    pub(crate) fn new(dir: PathBuf, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir,
            ttl,
            clock,
            last_issued: AtomicU64::new(0),
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn ttl(&self) -> Duration {
        self.ttl
    }

    pub(crate) fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub(crate) fn key_dir(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    /// Whether a file written at `timestamp` is stale at `now`.
    ///
    /// A zero TTL never expires. Files from the future count as fresh.
    fn is_expired(&self, timestamp: u64, now: SystemTime) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let age = now
            .duration_since(from_nanos(timestamp))
            .unwrap_or(Duration::ZERO);
        age >= self.ttl
    }

    /// Path of the newest non-expired file for `key`, if any.
    pub(crate) fn latest(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
        let key_dir = self.key_dir(key)?;
        let entries = match fs::read_dir(&key_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&key_dir, e)),
        };

        let mut newest: Option<u64> = None;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&key_dir, e))?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let Some(ts) = parse_timestamp(&entry.file_name()) else {
                continue;
            };
            newest = Some(newest.map_or(ts, |current| current.max(ts)));
        }

        let Some(ts) = newest else {
            return Ok(None);
        };
        if self.is_expired(ts, self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(key_dir.join(ts.to_string())))
    }

    /// Write `data` as a new file for `key` and return its path.
    pub(crate) fn write(&self, key: &str, data: &[u8]) -> Result<PathBuf, CacheError> {
        let key_dir = self.key_dir(key)?;
        fs::create_dir_all(&key_dir).map_err(|e| CacheError::io(&key_dir, e))?;

        loop {
            let path = key_dir.join(self.next_timestamp().to_string());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(data) {
                        // A truncated file would shadow older valid entries
                        let _ = fs::remove_file(&path);
                        return Err(CacheError::io(&path, e));
                    }
                    return Ok(path);
                }
                // Name taken by another writer, move past it
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(CacheError::io(&path, e)),
            }
        }
    }

    /// Next timestamp, strictly greater than any issued by this store.
    fn next_timestamp(&self) -> u64 {
        let now = to_nanos(self.clock.now());
        let bump = |last: u64| now.max(last.saturating_add(1));
        let previous = self
            .last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        bump(previous)
    }

    /// Delete every file older than the TTL. No-op for a zero TTL.
    pub(crate) fn sweep(&self) -> Result<SweepReport, CacheError> {
        let mut report = SweepReport::default();
        if self.ttl.is_zero() {
            return Ok(report);
        }

        let keys = match fs::read_dir(&self.dir) {
            Ok(keys) => keys,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let now = self.clock.now();
        for key_entry in keys {
            let key_entry = key_entry.map_err(|e| CacheError::io(&self.dir, e))?;
            if !key_entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }

            let key_dir = key_entry.path();
            let files = match fs::read_dir(&key_dir) {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!("failed to read cache directory {}: {e}", key_dir.display());
                    report.failed += 1;
                    continue;
                }
            };

            for file in files.filter_map(Result::ok) {
                if !file.file_type().is_ok_and(|t| t.is_file()) {
                    continue;
                }
                let Some(ts) = parse_timestamp(&file.file_name()) else {
                    continue;
                };
                report.scanned += 1;
                if !self.is_expired(ts, now) {
                    continue;
                }

                let path = file.path();
                match fs::remove_file(&path) {
                    Ok(()) => report.removed += 1,
                    Err(e) => {
                        tracing::warn!("failed to remove expired {}: {e}", path.display());
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::debug!(
            dir = %self.dir.display(),
            scanned = report.scanned,
            removed = report.removed,
            failed = report.failed,
            "cache sweep finished"
        );
        Ok(report)
    }
}

/// Parse a cache file name as a base-10 timestamp.
pub(crate) fn parse_timestamp(name: &OsStr) -> Option<u64> {
    let name = name.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Keys become directory names, so they must be a single path component.
fn validate_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_owned()))
    }
}
