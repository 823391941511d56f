//! Offline walk over every historical cache file of a service.
//!
//! Used by bulk importers. Unlike the online lookup path, the walk is
//! fail-fast: the first traversal error, unparseable file name or error
//! returned by the callback stops the walk and is returned to the caller.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::de::DeserializeOwned;

use crate::CacheError;
use crate::clock::from_nanos;
use crate::store::parse_timestamp;

/// One cache file: the key it belongs to, when it was written, and a lazy
/// handle to its payload.
#[derive(Debug)]
pub struct CacheRecord<T> {
    key: String,
    timestamp_nanos: u64,
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> CacheRecord<T> {
    /// Cache key (the key directory name).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write time of the file.
    pub fn timestamp(&self) -> SystemTime {
        from_nanos(self.timestamp_nanos)
    }

    /// Write time in nanoseconds since the Unix epoch (the file name).
    pub fn timestamp_nanos(&self) -> u64 {
        self.timestamp_nanos
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: DeserializeOwned> CacheRecord<T> {
    /// Read and decode the payload.
    pub fn read(&self) -> Result<T, CacheError> {
        let data = fs::read(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        serde_json::from_slice(&data).map_err(|source| CacheError::Deserialize {
            path: self.path.clone(),
            source,
        })
    }
}

/// Call `process` once for every cache file below `service_dir`.
///
/// Order follows directory enumeration and is not sorted. Non-directory
/// entries at the key level and directories at the file level are skipped.
///
/// # Errors
///
/// Returns the first error from reading directories, parsing a file name as a
/// timestamp, or from `process`.
pub fn for_each_record<T, E, F>(service_dir: &Path, mut process: F) -> Result<(), E>
where
    E: From<CacheError>,
    F: FnMut(CacheRecord<T>) -> Result<(), E>,
{
    let keys = fs::read_dir(service_dir).map_err(|e| CacheError::io(service_dir, e))?;

    for key_entry in keys {
        let key_entry = key_entry.map_err(|e| CacheError::io(service_dir, e))?;
        if !key_entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let key = key_entry.file_name().to_string_lossy().into_owned();
        let key_dir = key_entry.path();

        let files = fs::read_dir(&key_dir).map_err(|e| CacheError::io(&key_dir, e))?;
        for file in files {
            let file = file.map_err(|e| CacheError::io(&key_dir, e))?;
            if file.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let path = file.path();
            let timestamp_nanos = parse_timestamp(&file.file_name())
                .ok_or_else(|| CacheError::InvalidTimestamp(path.clone()))?;

            process(CacheRecord {
                key: key.clone(),
                timestamp_nanos,
                path,
                _value: PhantomData,
            })?;
        }
    }

    Ok(())
}

/// Number of cache files below `service_dir`.
pub fn count_records(service_dir: &Path) -> Result<usize, CacheError> {
    let mut count = 0;
    for_each_record::<serde::de::IgnoredAny, CacheError, _>(service_dir, |_| {
        count += 1;
        Ok(())
    })?;
    Ok(count)
}
