//! Cache error types.

use std::path::PathBuf;

/// Error from cache lookups, writes and record reads.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// No fresh entry exists for the key.
    #[error("no fresh cache entry for {key:?}")]
    NotFound {
        /// Key that missed.
        key: String,
    },

    /// Stored JSON could not be decoded into the requested type.
    #[error("failed to decode cache file {}", path.display())]
    Deserialize {
        /// Cache file that failed to decode.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded as JSON.
    #[error("failed to encode value for {key:?}")]
    Serialize {
        /// Key being written.
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure.
    #[error("I/O error at {}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key cannot be used as a single directory name.
    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    /// Cache file name is not a base-10 timestamp.
    #[error("invalid cache file name {}", .0.display())]
    InvalidTimestamp(PathBuf),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a plain cache miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
