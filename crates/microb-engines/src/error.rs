//! Error types for engine requests.

/// Error from a single engine fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, TLS, timeout, body read).
    #[error("request to {url} failed")]
    Http {
        /// Requested URL with secrets redacted.
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// Requested URL with secrets redacted.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// Response body did not match the expected format.
    #[error("failed to decode response from {url}")]
    Decode {
        /// Requested URL with secrets redacted.
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Engine needs an API key that was not provided.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

impl FetchError {
    /// HTTP status code if the server answered with an error status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
