//! CLI error types.

use microb_cache::CacheError;
use microb_config::ConfigError;
use microb_graph::SinkError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cache(#[from] CacheError),

    #[error("{0}")]
    Sink(#[from] SinkError),

    #[error("unknown service {0:?} (expected one of: {known})", known = known_services())]
    UnknownService(String),

    #[error("{service}: failure rate {rate:.2} exceeds maximum {max:.2}")]
    FailureRate { service: String, rate: f64, max: f64 },

    #[error("import failed for {0} source(s)")]
    Import(usize),
}

fn known_services() -> String {
    microb_engines::services().collect::<Vec<_>>().join(", ")
}

impl CliError {
    /// Process exit code for this error.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::FailureRate { .. } => 2,
            _ => 1,
        }
    }
}
