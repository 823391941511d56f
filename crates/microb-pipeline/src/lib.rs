//! Cache-backed line processing for microb engines.
//!
//! Every engine command is the same loop: read lines from stdin, reduce each
//! line to a key, skip keys that already have a fresh cache entry, fetch the
//! rest on a fixed pool of worker threads and store the results.
//!
//! - [`normalize_host`] / [`identity`]: line-to-key functions
//! - [`run_parallel`]: bounded worker pool over any item stream
//! - [`Pipeline`]: the orchestrator, in cached or simple mode
//! - [`CancelToken`]: stop a run early or after a deadline
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use microb_pipeline::{BoxError, Pipeline, normalize_host};
//!
//! let pipeline = Pipeline::builder(|host: &str| Ok::<_, BoxError>(host.len()))
//!     .key_fn(normalize_host)
//!     .sleep(Duration::ZERO)
//!     .build();
//!
//! let report = pipeline.process(vec!["https://www.example.com/".to_owned()]);
//! assert_eq!(report.fetched, 1);
//! ```

mod cancel;
mod normalize;
mod pipeline;
pub mod runner;
mod throttle;

pub use cancel::CancelToken;
pub use normalize::{NormalizeError, identity, normalize_host};
pub use pipeline::{
    BoxError, DEFAULT_SLEEP, DEFAULT_THREADS, LineOutcome, Pipeline, PipelineBuilder, RunReport,
    Stage,
};
pub use runner::{RunnerStats, feed_lines, run_parallel};
