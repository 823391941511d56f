//! Line-processing orchestrator.
//!
//! A [`Pipeline`] reads lines, derives a key from each one and runs the fetch
//! function for it on a bounded worker pool. With a cache attached it only
//! fetches keys that have no fresh cache entry and stores every result
//! (cached mode); without one it fetches every key, optionally skipping
//! repeats (simple mode).
//!
//! Failures never stop a run: each is logged, counted in the [`RunReport`]
//! and the line is abandoned.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashSet;
use microb_cache::CacheProvider;

use crate::runner::run_parallel;
use crate::throttle::Throttle;
use crate::{CancelToken, normalize};

/// Error type returned by key and fetch functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type KeyFn = Box<dyn Fn(&str) -> Result<String, BoxError> + Send + Sync>;
type RunFn<T> = Box<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;
type OutputFn<T> = Box<dyn Fn(T) + Send + Sync>;

/// Default worker count.
pub const DEFAULT_THREADS: usize = 10;
/// Default spacing between fetches.
pub const DEFAULT_SLEEP: Duration = Duration::from_millis(10);

/// Step at which a line was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Deriving the key from the line.
    Key,
    /// Checking the cache for a fresh entry.
    CacheLookup,
    /// Running the fetch function.
    Fetch,
    /// Storing the fetch result.
    CacheWrite,
}

/// What happened to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The fetch function ran and its result was delivered.
    Fetched,
    /// A fresh cache entry existed; nothing was fetched.
    Cached,
    /// The key was already seen (or is being fetched) in this run.
    Duplicate,
    /// The line produced an empty key.
    Empty,
    /// The line was abandoned with an error.
    Failed(Stage),
}

/// Per-run counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Lines handed to a worker (every outcome plus panics).
    pub processed: usize,
    /// Lines that ran the fetch function successfully.
    pub fetched: usize,
    /// Lines answered by the cache.
    pub cached: usize,
    /// Lines skipped as repeated keys.
    pub duplicates: usize,
    /// Lines with an empty key.
    pub empty: usize,
    /// Lines abandoned with an error.
    pub failed: usize,
    /// Lines whose processing panicked.
    pub panicked: usize,
    /// Lines read but dropped because the run was cancelled.
    pub cancelled: usize,
}

impl RunReport {
    /// Share of processed lines that failed or panicked, in `0.0..=1.0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.failed + self.panicked) as f64 / self.processed as f64
    }
}

#[derive(Default)]
struct Tally {
    fetched: AtomicUsize,
    cached: AtomicUsize,
    duplicates: AtomicUsize,
    empty: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record(&self, outcome: LineOutcome) {
        let counter = match outcome {
            LineOutcome::Fetched => &self.fetched,
            LineOutcome::Cached => &self.cached,
            LineOutcome::Duplicate => &self.duplicates,
            LineOutcome::Empty => &self.empty,
            LineOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Per-run key sets.
#[derive(Default)]
struct RunState {
    seen: DashSet<String>,
    in_flight: DashSet<String>,
}

/// Releases an in-flight key when the line finishes, even on panic.
struct InFlight<'a> {
    set: &'a DashSet<String>,
    key: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(self.key);
    }
}

/// Cache-aware, bounded-concurrency line processor producing values of `T`.
pub struct Pipeline<T> {
    threads: usize,
    key_fn: KeyFn,
    run_fn: RunFn<T>,
    output_fn: Option<OutputFn<T>>,
    throttle: Throttle,
    unique: bool,
    cache: Option<Arc<dyn CacheProvider<T>>>,
    cancel: CancelToken,
}

impl<T> Pipeline<T> {
    /// Start building a pipeline around the fetch function.
    pub fn builder<F, E>(run_fn: F) -> PipelineBuilder<T>
    where
        T: 'static,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        PipelineBuilder::new(Box::new(move |key: &str| -> Result<T, BoxError> {
            run_fn(key).map_err(Into::into)
        }))
    }

    /// Process every line and return the run's counters.
    ///
    /// Blocks until the input is exhausted or the cancel token fires, and all
    /// in-progress lines are finished.
    pub fn process<I>(&self, lines: I) -> RunReport
    where
        I: IntoIterator<Item = String>,
    {
        let tally = Tally::default();
        let state = RunState::default();

        let stats = run_parallel(self.threads, &self.cancel, lines, |line| {
            let outcome = self.process_line(&line, &state);
            tally.record(outcome);
        });

        RunReport {
            processed: stats.completed + stats.panicked,
            fetched: tally.fetched.into_inner(),
            cached: tally.cached.into_inner(),
            duplicates: tally.duplicates.into_inner(),
            empty: tally.empty.into_inner(),
            failed: tally.failed.into_inner(),
            panicked: stats.panicked,
            cancelled: stats.cancelled,
        }
    }

    fn process_line(&self, line: &str, state: &RunState) -> LineOutcome {
        let key = match (self.key_fn)(line) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!("error parsing key from {line:?}: {e}");
                return LineOutcome::Failed(Stage::Key);
            }
        };

        if key.is_empty() {
            tracing::debug!("skipping empty key for {line:?}");
            return LineOutcome::Empty;
        }

        if self.unique && !state.seen.insert(key.clone()) {
            tracing::debug!("skipping duplicate key: {key}");
            return LineOutcome::Duplicate;
        }

        match &self.cache {
            Some(cache) => self.fetch_cached(cache.as_ref(), &key, state),
            None => self.fetch_simple(&key),
        }
    }

    fn fetch_cached(
        &self,
        cache: &dyn CacheProvider<T>,
        key: &str,
        state: &RunState,
    ) -> LineOutcome {
        if !state.in_flight.insert(key.to_owned()) {
            tracing::debug!("already fetching: {key}");
            return LineOutcome::Duplicate;
        }
        let _guard = InFlight {
            set: &state.in_flight,
            key,
        };

        match cache.has_cached(key) {
            Ok(true) => {
                tracing::debug!("already processed: {key}");
                return LineOutcome::Cached;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("error checking cache for {key}: {e}");
                return LineOutcome::Failed(Stage::CacheLookup);
            }
        }

        let value = match self.run(key) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };

        if let Err(e) = cache.add_to_cache(key, &value) {
            tracing::error!("error adding {key} to cache: {e}");
            return LineOutcome::Failed(Stage::CacheWrite);
        }

        self.emit(key, value);
        LineOutcome::Fetched
    }

    fn fetch_simple(&self, key: &str) -> LineOutcome {
        match self.run(key) {
            Ok(value) => {
                self.emit(key, value);
                LineOutcome::Fetched
            }
            Err(outcome) => outcome,
        }
    }

    fn run(&self, key: &str) -> Result<T, LineOutcome> {
        self.throttle.wait();
        (self.run_fn)(key).map_err(|e| {
            tracing::error!("error running {key}: {e}");
            LineOutcome::Failed(Stage::Fetch)
        })
    }

    fn emit(&self, key: &str, value: T) {
        if let Some(output) = &self.output_fn {
            output(value);
        }
        tracing::debug!("successfully processed: {key}");
    }
}

fn identity_key(line: &str) -> Result<String, BoxError> {
    Ok(normalize::identity(line)?)
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<T> {
    threads: usize,
    key_fn: KeyFn,
    run_fn: RunFn<T>,
    output_fn: Option<OutputFn<T>>,
    sleep: Duration,
    unique: bool,
    cache: Option<Arc<dyn CacheProvider<T>>>,
    cancel: CancelToken,
}

impl<T> PipelineBuilder<T> {
    fn new(run_fn: RunFn<T>) -> Self {
        Self {
            threads: DEFAULT_THREADS,
            key_fn: Box::new(identity_key),
            run_fn,
            output_fn: None,
            sleep: DEFAULT_SLEEP,
            unique: false,
            cache: None,
            cancel: CancelToken::new(),
        }
    }

    /// Number of worker threads (clamped to at least one).
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Function deriving the key from a raw line.
    #[must_use]
    pub fn key_fn<F, E>(mut self, key_fn: F) -> Self
    where
        T: 'static,
        F: Fn(&str) -> Result<String, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        self.key_fn = Box::new(move |line: &str| -> Result<String, BoxError> {
            key_fn(line).map_err(Into::into)
        });
        self
    }

    /// Consumer for each successful fetch result. Called from worker threads.
    #[must_use]
    pub fn output_fn<F>(mut self, output_fn: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.output_fn = Some(Box::new(output_fn));
        self
    }

    /// Minimum spacing between fetches across all workers. Zero disables pacing.
    #[must_use]
    pub fn sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    /// Skip keys already seen in this run.
    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Attach a cache, switching the pipeline to cached mode.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheProvider<T>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Token used to stop the run early.
    #[must_use]
    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Pipeline<T> {
        Pipeline {
            threads: self.threads,
            key_fn: self.key_fn,
            run_fn: self.run_fn,
            output_fn: self.output_fn,
            throttle: Throttle::new(self.sleep),
            unique: self.unique,
            cache: self.cache,
            cancel: self.cancel,
        }
    }
}
