//! Engine commands: `microb crt-sh`, `microb certspotter`, and the rest.
//!
//! Every engine command reads keys from stdin, fetches each missing or
//! expired key once, and stores the response in the engine's cache. Nothing
//! is printed to stdout; the cache is the result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use microb_cache::{CacheProvider, DAY, FileCache, NullCache};
use microb_config::{CliSettings, Config};
use microb_engines::{Engine, create_agent};
use microb_pipeline::{CancelToken, NormalizeError, Pipeline, feed_lines};
use ureq::Agent;

use crate::error::CliError;
use crate::output::Output;

/// Turns an input line into a cache key.
pub(crate) type KeyFn = fn(&str) -> Result<String, NormalizeError>;

/// Arguments shared by every engine command.
#[derive(Args)]
pub(crate) struct FetchArgs {
    /// Number of worker threads (overrides config).
    #[arg(short, long)]
    threads: Option<usize>,

    /// Minimum milliseconds between requests across all workers (overrides config).
    #[arg(long)]
    sleep_ms: Option<u64>,

    /// Cache lifetime in days; 0 keeps entries forever (overrides config).
    #[arg(long)]
    ttl_days: Option<u64>,

    /// Disable caching; every key is fetched.
    #[arg(long)]
    no_cache: bool,

    /// Stop reading input after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    max_runtime: Option<u64>,

    /// Exit with code 2 if more than this share of lines fail (0.0-1.0).
    #[arg(long)]
    max_failure_rate: Option<f64>,

    /// Path to configuration file (default: auto-discover microb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl FetchArgs {
    /// Run engine `E` over stdin.
    ///
    /// `make` builds the engine from the shared HTTP agent and the loaded
    /// configuration, so engines that need credentials can fail before any
    /// input is read.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or engine setup fails, or if the
    /// failure rate exceeds the configured maximum.
    pub(crate) fn run<E, M>(self, key_fn: KeyFn, make: M) -> Result<(), CliError>
    where
        E: Engine + 'static,
        M: FnOnce(Agent, &Config) -> Result<E, CliError>,
    {
        let output = Output::new();
        let service = E::SERVICE;

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let engine = make(create_agent(config.http.timeout()), &config)?;

        let threads = self.resolve_threads(&config, service, E::THREADS);
        let ttl = self.resolve_ttl(&config, service, E::TTL);
        let cache: Arc<dyn CacheProvider<E::Output>> = if config.cache_resolved.enabled {
            let cache =
                FileCache::<E::Output>::for_service(&config.cache_resolved.root, service, ttl);
            output.info(&format!("Cache directory: {}", cache.dir().display()));
            Arc::new(cache)
        } else {
            output.info("Cache: disabled");
            Arc::new(NullCache)
        };
        output.info(&format!("Threads: {threads}"));

        let pipeline = Pipeline::builder(move |key: &str| engine.fetch(key))
            .threads(threads)
            .key_fn(key_fn)
            .sleep(config.pipeline.sleep())
            .cache(cache)
            .cancel(self.cancel_token())
            .build();

        let stdin = std::io::stdin();
        let report = pipeline.process(feed_lines(stdin.lock()));
        output.report(service, &report);

        check_failure_rate(service, report.failure_rate(), config.pipeline.max_failure_rate)
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            cache_enabled: self.no_cache.then_some(false),
            threads: self.threads,
            sleep_ms: self.sleep_ms,
            max_failure_rate: self.max_failure_rate,
            ..CliSettings::default()
        }
    }

    /// `--threads` beats the config file, which beats the engine's own limit.
    fn resolve_threads(&self, config: &Config, service: &str, default: Option<usize>) -> usize {
        self.threads.unwrap_or_else(|| config.threads_for(service, default))
    }

    /// `--ttl-days` beats the config file, which beats the engine default.
    fn resolve_ttl(&self, config: &Config, service: &str, default: Duration) -> Duration {
        self.ttl_days.map_or_else(
            || config.ttl_for(service, default),
            |days| Duration::from_secs(days.saturating_mul(DAY.as_secs())),
        )
    }

    fn cancel_token(&self) -> CancelToken {
        self.max_runtime.map_or_else(CancelToken::new, |secs| {
            CancelToken::with_timeout(Duration::from_secs(secs))
        })
    }
}

/// Key function for search engines: the query minus surrounding whitespace.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn query_key(line: &str) -> Result<String, NormalizeError> {
    Ok(line.trim().to_owned())
}

fn check_failure_rate(service: &str, rate: f64, max: Option<f64>) -> Result<(), CliError> {
    match max {
        Some(max) if rate > max => Err(CliError::FailureRate {
            service: service.to_owned(),
            rate,
            max,
        }),
        _ => Ok(()),
    }
}
