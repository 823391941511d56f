//! Line filters: `microb extract-domains` and `microb unique-lines`.
//!
//! Both run the pipeline without a cache. The key itself is the result and
//! goes to stdout.

use std::convert::Infallible;
use std::time::Duration;

use clap::Args;
use microb_pipeline::{Pipeline, RunReport, feed_lines, identity, normalize_host};

use crate::commands::fetch::KeyFn;
use crate::error::CliError;
use crate::output::emit;

/// Arguments for the extract-domains command.
#[derive(Args)]
pub(crate) struct ExtractDomainsArgs {
    /// Print each hostname only once (default: enabled).
    #[arg(long)]
    unique: Option<bool>,

    /// Print every hostname, including repeats.
    #[arg(long, conflicts_with = "unique")]
    no_unique: bool,

    /// Number of worker threads. More than one may reorder the output.
    #[arg(short, long, default_value_t = 1)]
    threads: usize,
}

impl ExtractDomainsArgs {
    /// Execute the extract-domains command.
    #[allow(clippy::unnecessary_wraps)]
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let pipeline = filter(normalize_host, self.resolve_unique(), self.threads, emit_owned);
        log_report("extract-domains", &process_stdin(&pipeline));
        Ok(())
    }

    fn resolve_unique(&self) -> bool {
        !self.no_unique && self.unique.unwrap_or(true)
    }
}

/// Execute the unique-lines command.
///
/// Runs on a single worker so the first occurrence of each line keeps its
/// input position. Blank lines are dropped.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn unique_lines() -> Result<(), CliError> {
    let pipeline = filter(identity, true, 1, emit_owned);
    log_report("unique-lines", &process_stdin(&pipeline));
    Ok(())
}

fn emit_owned(line: String) {
    emit(&line);
}

fn filter<F>(key_fn: KeyFn, unique: bool, threads: usize, output: F) -> Pipeline<String>
where
    F: Fn(String) + Send + Sync + 'static,
{
    Pipeline::builder(|key: &str| Ok::<_, Infallible>(key.to_owned()))
        .key_fn(key_fn)
        .unique(unique)
        .threads(threads)
        .sleep(Duration::ZERO)
        .output_fn(output)
        .build()
}

fn process_stdin(pipeline: &Pipeline<String>) -> RunReport {
    let stdin = std::io::stdin();
    pipeline.process(feed_lines(stdin.lock()))
}

fn log_report(command: &str, report: &RunReport) {
    tracing::info!(
        "{command}: {} lines, {} duplicates, {} empty, {} failed",
        report.processed,
        report.duplicates,
        report.empty,
        report.failed
    );
}
