//! `microb import` command implementation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use microb_config::Config;
use microb_graph::{JsonLinesSink, Source, SourceSummary, import};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the import command.
#[derive(Args)]
pub(crate) struct ImportArgs {
    /// Services to import (default: all engines).
    services: Vec<String>,

    /// Write batches to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover microb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ImportArgs {
    /// Execute the import command.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown service, if the output cannot be
    /// written, or if any source stopped with an error.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let sources = resolve_sources(&self.services)?;
        let root = &config.cache_resolved.root;

        output.info(&format!("Cache directory: {}", root.display()));
        let summaries = match &self.output {
            Some(path) => {
                let file = File::create(path)?;
                let summaries = run(root, &sources, BufWriter::new(file))?;
                output.info(&format!("Output: {}", path.display()));
                summaries
            }
            None => run(root, &sources, io::stdout())?,
        };

        print_summaries(&output, &summaries);
        match summaries.iter().filter(|s| s.error.is_some()).count() {
            0 => Ok(()),
            failed => Err(CliError::Import(failed)),
        }
    }
}

fn run<W: Write + Send>(
    root: &Path,
    sources: &[Source],
    writer: W,
) -> Result<Vec<SourceSummary>, CliError> {
    let sink = JsonLinesSink::new(writer);
    let summaries = import(root, sources, &sink);
    sink.into_inner()?;
    Ok(summaries)
}

fn resolve_sources(names: &[String]) -> Result<Vec<Source>, CliError> {
    if names.is_empty() {
        return Ok(Source::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| {
            Source::from_service(name).ok_or_else(|| CliError::UnknownService(name.clone()))
        })
        .collect()
}

fn print_summaries(output: &Output, summaries: &[SourceSummary]) {
    for summary in summaries {
        let msg = format!(
            "{}: {} records from {} files",
            summary.service, summary.records, summary.files
        );
        match &summary.error {
            Some(e) => output.error(&format!("{msg}, stopped: {e}")),
            None if summary.skipped > 0 => {
                output.warning(&format!("{msg} ({} entries skipped)", summary.skipped));
            }
            None => output.success(&msg),
        }
    }
}
