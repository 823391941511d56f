//! `microb clean` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use microb_cache::FileCache;
use microb_config::Config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the clean command.
#[derive(Args)]
pub(crate) struct CleanArgs {
    /// Services to clean (default: all engines).
    services: Vec<String>,

    /// Path to configuration file (default: auto-discover microb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CleanArgs {
    /// Execute the clean command.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown service or if a cache directory
    /// cannot be listed. Failures to delete single files are only counted.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        for (service, default_ttl) in resolve_services(&self.services)? {
            let cache: FileCache<()> = FileCache::for_service(
                &config.cache_resolved.root,
                service,
                config.ttl_for(service, default_ttl),
            );
            if cache.ttl().is_zero() {
                output.info(&format!("{service}: entries never expire, skipped"));
                continue;
            }

            let report = cache.clean_expired()?;
            let msg = format!(
                "{service}: removed {} of {} files",
                report.removed, report.scanned
            );
            if report.failed > 0 {
                output.warning(&format!("{msg} ({} could not be deleted)", report.failed));
            } else {
                output.success(&msg);
            }
        }
        Ok(())
    }
}

/// Map service names to their default TTLs; empty means every engine.
fn resolve_services(names: &[String]) -> Result<Vec<(&'static str, Duration)>, CliError> {
    if names.is_empty() {
        return Ok(microb_engines::services()
            .filter_map(|s| Some((s, microb_engines::default_ttl(s)?)))
            .collect());
    }
    names
        .iter()
        .map(|name| {
            microb_engines::services()
                .find(|s| *s == name.as_str())
                .and_then(|s| Some((s, microb_engines::default_ttl(s)?)))
                .ok_or_else(|| CliError::UnknownService(name.clone()))
        })
        .collect()
}
