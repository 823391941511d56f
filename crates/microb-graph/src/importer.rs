//! Offline import of every cached engine payload.
//!
//! Sources are imported in parallel, one rayon task each. Within a source
//! the cache is walked fail-fast: the first unreadable file, unmappable
//! payload or sink error stops that source. Other sources are unaffected.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use microb_cache::{CacheError, for_each_record};
use microb_engines::{
    AlienVault, BinaryEdge, CertSpotter, CommonCrawl, CrtSh, Engine, GoogleSearch, WebArchive,
};
use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::mapping::{self, MapError};
use crate::records::{GraphRecord, InsertBatch};
use crate::sink::{GraphSink, SinkError};

/// Error that stopped the import of one source.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{}: {source}", path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: MapError,
    },

    #[error("failed to insert records from {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: SinkError,
    },
}

/// Engine cache that can be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    AlienVault,
    BinaryEdge,
    CertSpotter,
    CommonCrawl,
    CrtSh,
    GoogleSearch,
    WebArchive,
}

impl Source {
    /// Every source.
    pub const ALL: [Self; 7] = [
        Self::AlienVault,
        Self::BinaryEdge,
        Self::CertSpotter,
        Self::CommonCrawl,
        Self::CrtSh,
        Self::GoogleSearch,
        Self::WebArchive,
    ];

    /// Cache directory and graph command name.
    pub fn service(self) -> &'static str {
        match self {
            Self::AlienVault => AlienVault::SERVICE,
            Self::BinaryEdge => BinaryEdge::SERVICE,
            Self::CertSpotter => CertSpotter::SERVICE,
            Self::CommonCrawl => CommonCrawl::SERVICE,
            Self::CrtSh => CrtSh::SERVICE,
            Self::GoogleSearch => GoogleSearch::SERVICE,
            Self::WebArchive => WebArchive::SERVICE,
        }
    }

    /// Look up a source by service name.
    pub fn from_service(service: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.service() == service)
    }
}

/// Outcome of importing one source.
#[derive(Debug)]
pub struct SourceSummary {
    pub service: &'static str,
    /// Cache files inserted.
    pub files: usize,
    /// Records inserted.
    pub records: usize,
    /// Entries left out because they could not be parsed.
    pub skipped: usize,
    /// Error that stopped the source, if any.
    pub error: Option<ImportError>,
}

impl SourceSummary {
    fn new(service: &'static str) -> Self {
        Self {
            service,
            files: 0,
            records: 0,
            skipped: 0,
            error: None,
        }
    }
}

/// Import `sources` from `cache_root` into `sink`.
///
/// Returns one summary per source, in the order given. A source whose cache
/// directory does not exist yields an empty summary.
pub fn import(cache_root: &Path, sources: &[Source], sink: &dyn GraphSink) -> Vec<SourceSummary> {
    sources
        .par_iter()
        .map(|source| import_source(cache_root, *source, sink))
        .collect()
}

fn import_source(cache_root: &Path, source: Source, sink: &dyn GraphSink) -> SourceSummary {
    let service = source.service();
    let dir = cache_root.join(service);
    let mut summary = SourceSummary::new(service);

    if !dir.is_dir() {
        tracing::debug!("no cache for {service} at {}", dir.display());
        return summary;
    }

    let mut walker = Walker {
        dir: &dir,
        service,
        sink,
        summary: &mut summary,
    };
    let result = match source {
        Source::AlienVault => walker.run(|resp, ts, _| Ok((mapping::alienvault(resp, ts), 0))),
        Source::BinaryEdge => walker.run(|resp, ts, _| Ok((mapping::binary_edge(resp, ts), 0))),
        Source::CertSpotter => walker.run(|certs, _, _| Ok((mapping::certspotter(certs), 0))),
        Source::CommonCrawl => walker.run(|pages, _, _| Ok((mapping::commoncrawl(pages)?, 0))),
        Source::CrtSh => walker.run(|certs, _, _| Ok((mapping::crt_sh(certs)?, 0))),
        Source::GoogleSearch => {
            walker.run(|resp, ts, _| Ok((mapping::google_search(resp, ts), 0)))
        }
        Source::WebArchive => {
            walker.run(|urls, ts, context| Ok(mapping::web_archive(urls, ts, context)))
        }
    };

    if let Err(e) = result {
        tracing::error!("failed to import {service}: {e}");
        summary.error = Some(e);
    }
    tracing::info!(
        "{service}: imported {} records from {} files",
        summary.records,
        summary.files
    );
    summary
}

type Mapped = Result<(Vec<GraphRecord>, usize), MapError>;

struct Walker<'a> {
    dir: &'a Path,
    service: &'static str,
    sink: &'a dyn GraphSink,
    summary: &'a mut SourceSummary,
}

impl Walker<'_> {
    /// A `null` payload is an empty response and still yields one batch.
    fn run<T, F>(&mut self, map: F) -> Result<(), ImportError>
    where
        T: DeserializeOwned + Default,
        F: Fn(T, DateTime<Utc>, &str) -> Mapped,
    {
        for_each_record::<Option<T>, ImportError, _>(self.dir, |record| {
            let payload = record.read()?.unwrap_or_default();
            let ts = DateTime::<Utc>::from(record.timestamp());
            let context = format!("{}/{}/{}", self.service, record.key(), ts.timestamp());

            let (records, skipped) =
                map(payload, ts, &context).map_err(|source| ImportError::Map {
                    path: record.path().to_path_buf(),
                    source,
                })?;
            let count = records.len();

            let batch = InsertBatch {
                command_name: self.service.to_owned(),
                run_key: record.key().to_owned(),
                run_timestamp: ts,
                records,
            };
            self.sink
                .insert(&batch)
                .map_err(|source| ImportError::Sink {
                    path: record.path().to_path_buf(),
                    source,
                })?;

            self.summary.files += 1;
            self.summary.records += count;
            self.summary.skipped += skipped;
            tracing::debug!("[{context}] inserted {count} records");
            Ok(())
        })
    }
}
