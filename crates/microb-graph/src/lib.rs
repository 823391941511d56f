//! Graph import of cached engine results.
//!
//! Engines cache raw API responses; this crate replays every cache file,
//! converts its payload into typed records (hostnames, certificates, web
//! pages, search hits, archived URLs) and hands each file's records to a
//! [`GraphSink`] as one [`InsertBatch`].
//!
//! The shipped sink writes newline-delimited JSON for loading into a graph
//! database.

mod importer;
pub mod mapping;
mod records;
mod sink;

pub use importer::{ImportError, Source, SourceSummary, import};
pub use mapping::MapError;
pub use records::{
    CertspotterCert, CommonCrawlWebpage, CrtshCert, DnsRecord, GoogleSearchResult, GraphRecord,
    InsertBatch, WebArchiveUrl,
};
pub use sink::{GraphSink, JsonLinesSink, MemorySink, SinkError};
