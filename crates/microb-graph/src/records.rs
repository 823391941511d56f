//! Typed graph records and the batches they are inserted in.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A hostname observation, optionally with the address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub hostname: String,
    pub address: String,
    pub record_type: String,
    pub asset_type: String,
    pub timestamp: DateTime<Utc>,
}

/// Certificate seen by `CertSpotter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertspotterCert {
    pub id: String,
    pub tbs_sha256: String,
    pub cert_sha256: String,
    pub dns_names: Vec<String>,
    pub pubkey_sha256: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub revoked: bool,
}

/// Certificate seen by crt.sh. `name_value` holds newline-separated SANs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrtshCert {
    pub id: i64,
    pub issuer_ca_id: i64,
    pub issuer_name: String,
    pub common_name: String,
    pub name_value: String,
    pub serial_number: String,
    pub entry_timestamp: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Page captured by Common Crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonCrawlWebpage {
    pub urlkey: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub mime: String,
    pub mime_detected: String,
    pub status: String,
    pub digest: String,
    pub length: String,
    pub offset: String,
    pub filename: String,
    pub languages: String,
    pub encoding: String,
}

/// Google search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleSearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub display_link: String,
    pub timestamp: DateTime<Utc>,
}

/// Archived URL split into website, path and scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebArchiveUrl {
    pub url: String,
    /// Host, including a non-default port.
    pub domain: String,
    /// Normalized path plus `?query` and `#fragment`.
    pub path: String,
    pub scheme: String,
    pub timestamp: DateTime<Utc>,
}

/// Any record the importer produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphRecord {
    Dns(DnsRecord),
    CertspotterCert(CertspotterCert),
    CrtshCert(CrtshCert),
    CommonCrawlWebpage(CommonCrawlWebpage),
    GoogleSearchResult(GoogleSearchResult),
    WebArchiveUrl(WebArchiveUrl),
}

/// Records from one cache file, inserted together.
///
/// The run identifies the fetch that produced the records: the cache key,
/// the cache file's timestamp and the engine's service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertBatch {
    pub command_name: String,
    pub run_key: String,
    pub run_timestamp: DateTime<Utc>,
    pub records: Vec<GraphRecord>,
}
