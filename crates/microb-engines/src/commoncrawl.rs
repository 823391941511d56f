//! Captured pages from every Common Crawl index.
//!
//! A fetch first downloads the list of crawl indexes, then queries each
//! index's CDX API in turn. An index without captures answers 404, which is
//! treated as empty. Any other per-index failure is logged and that index is
//! skipped; only a failure to load the index list fails the fetch.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::http::{decode, get_json, get_text};
use crate::{Engine, FetchError};

const COLLECTIONS_URL: &str = "http://index.commoncrawl.org/collinfo.json";

/// One CDX capture record. All values are strings on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlData {
    pub urlkey: String,
    /// Capture time, `%Y%m%d%H%M%S`.
    pub timestamp: String,
    pub url: String,
    pub mime: String,
    #[serde(rename = "mime-detected")]
    pub mime_detected: String,
    pub status: String,
    pub digest: String,
    pub length: String,
    pub offset: String,
    pub filename: String,
    pub languages: String,
    pub encoding: String,
}

/// Crawl index descriptor from `collinfo.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Collection {
    id: String,
    #[serde(rename = "cdx-api")]
    cdx_api: String,
    from: String,
    to: String,
}

/// Common Crawl client.
pub struct CommonCrawl {
    agent: Agent,
}

impl CommonCrawl {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    fn fetch_collection(
        &self,
        collection: &Collection,
        domain: &str,
    ) -> Result<Vec<CrawlData>, FetchError> {
        let url = format!("{}?url=*.{domain}&output=json", collection.cdx_api);
        match get_text(&self.agent, &url, &[]) {
            Ok(body) => parse_ndjson(&url, &body),
            Err(e) if e.status() == Some(404) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl Engine for CommonCrawl {
    type Output = Vec<CrawlData>;

    const SERVICE: &'static str = "commoncrawl";
    const TTL: Duration = Duration::from_secs(microb_cache::MONTH.as_secs() * 2);

    fn fetch(&self, domain: &str) -> Result<Self::Output, FetchError> {
        let collections: Vec<Collection> = get_json(&self.agent, COLLECTIONS_URL, &[])?;

        let mut captures = Vec::new();
        for collection in &collections {
            match self.fetch_collection(collection, domain) {
                Ok(found) => {
                    tracing::debug!(
                        "{domain}: {} captures in {} ({} to {})",
                        found.len(),
                        collection.id,
                        collection.from,
                        collection.to
                    );
                    captures.extend(found);
                }
                Err(e) => {
                    tracing::warn!("{domain}: skipping index {}: {e}", collection.id);
                }
            }
        }
        Ok(captures)
    }
}

/// Decode newline-delimited JSON, ignoring blank lines.
fn parse_ndjson(url: &str, body: &str) -> Result<Vec<CrawlData>, FetchError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| decode(url, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ndjson() {
        let body = concat!(
            r#"{"urlkey": "com,example)/", "timestamp": "20240102030405", "url": "https://example.com/", "mime": "text/html", "mime-detected": "text/html", "status": "200"}"#,
            "\n",
            r#"{"urlkey": "com,example)/about", "timestamp": "20240102030406", "url": "https://example.com/about"}"#,
            "\n\n",
        );

        let records = parse_ndjson("http://index.commoncrawl.org/x", body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mime_detected, "text/html");
        assert_eq!(records[1].url, "https://example.com/about");
        assert_eq!(records[1].status, "");
    }

    #[test]
    fn test_parse_ndjson_rejects_garbage_line() {
        let body = "{\"url\": \"https://example.com/\"}\nnot json\n";
        let err = parse_ndjson("http://index.commoncrawl.org/x", body).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn test_collection_list_decodes() {
        let body = r#"[{"id": "CC-MAIN-2024-10", "name": "Feb 2024 Index",
            "timegate": "https://index.commoncrawl.org/CC-MAIN-2024-10/",
            "cdx-api": "https://index.commoncrawl.org/CC-MAIN-2024-10-index",
            "from": "2024-02-20T00:00:00", "to": "2024-03-05T00:00:00"}]"#;

        let collections: Vec<Collection> = decode(COLLECTIONS_URL, body).unwrap();

        assert_eq!(
            collections[0].cdx_api,
            "https://index.commoncrawl.org/CC-MAIN-2024-10-index"
        );
    }
}
