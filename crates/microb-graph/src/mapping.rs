//! Conversion of cached engine payloads into graph records.
//!
//! Each function takes one cache file's payload and the file's timestamp.
//! Timestamp fields that fail to parse abort the whole payload; a web
//! archive URL that fails to parse is logged and left out.

use chrono::{DateTime, NaiveDateTime, Utc};
use microb_engines::alienvault::PassiveDnsResponse;
use microb_engines::binary_edge::BinaryEdgeResponse;
use microb_engines::certspotter::Issuance;
use microb_engines::commoncrawl::CrawlData;
use microb_engines::crt_sh::CertData;
use microb_engines::google_search::SearchResponse;
use url::Url;

use crate::records::{
    CertspotterCert, CommonCrawlWebpage, CrtshCert, DnsRecord, GoogleSearchResult, GraphRecord,
    WebArchiveUrl,
};

const COMMONCRAWL_TS: &str = "%Y%m%d%H%M%S";
const CRTSH_ENTRY_TS: &str = "%Y-%m-%dT%H:%M:%S%.f";
const CRTSH_VALIDITY_TS: &str = "%Y-%m-%dT%H:%M:%S";

/// Payload field that could not be converted.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("invalid {field} {value:?}")]
    Timestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

fn parse_ts(field: &'static str, value: &str, format: &str) -> Result<DateTime<Utc>, MapError> {
    NaiveDateTime::parse_from_str(value, format)
        .map(|naive| naive.and_utc())
        .map_err(|source| MapError::Timestamp {
            field,
            value: value.to_owned(),
            source,
        })
}

pub fn alienvault(resp: PassiveDnsResponse, ts: DateTime<Utc>) -> Vec<GraphRecord> {
    resp.passive_dns
        .into_iter()
        .map(|dns| {
            GraphRecord::Dns(DnsRecord {
                hostname: dns.hostname,
                address: dns.address,
                record_type: dns.record_type,
                asset_type: dns.asset_type,
                timestamp: ts,
            })
        })
        .collect()
}

pub fn binary_edge(resp: BinaryEdgeResponse, ts: DateTime<Utc>) -> Vec<GraphRecord> {
    resp.events
        .into_iter()
        .map(|hostname| {
            GraphRecord::Dns(DnsRecord {
                hostname,
                address: String::new(),
                record_type: String::new(),
                asset_type: String::new(),
                timestamp: ts,
            })
        })
        .collect()
}

pub fn certspotter(issuances: Vec<Issuance>) -> Vec<GraphRecord> {
    issuances
        .into_iter()
        .map(|cert| {
            GraphRecord::CertspotterCert(CertspotterCert {
                id: cert.id,
                tbs_sha256: cert.tbs_sha256,
                cert_sha256: cert.cert_sha256,
                dns_names: cert.dns_names,
                pubkey_sha256: cert.pubkey_sha256,
                not_before: cert.not_before,
                not_after: cert.not_after,
                revoked: cert.revoked,
            })
        })
        .collect()
}

pub fn commoncrawl(captures: Vec<CrawlData>) -> Result<Vec<GraphRecord>, MapError> {
    captures
        .into_iter()
        .map(|page| {
            Ok(GraphRecord::CommonCrawlWebpage(CommonCrawlWebpage {
                timestamp: parse_ts("timestamp", &page.timestamp, COMMONCRAWL_TS)?,
                urlkey: page.urlkey,
                url: page.url,
                mime: page.mime,
                mime_detected: page.mime_detected,
                status: page.status,
                digest: page.digest,
                length: page.length,
                offset: page.offset,
                filename: page.filename,
                languages: page.languages,
                encoding: page.encoding,
            }))
        })
        .collect()
}

pub fn crt_sh(certs: Vec<CertData>) -> Result<Vec<GraphRecord>, MapError> {
    certs
        .into_iter()
        .map(|cert| {
            Ok(GraphRecord::CrtshCert(CrtshCert {
                entry_timestamp: parse_ts(
                    "entry_timestamp",
                    &cert.entry_timestamp,
                    CRTSH_ENTRY_TS,
                )?,
                not_before: parse_ts("not_before", &cert.not_before, CRTSH_VALIDITY_TS)?,
                not_after: parse_ts("not_after", &cert.not_after, CRTSH_VALIDITY_TS)?,
                id: cert.id,
                issuer_ca_id: cert.issuer_ca_id,
                issuer_name: cert.issuer_name,
                common_name: cert.common_name,
                name_value: cert.name_value,
                serial_number: cert.serial_number,
            }))
        })
        .collect()
}

pub fn google_search(resp: SearchResponse, ts: DateTime<Utc>) -> Vec<GraphRecord> {
    resp.items
        .into_iter()
        .map(|item| {
            GraphRecord::GoogleSearchResult(GoogleSearchResult {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
                display_link: item.display_link,
                timestamp: ts,
            })
        })
        .collect()
}

/// Map archived URLs; returns the records and the number of URLs skipped.
pub fn web_archive(
    urls: Vec<String>,
    ts: DateTime<Utc>,
    context: &str,
) -> (Vec<GraphRecord>, usize) {
    let mut skipped = 0;
    let records = urls
        .into_iter()
        .filter_map(|raw| match parse_web_archive_url(&raw, ts) {
            Ok(url) => Some(GraphRecord::WebArchiveUrl(url)),
            Err(e) => {
                tracing::warn!("[{context}] failed to parse URL {raw}: {e}");
                skipped += 1;
                None
            }
        })
        .collect();
    (records, skipped)
}

/// Split an absolute URL into the parts stored for the website graph.
pub fn parse_web_archive_url(
    raw: &str,
    ts: DateTime<Utc>,
) -> Result<WebArchiveUrl, url::ParseError> {
    let parsed = Url::parse(raw)?;

    let host = parsed.host_str().unwrap_or_default();
    let domain = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };

    let mut path = clean_path(parsed.path());
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = parsed.fragment().filter(|f| !f.is_empty()) {
        path.push('#');
        path.push_str(fragment);
    }

    Ok(WebArchiveUrl {
        url: raw.to_owned(),
        domain,
        path,
        scheme: parsed.scheme().to_owned(),
        timestamp: ts,
    })
}

/// Lexically normalize a URL path: collapse repeated slashes, drop `.`
/// segments, resolve `..` and remove the trailing slash. Never empty.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("//a///b/"), "/a/b");
        assert_eq!(clean_path("/a/./b/../c"), "/a/c");
        assert_eq!(clean_path("/../x"), "/x");
    }

    #[test]
    fn test_parse_web_archive_url() {
        let raw = "https://Example.com:8443//app/./login/?next=/home#top";
        let url = parse_web_archive_url(raw, ts()).unwrap();

        assert_eq!(url.domain, "example.com:8443");
        assert_eq!(url.path, "/app/login?next=/home#top");
        assert_eq!(url.scheme, "https");
        assert_eq!(url.url, raw);
    }

    #[test]
    fn test_default_port_is_not_part_of_domain() {
        let url = parse_web_archive_url("http://example.com:80/", ts()).unwrap();
        assert_eq!(url.domain, "example.com");
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_web_archive_skips_unparseable() {
        let urls = vec![
            "http://example.com/a".to_owned(),
            "not a url".to_owned(),
            "http://example.com/b".to_owned(),
        ];

        let (records, skipped) = web_archive(urls, ts(), "web_archive/example.com");

        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_commoncrawl_timestamp() {
        let page = CrawlData {
            timestamp: "20240102030405".to_owned(),
            url: "https://example.com/".to_owned(),
            ..CrawlData::default()
        };

        let records = commoncrawl(vec![page]).unwrap();

        let GraphRecord::CommonCrawlWebpage(webpage) = &records[0] else {
            panic!("expected webpage, got {:?}", records[0]);
        };
        assert_eq!(
            webpage.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_commoncrawl_bad_timestamp_aborts() {
        let pages = vec![
            CrawlData {
                timestamp: "20240102030405".to_owned(),
                ..CrawlData::default()
            },
            CrawlData {
                timestamp: "yesterday".to_owned(),
                ..CrawlData::default()
            },
        ];

        let err = commoncrawl(pages).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_crt_sh_timestamps() {
        let cert = CertData {
            id: 42,
            entry_timestamp: "2024-03-01T12:34:56.789".to_owned(),
            not_before: "2024-03-01T11:34:56".to_owned(),
            not_after: "2024-05-30T11:34:55".to_owned(),
            ..CertData::default()
        };

        let records = crt_sh(vec![cert]).unwrap();

        let GraphRecord::CrtshCert(cert) = &records[0] else {
            panic!("expected crt.sh cert, got {:?}", records[0]);
        };
        assert_eq!(cert.entry_timestamp.timestamp_subsec_millis(), 789);
        assert_eq!(
            cert.not_after,
            Utc.with_ymd_and_hms(2024, 5, 30, 11, 34, 55).unwrap()
        );
    }

    #[test]
    fn test_crt_sh_entry_without_fraction() {
        let cert = CertData {
            entry_timestamp: "2024-03-01T12:34:56".to_owned(),
            not_before: "2024-03-01T11:34:56".to_owned(),
            not_after: "2024-05-30T11:34:55".to_owned(),
            ..CertData::default()
        };
        assert!(crt_sh(vec![cert]).is_ok());
    }

    #[test]
    fn test_crt_sh_missing_validity_aborts() {
        let cert = CertData {
            entry_timestamp: "2024-03-01T12:34:56.1".to_owned(),
            ..CertData::default()
        };
        let err = crt_sh(vec![cert]).unwrap_err();
        assert!(matches!(err, MapError::Timestamp { field: "not_before", .. }));
    }

    #[test]
    fn test_binary_edge_events_become_hostnames() {
        let resp = BinaryEdgeResponse {
            events: vec!["a.example.com".to_owned(), "b.example.com".to_owned()],
            ..BinaryEdgeResponse::default()
        };

        let records = binary_edge(resp, ts());

        assert_eq!(
            records[1],
            GraphRecord::Dns(DnsRecord {
                hostname: "b.example.com".to_owned(),
                address: String::new(),
                record_type: String::new(),
                asset_type: String::new(),
                timestamp: ts(),
            })
        );
    }
}
