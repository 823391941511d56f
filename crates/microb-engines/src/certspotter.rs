//! Certificate issuances via the `CertSpotter` API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::http::get_json;
use crate::{Engine, FetchError};

/// One certificate issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issuance {
    pub id: String,
    pub tbs_sha256: String,
    pub cert_sha256: String,
    #[serde(deserialize_with = "crate::null_as_default")]
    pub dns_names: Vec<String>,
    pub pubkey_sha256: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub revoked: bool,
}

/// `CertSpotter` client, including subdomains.
pub struct CertSpotter {
    agent: Agent,
}

impl CertSpotter {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Engine for CertSpotter {
    type Output = Vec<Issuance>;

    const SERVICE: &'static str = "certspotter";
    const TTL: Duration = microb_cache::YEAR;

    fn fetch(&self, domain: &str) -> Result<Self::Output, FetchError> {
        let url = format!(
            "https://api.certspotter.com/v1/issuances?domain={domain}&include_subdomains=true&expand=dns_names"
        );
        get_json(&self.agent, &url, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::decode;
    use chrono::TimeZone;

    #[test]
    fn test_decodes_rfc3339_validity() {
        let body = r#"[{
            "id": "1234",
            "tbs_sha256": "aa",
            "cert_sha256": "bb",
            "dns_names": ["example.com", "*.example.com"],
            "pubkey_sha256": "cc",
            "not_before": "2024-01-02T03:04:05Z",
            "not_after": "2024-04-01T03:04:05Z",
            "revoked": false
        }]"#;

        let issuances: Vec<Issuance> = decode("https://api.certspotter.com/", body).unwrap();

        assert_eq!(issuances[0].dns_names, vec!["example.com", "*.example.com"]);
        assert_eq!(
            issuances[0].not_before,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_null_dns_names_decode_as_empty() {
        let body = r#"[{
            "id": "1234",
            "dns_names": null,
            "not_before": "2024-01-02T03:04:05Z",
            "not_after": "2024-04-01T03:04:05Z"
        }]"#;

        let issuances: Vec<Issuance> = decode("https://api.certspotter.com/", body).unwrap();

        assert_eq!(issuances[0].id, "1234");
        assert!(issuances[0].dns_names.is_empty());
    }
}
