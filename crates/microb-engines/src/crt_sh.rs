//! Certificate transparency search via crt.sh.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::http::get_json;
use crate::{Engine, FetchError};

/// One certificate log entry as returned by crt.sh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertData {
    pub issuer_ca_id: i64,
    pub issuer_name: String,
    pub common_name: String,
    /// Newline-separated SAN entries.
    pub name_value: String,
    pub id: i64,
    /// `%Y-%m-%dT%H:%M:%S%.f`, no zone.
    pub entry_timestamp: String,
    /// `%Y-%m-%dT%H:%M:%S`, no zone.
    pub not_before: String,
    /// `%Y-%m-%dT%H:%M:%S`, no zone.
    pub not_after: String,
    pub serial_number: String,
    pub result_count: i64,
}

/// crt.sh client. Searches `*.{domain}`.
pub struct CrtSh {
    agent: Agent,
}

impl CrtSh {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Engine for CrtSh {
    type Output = Vec<CertData>;

    const SERVICE: &'static str = "crt_sh";
    const TTL: Duration = microb_cache::YEAR;

    fn fetch(&self, domain: &str) -> Result<Self::Output, FetchError> {
        let url = format!("https://crt.sh/?q=*.{domain}&output=json");
        get_json(&self.agent, &url, &[])
    }
}
