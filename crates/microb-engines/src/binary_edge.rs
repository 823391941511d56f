//! Subdomain enumeration via the `BinaryEdge` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::http::{encode_segment, get_json};
use crate::{Engine, FetchError};

/// One page of subdomain results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryEdgeResponse {
    pub query: String,
    pub page: i64,
    pub pagesize: i64,
    pub total: i64,
    /// Subdomain names.
    #[serde(deserialize_with = "crate::null_as_default")]
    pub events: Vec<String>,
}

/// `BinaryEdge` client. Authenticates with the `X-Key` header.
pub struct BinaryEdge {
    agent: Agent,
    api_key: String,
}

impl BinaryEdge {
    pub fn new(agent: Agent, api_key: impl Into<String>) -> Self {
        Self {
            agent,
            api_key: api_key.into(),
        }
    }
}

impl Engine for BinaryEdge {
    type Output = BinaryEdgeResponse;

    const SERVICE: &'static str = "binary_edge";
    const TTL: Duration = microb_cache::YEAR;

    fn fetch(&self, domain: &str) -> Result<Self::Output, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingCredential("BINARYEDGE_API_KEY"));
        }
        let url = format!(
            "https://api.binaryedge.io/v2/query/domains/subdomain/{}",
            encode_segment(domain)
        );
        get_json(&self.agent, &url, &[("X-Key", self.api_key.as_str())])
    }
}
