//! Passive DNS history from `AlienVault` OTX.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::http::{encode_segment, get_json};
use crate::{Engine, FetchError};

/// One observed resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveDns {
    pub hostname: String,
    pub address: String,
    pub record_type: String,
    pub asset_type: String,
}

/// OTX `passive_dns` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveDnsResponse {
    #[serde(deserialize_with = "crate::null_as_default")]
    pub passive_dns: Vec<PassiveDns>,
}

/// OTX passive DNS client.
pub struct AlienVault {
    agent: Agent,
}

impl AlienVault {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Engine for AlienVault {
    type Output = PassiveDnsResponse;

    const SERVICE: &'static str = "alienvault_passivedns";
    const TTL: Duration = microb_cache::YEAR;
    const THREADS: Option<usize> = Some(1);

    fn fetch(&self, hostname: &str) -> Result<Self::Output, FetchError> {
        let url = format!(
            "https://otx.alienvault.com/api/v1/indicators/domain/{}/passive_dns",
            encode_segment(hostname)
        );
        get_json(&self.agent, &url, &[])
    }
}
