//! OSINT API clients.
//!
//! Each engine wraps one public API behind a single blocking call that turns
//! a key (usually a hostname) into a serializable result. Engines hold no
//! state beyond a shared [`ureq::Agent`] and credentials, so one instance can
//! serve every worker thread.
//!
//! | engine | service | key |
//! |---|---|---|
//! | [`CrtSh`] | `crt_sh` | hostname |
//! | [`CertSpotter`] | `certspotter` | hostname |
//! | [`WebArchive`] | `web_archive` | hostname |
//! | [`AlienVault`] | `alienvault_passivedns` | hostname |
//! | [`CommonCrawl`] | `commoncrawl` | hostname |
//! | [`BinaryEdge`] | `binary_edge` | hostname |
//! | [`GoogleSearch`] | `google_custom_search` | search query |

pub mod alienvault;
pub mod binary_edge;
pub mod certspotter;
pub mod commoncrawl;
pub mod crt_sh;
mod error;
pub mod google_search;
mod http;
pub mod web_archive;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub use alienvault::AlienVault;
pub use binary_edge::BinaryEdge;
pub use certspotter::CertSpotter;
pub use commoncrawl::CommonCrawl;
pub use crt_sh::CrtSh;
pub use error::FetchError;
pub use google_search::GoogleSearch;
pub use http::create_agent;
pub use web_archive::WebArchive;

/// Service name and default TTL of every engine, in display order.
const ENGINES: &[(&str, Duration)] = &[
    (CrtSh::SERVICE, CrtSh::TTL),
    (CertSpotter::SERVICE, CertSpotter::TTL),
    (WebArchive::SERVICE, WebArchive::TTL),
    (AlienVault::SERVICE, AlienVault::TTL),
    (CommonCrawl::SERVICE, CommonCrawl::TTL),
    (BinaryEdge::SERVICE, BinaryEdge::TTL),
    (GoogleSearch::SERVICE, GoogleSearch::TTL),
];

/// Service names of every engine, in display order.
pub fn services() -> impl Iterator<Item = &'static str> {
    ENGINES.iter().map(|(service, _)| *service)
}

/// A data source queried once per key.
pub trait Engine: Send + Sync {
    /// Decoded response, stored verbatim as the cache payload.
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Cache directory name and graph command name.
    const SERVICE: &'static str;

    /// Default cache lifetime of a response.
    const TTL: Duration;

    /// Worker threads when none are configured for this engine. `None`
    /// leaves it to the pipeline setting.
    const THREADS: Option<usize> = None;

    /// Query the source for `key`.
    fn fetch(&self, key: &str) -> Result<Self::Output, FetchError>;
}

/// Default TTL for a service name, if it names an engine.
pub fn default_ttl(service: &str) -> Option<Duration> {
    ENGINES
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, ttl)| *ttl)
}

/// Decode `null` as the field's default. Responses written by older
/// collectors store empty lists as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
