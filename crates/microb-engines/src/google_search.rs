//! Web search via the Google Custom Search JSON API.
//!
//! Unlike the other engines the key is a free-form query, e.g.
//! `site:example.com inurl:login`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;
use url::form_urlencoded;

use crate::http::get_json;
use crate::{Engine, FetchError};

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// One search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
    #[serde(rename = "displayLink")]
    pub display_link: String,
}

/// First page of results. `items` is absent when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    #[serde(deserialize_with = "crate::null_as_default")]
    pub items: Vec<SearchItem>,
}

/// Custom Search client.
pub struct GoogleSearch {
    agent: Agent,
    api_key: String,
    engine_id: String,
}

impl GoogleSearch {
    pub fn new(agent: Agent, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            agent,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }

    fn request_url(&self, query: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("key", &self.api_key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", query)
            .finish();
        format!("{SEARCH_URL}?{query}")
    }
}

impl Engine for GoogleSearch {
    type Output = SearchResponse;

    const SERVICE: &'static str = "google_custom_search";
    const TTL: Duration = microb_cache::YEAR;

    fn fetch(&self, query: &str) -> Result<Self::Output, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingCredential("GOOGLE_CUSTOM_SEARCH_API"));
        }
        if self.engine_id.is_empty() {
            return Err(FetchError::MissingCredential(
                "GOOGLE_CUSTOM_SEARCH_ENGINE_ID",
            ));
        }
        get_json(&self.agent, &self.request_url(query), &[])
    }
}
