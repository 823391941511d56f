//! Archived URLs from the Wayback Machine CDX index.

use std::time::Duration;

use ureq::Agent;

use crate::http::get_text;
use crate::{Engine, FetchError};

/// Web Archive CDX client. Returns one original URL per capture group.
pub struct WebArchive {
    agent: Agent,
}

impl WebArchive {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Engine for WebArchive {
    type Output = Vec<String>;

    const SERVICE: &'static str = "web_archive";
    const TTL: Duration = Duration::from_secs(microb_cache::MONTH.as_secs() * 2);

    fn fetch(&self, domain: &str) -> Result<Self::Output, FetchError> {
        let url = format!(
            "http://web.archive.org/cdx/search/cdx?url=*.{domain}/*&output=text&fl=original&collapse=urlkey"
        );
        let body = get_text(&self.agent, &url, &[])?;
        Ok(parse_lines(&body))
    }
}

fn parse_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
