//! Shared blocking HTTP plumbing for engine clients.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use ureq::Agent;
use url::Url;

use crate::FetchError;

/// Largest response body read into memory.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Characters of an error body kept in [`FetchError::Status`].
const ERROR_BODY_CHARS: usize = 512;

/// Query parameters whose values never appear in errors or logs.
const SECRET_PARAMS: &[&str] = &["key"];

/// RFC 3986 unreserved characters: A-Z a-z 0-9 - . _ ~
const PATH_SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single URL path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_SET).to_string()
}

/// Create HTTP agent with the specified timeout.
///
/// Status codes are checked by the caller, so error statuses come back as
/// normal responses. The agent is cheap to clone and pools connections.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// GET `url` and return the body of a 200 response.
pub(crate) fn get_text(
    agent: &Agent,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String, FetchError> {
    tracing::debug!("GET {}", redact(url));

    let mut request = agent.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.call().map_err(|source| FetchError::Http {
        url: redact(url),
        source,
    })?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status != 200 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(FetchError::Status {
            url: redact(url),
            status,
            body: error_body.chars().take(ERROR_BODY_CHARS).collect(),
        });
    }

    body.with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_string()
        .map_err(|source| FetchError::Http {
            url: redact(url),
            source,
        })
}

/// GET `url` and decode a 200 response as JSON.
pub(crate) fn get_json<T: DeserializeOwned>(
    agent: &Agent,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T, FetchError> {
    let text = get_text(agent, url, headers)?;
    decode(url, &text)
}

/// Decode a JSON body fetched from `url`.
pub(crate) fn decode<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, FetchError> {
    serde_json::from_str(text).map_err(|source| FetchError::Decode {
        url: redact(url),
        source,
    })
}

/// Replace secret query parameter values in `raw`.
pub(crate) fn redact(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_owned();
    };
    if !url
        .query_pairs()
        .any(|(name, _)| SECRET_PARAMS.contains(&name.as_ref()))
    {
        return raw.to_owned();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if SECRET_PARAMS.contains(&name.as_ref()) {
                "REDACTED".to_owned()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment_keeps_hostnames() {
        assert_eq!(encode_segment("sub.example-1.com"), "sub.example-1.com");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_redact_hides_api_key() {
        let redacted = redact("https://www.googleapis.com/customsearch/v1?key=s3cr3t&cx=abc&q=x");
        assert!(!redacted.contains("s3cr3t"), "{redacted}");
        assert!(redacted.contains("key=REDACTED"), "{redacted}");
        assert!(redacted.contains("cx=abc"), "{redacted}");
    }

    #[test]
    fn test_redact_leaves_plain_urls_untouched() {
        let url = "https://crt.sh/?q=*.example.com&output=json";
        assert_eq!(redact(url), url);
        assert_eq!(redact("not a url"), "not a url");
    }

    #[test]
    fn test_decode_error_carries_url() {
        let err = decode::<Vec<String>>("https://crt.sh/?q=x", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(err.to_string().contains("crt.sh"));
    }
}
