//! Reduction of free-form input lines to cache keys.

use url::{Host, Url};

/// Error turning a line into a hostname.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// The line does not form a URL authority after prefix stripping.
    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        /// Trimmed input that failed to parse.
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// Extract the lowercase hostname from a URL-ish line.
///
/// Accepts bare hostnames, `host/path`, `host:port` and full `http(s)://`
/// URLs. One leading `http://`, `https://` and `www.` is removed (in that
/// order) before parsing, so `https://www.example.com/` and `example.com`
/// yield the same key. Blank input yields an empty string, which callers
/// treat as "nothing to do".
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidUrl`] if the remainder cannot be parsed
/// as the authority of an `http://` URL.
pub fn normalize_host(raw: &str) -> Result<String, NormalizeError> {
    let trimmed = raw.trim_matches(['\n', '\r', ' ', '\t']);
    let trimmed = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix("https://").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix("www.").unwrap_or(trimmed);
    let trimmed = trimmed.trim_matches(['\n', '\r', ' ', '\t', '/']);

    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let url = Url::parse(&format!("http://{trimmed}")).map_err(|source| {
        NormalizeError::InvalidUrl {
            input: trimmed.to_owned(),
            source,
        }
    })?;

    Ok(match url.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    })
}

/// Key function that uses the line itself, minus the line terminator.
#[allow(clippy::unnecessary_wraps)]
pub fn identity(raw: &str) -> Result<String, NormalizeError> {
    Ok(raw.trim_end_matches(['\n', '\r']).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(raw: &str) -> String {
        normalize_host(raw).unwrap()
    }

    #[test]
    fn test_prefixes_are_stripped() {
        assert_eq!(host("example.com"), "example.com");
        assert_eq!(host("http://example.com"), "example.com");
        assert_eq!(host("https://example.com/"), "example.com");
        assert_eq!(host("https://www.example.com"), "example.com");
        assert_eq!(host("www.example.com"), "example.com");
    }

    #[test]
    fn test_whitespace_path_and_port_are_dropped() {
        assert_eq!(host("  https://Example.COM/path?q=1\n"), "example.com");
        assert_eq!(host("example.com:8443/login"), "example.com");
        assert_eq!(host("\tsub.example.com//\r\n"), "sub.example.com");
    }

    #[test]
    fn test_www_stripped_only_once() {
        assert_eq!(host("www.www.example.com"), "www.example.com");
    }

    #[test]
    fn test_ip_hosts() {
        assert_eq!(host("http://127.0.0.1:8080/"), "127.0.0.1");
        assert_eq!(host("[::1]:443"), "::1");
    }

    #[test]
    fn test_blank_line_is_empty_key() {
        assert_eq!(host(""), "");
        assert_eq!(host("   \n"), "");
        assert_eq!(host("https:///"), "");
    }

    #[test]
    fn test_invalid_input() {
        let err = normalize_host("exa mple.com").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidUrl { .. }));
        assert!(normalize_host("[not-an-ip]").is_err());
    }

    #[test]
    fn test_identity_keeps_content() {
        assert_eq!(identity("site:example.com login\n").unwrap(), "site:example.com login");
        assert_eq!(identity("  spaced  ").unwrap(), "  spaced  ");
    }
}
