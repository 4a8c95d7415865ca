use std::net::IpAddr;

use thiserror::Error;
use url::{Host, Url};

/// Reasons a URL is rejected as a feed source.
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validate a URL for use as a feed source.
///
/// SSRF guard: rejects non-HTTP(S) schemes, localhost, loopback,
/// link-local and private ranges (v4 and v6). Returns the parsed [`Url`]
/// so callers don't parse twice.
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if let Some(host) = url.host() {
        match host {
            Host::Domain(domain) if domain.eq_ignore_ascii_case("localhost") => {
                return Err(UrlValidationError::Localhost);
            }
            Host::Domain(_) => {}
            Host::Ipv4(v4) => reject_restricted_ip(IpAddr::V4(v4))?,
            Host::Ipv6(v6) => reject_restricted_ip(IpAddr::V6(v6))?,
        }
    }

    Ok(url)
}

fn reject_restricted_ip(ip: IpAddr) -> Result<(), UrlValidationError> {
    if ip.is_loopback() {
        return Err(UrlValidationError::Localhost);
    }

    let restricted = match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    };

    if restricted {
        return Err(UrlValidationError::PrivateIp(ip.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_feed_urls_pass_through_parsed() {
        let url = validate_url("https://example.com/feed.xml").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/feed.xml");

        // Ports and public IPs are fine
        assert!(validate_url("http://news.example.org:8080/rss").is_ok());
        assert!(validate_url("http://93.184.216.34/rss").is_ok());
    }

    #[test]
    fn test_rejected_scheme_named_in_error() {
        match validate_url("file:///etc/passwd") {
            Err(UrlValidationError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "file"),
            other => panic!("expected UnsupportedScheme, got {:?}", other),
        }
        assert!(matches!(
            validate_url("ftp://example.com/feed"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_loopback_in_any_spelling_rejected() {
        for url in [
            "http://localhost/feed",
            "http://LOCALHOST/feed",
            "http://127.0.0.1/feed",
            "http://127.9.9.9/feed",
            "http://[::1]/feed",
        ] {
            assert!(
                matches!(validate_url(url), Err(UrlValidationError::Localhost)),
                "{url} should be rejected as localhost"
            );
        }
    }

    #[test]
    fn test_private_and_link_local_ranges_rejected() {
        for url in [
            "http://10.0.0.1:3000/feed",
            "http://172.16.0.1/feed",
            "http://192.168.1.1/feed",
            "http://169.254.1.1/feed",
            "http://0.0.0.0/feed",
            "http://[fe80::1]/feed",
            "http://[fd12:3456::1]/feed",
            "http://[::]/feed",
        ] {
            assert!(
                matches!(validate_url(url), Err(UrlValidationError::PrivateIp(_))),
                "{url} should be rejected as private"
            );
        }
    }

    #[test]
    fn test_unparseable_input_is_invalid_url() {
        assert!(matches!(
            validate_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }
}
