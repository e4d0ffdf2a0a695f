//! Validation of user-supplied server URLs.
//!
//! Only public `https` endpoints are accepted so the bot cannot be pointed at
//! its own host or internal network.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

/// Why a server URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerUrlError {
    #[error("empty url")]
    Empty,

    #[error("invalid url: {0:?}")]
    Invalid(String),

    #[error("only https is allowed")]
    NotHttps,

    #[error("localhost is not allowed")]
    Localhost,

    #[error("host resolves to disallowed ip: {0}")]
    DisallowedIp(IpAddr),
}

/// A syntactically valid server URL, before DNS checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedServerUrl {
    /// `https://host[:port]`
    pub normalized: String,
    host: Host<String>,
    port: u16,
}

/// Check scheme and host, and normalize to `https://host[:port]`.
///
/// IP literals are checked against the disallowed ranges here; host names
/// are resolved by [`validate_server_url`].
pub fn parse_server_url(raw: &str) -> Result<ParsedServerUrl, ServerUrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServerUrlError::Empty);
    }

    let parsed = Url::parse(raw).map_err(|_| ServerUrlError::Invalid(raw.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(ServerUrlError::NotHttps);
    }
    let host = parsed
        .host()
        .map(|h| h.to_owned())
        .ok_or_else(|| ServerUrlError::Invalid(raw.to_string()))?;

    match &host {
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_ascii_lowercase();
            if name.is_empty() {
                return Err(ServerUrlError::Invalid(raw.to_string()));
            }
            if name == "localhost" || name == "localhost.localdomain" {
                return Err(ServerUrlError::Localhost);
            }
        }
        Host::Ipv4(ip) => check_ip(IpAddr::V4(*ip))?,
        Host::Ipv6(ip) => check_ip(IpAddr::V6(*ip))?,
    }

    let host_str = parsed.host_str().unwrap_or_default();
    let normalized = match parsed.port() {
        Some(port) => format!("https://{}:{}", host_str, port),
        None => format!("https://{}", host_str),
    };

    Ok(ParsedServerUrl {
        normalized,
        port: parsed.port_or_known_default().unwrap_or(443),
        host,
    })
}

/// Full validation: [`parse_server_url`] plus a DNS check of host names.
///
/// A host that does not resolve is accepted; every address it does resolve
/// to must be public.
pub async fn validate_server_url(raw: &str) -> Result<String, ServerUrlError> {
    let parsed = parse_server_url(raw)?;

    if let Host::Domain(name) = &parsed.host {
        match tokio::net::lookup_host((name.as_str(), parsed.port)).await {
            Ok(addrs) => {
                for addr in addrs {
                    check_ip(addr.ip())?;
                }
            }
            Err(e) => debug!(host = %name, "Server host did not resolve: {}", e),
        }
    }

    Ok(parsed.normalized)
}

fn check_ip(ip: IpAddr) -> Result<(), ServerUrlError> {
    if is_disallowed_ip(ip) {
        Err(ServerUrlError::DisallowedIp(ip))
    } else {
        Ok(())
    }
}

/// Loopback, private, link-local, multicast or unspecified addresses.
pub fn is_disallowed_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_disallowed_v4(v4),
            None => is_disallowed_v6(v6),
        },
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_to_origin() {
        let parsed = parse_server_url("  https://Keep.Example.com/some/path?q=1#frag ").unwrap();
        assert_eq!(parsed.normalized, "https://keep.example.com");

        let parsed = parse_server_url("https://keep.example.com:8443/").unwrap();
        assert_eq!(parsed.normalized, "https://keep.example.com:8443");
    }

    #[test]
    fn test_rejects_non_https_and_garbage() {
        assert_eq!(parse_server_url(""), Err(ServerUrlError::Empty));
        assert_eq!(
            parse_server_url("http://keep.example.com"),
            Err(ServerUrlError::NotHttps)
        );
        assert!(matches!(
            parse_server_url("keep.example.com"),
            Err(ServerUrlError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_localhost_names() {
        assert_eq!(
            parse_server_url("https://localhost"),
            Err(ServerUrlError::Localhost)
        );
        assert_eq!(
            parse_server_url("https://LOCALHOST.localdomain./"),
            Err(ServerUrlError::Localhost)
        );
    }

    #[test]
    fn test_rejects_private_ip_literals() {
        for url in [
            "https://127.0.0.1",
            "https://10.1.2.3",
            "https://172.16.0.1",
            "https://192.168.1.1",
            "https://169.254.169.254",
            "https://0.0.0.0",
            "https://[::1]",
            "https://[fd00::1]",
            "https://[fe80::1]",
            "https://[::ffff:192.168.0.1]",
        ] {
            assert!(
                matches!(parse_server_url(url), Err(ServerUrlError::DisallowedIp(_))),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn test_public_ip_literal_is_accepted() {
        assert_eq!(
            parse_server_url("https://93.184.216.34").unwrap().normalized,
            "https://93.184.216.34"
        );
        assert_eq!(
            parse_server_url("https://[2606:2800:220:1::]").unwrap().normalized,
            "https://[2606:2800:220:1::]"
        );
    }

    #[test]
    fn test_disallowed_ranges() {
        assert!(is_disallowed_ip("224.0.0.1".parse().unwrap()));
        assert!(is_disallowed_ip("ff02::1".parse().unwrap()));
        assert!(!is_disallowed_ip("8.8.8.8".parse().unwrap()));
        assert!(!is_disallowed_ip("2001:4860:4860::8888".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_validate_accepts_ip_literal_without_dns() {
        assert_eq!(
            validate_server_url("https://93.184.216.34/x").await.unwrap(),
            "https://93.184.216.34"
        );
        assert!(validate_server_url("https://10.0.0.1").await.is_err());
    }
}
