//! Network address helpers
//!
//! Normalizes caller addresses so the allow-list comparison sees one
//! canonical form regardless of proxy hops or IPv4-mapped IPv6 notation.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Normalize an IP string: trim whitespace and strip the IPv4-mapped
/// IPv6 prefix (`::ffff:1.2.3.4` -> `1.2.3.4`).
pub fn normalize_ip(ip: &str) -> String {
    let trimmed = ip.trim();
    trimmed.strip_prefix("::ffff:").unwrap_or(trimmed).to_string()
}

/// The address the transport actually observed for this request.
///
/// Prefers the first entry of `x-forwarded-for` (the client as seen by the
/// outermost proxy), falling back to the socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            let ip = normalize_ip(first);
            if !ip.is_empty() {
                return Some(ip);
            }
        }
    }

    peer.map(|addr| normalize_ip(&addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ip_strips_mapped_prefix() {
        assert_eq!(normalize_ip("::ffff:10.0.0.1"), "10.0.0.1");
        assert_eq!(normalize_ip(" 192.168.1.5 "), "192.168.1.5");
        assert_eq!(normalize_ip("2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        let peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(
            client_ip(&headers, Some(peer)),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.4:1234".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), Some("192.0.2.4".to_string()));
        assert_eq!(client_ip(&headers, None), None);
    }
}
