//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract client IP address from headers
///
/// `X-Forwarded-For` is only honoured behind reverse proxies we run. Each of
/// the `trusted_proxies` hops appends one entry on the right, so the client
/// address is the entry that many places from the end. Anything further left
/// was written by the client and is ignored. With no trusted proxies the
/// header is ignored entirely and the direct connection IP is used.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
/// * `trusted_proxies` - Number of reverse proxies in front of the server
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trusted_proxies: usize,
) -> Option<IpAddr> {
    if trusted_proxies == 0 {
        return direct_ip;
    }

    let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) else {
        return direct_ip;
    };

    let hops: Vec<&str> = xff.split(',').map(str::trim).collect();
    // Fewer hops than proxies: every entry was appended by one of ours
    let index = hops.len().saturating_sub(trusted_proxies);

    hops.get(index)
        .and_then(|hop| hop.parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn xff(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_xff_ignored_without_trusted_proxies() {
        let headers = xff("9.9.9.9");
        let direct: IpAddr = "5.5.5.5".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct), 0), Some(direct));
    }

    #[test]
    fn test_single_proxy_uses_appended_hop() {
        // Client forged 9.9.9.9, our proxy appended the real peer 5.5.5.5
        let headers = xff("9.9.9.9, 5.5.5.5");
        let proxy: IpAddr = "10.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(proxy), 1);
        assert_eq!(ip, Some("5.5.5.5".parse().unwrap()));
    }

    #[test]
    fn test_two_proxies() {
        let headers = xff("9.9.9.9, 5.5.5.5, 10.0.0.2");

        let ip = extract_client_ip(&headers, None, 2);
        assert_eq!(ip, Some("5.5.5.5".parse().unwrap()));
    }

    #[test]
    fn test_fewer_hops_than_proxies() {
        let headers = xff("5.5.5.5");

        let ip = extract_client_ip(&headers, None, 3);
        assert_eq!(ip, Some("5.5.5.5".parse().unwrap()));
    }

    #[test]
    fn test_garbage_hop_falls_back() {
        let headers = xff("unknown");
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct), 1), Some(direct));
    }

    #[test]
    fn test_missing_header_uses_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct), 1), Some(direct));
    }
}
