//! Client address resolution from proxy-forwarded headers

use axum::http::HeaderMap;

/// Resolve the originating client address: first entry of a comma-separated
/// `x-forwarded-for` list, else `x-real-ip`, else absent. There is no socket
/// fallback; a record without an address is still created.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Loopback and private-range check, by string prefix.
///
/// The `172.` prefix is intentionally broader than RFC 1918 (which only
/// reserves 172.16/12) - existing records were classified this way and the
/// classification is kept stable.
pub fn is_private_ip(ip: &str) -> bool {
    ip == "127.0.0.1"
        || ip == "::1"
        || ip.starts_with("192.168.")
        || ip.starts_with("10.")
        || ip.starts_with("172.")
}
