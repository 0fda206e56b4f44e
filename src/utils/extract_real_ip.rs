//! Caller address extraction for trusted-subnet checks.

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Header set by the fronting proxy with the original client address.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Parses the `X-Real-IP` header.
///
/// Returns `None` when the header is missing, not UTF-8 or not an IP address.
/// The socket peer address is never consulted.
pub fn extract_real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
