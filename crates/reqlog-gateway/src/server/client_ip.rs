//! Client address resolution behind proxies

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Checked in order, first usable value wins
const IP_HEADERS: &[&str] = &[
    "x-original-forwarded-for",
    "x-forwarded-for",
    "proxy-client-ip",
    "wl-proxy-client-ip",
    "x-real-ip",
];

/// Longest single IPv4 address
const MAX_SINGLE_IP_LEN: usize = 15;

fn usable(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case("unknown")
}

/// Resolve the caller's IP from proxy headers, falling back to the peer
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| usable(v))
    });

    match forwarded {
        Some(value) if value.len() > MAX_SINGLE_IP_LEN && value.contains(',') => value
            .split(',')
            .next()
            .map(|first| first.trim().to_string()),
        Some(value) => Some(value.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}
