//! Client address resolution for click attribution.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the client IP of a request.
///
/// With `behind_proxy`, the first valid address in `X-Forwarded-For` wins,
/// then `X-Real-IP`; otherwise (or if neither parses) the peer address is used.
/// Enable `behind_proxy` only behind a trusted reverse proxy: the headers are
/// client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> IpAddr {
    if behind_proxy
        && let Some(ip) = forwarded_for(headers).or_else(|| real_ip(headers))
    {
        return ip;
    }
    peer.ip()
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .and_then(|first| first.trim().parse().ok())
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
