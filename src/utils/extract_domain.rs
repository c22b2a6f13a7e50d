//! Host extraction from HTTP request headers.

use crate::AppError;
use axum::http::{HeaderMap, header};

/// Returns the raw `Host` header value, port included.
///
/// The raw form is what snapshot cache keys are built from, so a request to
/// `example.com:8080` and one to `example.com` use distinct cache entries.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the `Host` header is missing, empty or
/// not valid UTF-8.
pub fn extract_host_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    let host = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::bad_request("Missing Host header", serde_json::json!({})))?
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid Host header", serde_json::json!({})))?;

    if host.is_empty() {
        return Err(AppError::bad_request(
            "Empty Host header",
            serde_json::json!({}),
        ));
    }

    Ok(host.to_string())
}

/// Strips a trailing `:port` from a host.
///
/// Bracketed IPv6 literals keep their brackets (`[::1]:8080` → `[::1]`).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_port("example.com:3000"), "example.com");
/// assert_eq!(strip_port("[::1]"), "[::1]");
/// ```
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end_bracket) => &host[..=end_bracket],
            None => host,
        };
    }

    match host.rfind(':') {
        Some(colon) => &host[..colon],
        None => host,
    }
}
