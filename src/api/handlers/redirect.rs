//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;
use tracing::{debug, error};

use crate::api::dto::utm::UtmParams;
use crate::domain::click_event::ClickEvent;
use crate::domain::click_forwarder::try_dispatch;
use crate::domain::errors::ResolveError;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;
use crate::utils::extract_domain::extract_host_from_headers;
use crate::utils::ip_hash::hash_ip;

/// Redirects a short code to its destination.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Take the raw host from the `Host` header
/// 2. Resolve `(host, code)` through the snapshot cache, falling back to PostgreSQL
/// 3. Hand a click event (hashed IP, User-Agent, Referer, UTM) to the click channel
/// 4. Return `302 Found` with `Location`
///
/// The click is never awaited: a full queue drops it and the redirect still
/// succeeds.
///
/// # Errors
///
/// - 400 if the `Host` header is missing or invalid
/// - 404 if the code does not exist in the host's scope
/// - 410 if the link is inactive or expired
/// - 500 if the database is unavailable
pub async fn redirect_handler(
    Path(code): Path<String>,
    Query(utm): Query<UtmParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let host = extract_host_from_headers(&headers)?;

    let resolved = match state.resolver.resolve(&host, &code).await {
        Ok(resolved) => resolved,
        Err(ResolveError::Transient(reason)) => {
            error!(host = %host, code = %code, reason = %reason, "Redirect failed");
            return Err(ResolveError::Transient(reason).into());
        }
        Err(e) => {
            debug!(host = %host, code = %code, outcome = %e, "Redirect refused");
            return Err(e.into());
        }
    };

    let ip = client_ip(&headers, addr, state.behind_proxy).to_string();
    let event = ClickEvent::new(
        resolved.link_id,
        hash_ip(&state.ip_hash_salt, &ip),
        ip,
        header_str(&headers, header::USER_AGENT),
        header_str(&headers, header::REFERER),
    )
    .with_utm(utm.utm_source, utm.utm_medium, utm.utm_campaign);

    let _ = try_dispatch(&state.click_sender, event);

    Ok((StatusCode::FOUND, [(header::LOCATION, resolved.url)]))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
