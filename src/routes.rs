//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`  - Health check: database, cache, click queue, event buffer
//! - `GET  /{code}`  - Short link redirect
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The redirect handler needs `ConnectInfo<SocketAddr>`, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
