//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "redis" },
///     "click_queue": { "status": "ok", "message": "Free slots: 10000" },
///     "event_buffer": { "status": "ok", "message": "Pending events: 42" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, event_buffer) = tokio::join!(
        check_database(&state),
        check_cache(&state),
        check_event_buffer(&state),
    );
    let click_queue = check_click_queue(&state);

    let all_healthy =
        database.is_ok() && cache.is_ok() && click_queue.is_ok() && event_buffer.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            click_queue,
            event_buffer,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.resolver.check_storage().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.resolver.check_cache().await {
        CheckStatus::ok(state.cache_backend)
    } else {
        CheckStatus::error(format!("{} unreachable", state.cache_backend))
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_sender.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!("Free slots: {}", state.click_sender.capacity()))
    }
}

async fn check_event_buffer(state: &AppState) -> CheckStatus {
    match state.click_service.pending().await {
        Ok(pending) => CheckStatus::ok(format!("Pending events: {}", pending)),
        Err(e) => CheckStatus::error(format!("Event buffer error: {}", e)),
    }
}
