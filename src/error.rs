use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::errors::ResolveError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    Gone { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound => AppError::not_found("Link not found", json!({})),
            ResolveError::Expired => {
                AppError::gone("Link has expired", json!({ "reason": "expired" }))
            }
            ResolveError::Inactive => {
                AppError::gone("Link is not active", json!({ "reason": "inactive" }))
            }
            // Storage details stay in the logs.
            ResolveError::Transient(_) => AppError::internal("Internal server error", json!({})),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Gone { message, details } => (StatusCode::GONE, "gone", message, details),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: ResolveError) -> StatusCode {
        AppError::from(e).into_response().status()
    }

    #[test]
    fn test_resolve_error_status_codes() {
        assert_eq!(status_of(ResolveError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ResolveError::Expired), StatusCode::GONE);
        assert_eq!(status_of(ResolveError::Inactive), StatusCode::GONE);
        assert_eq!(
            status_of(ResolveError::Transient("pool timed out".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transient_details_are_not_exposed() {
        let e = AppError::from(ResolveError::Transient("password=secret".to_string()));
        match e {
            AppError::Internal { message, details } => {
                assert!(!message.contains("secret"));
                assert_eq!(details, json!({}));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
