use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::database::DatabaseError;

/// Application error type shared across services and routes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Credit or plan limits prevent the requested operation. Carries
    /// enough structure for the caller to render an upgrade prompt.
    #[error("insufficient access: {reason}")]
    InsufficientAccess {
        reason: String,
        credits_available: i32,
        credits_needed: i32,
        upgrade_required: bool,
    },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": msg }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "message": msg }),
            ),
            AppError::InsufficientAccess {
                reason,
                credits_available,
                credits_needed,
                upgrade_required,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                json!({
                    "error": "payment_required",
                    "message": reason,
                    "credits_available": credits_available,
                    "credits_needed": credits_needed,
                    "upgrade_required": upgrade_required,
                }),
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "upstream_error", "message": msg }),
            ),
            AppError::Config(_) | AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal_error", "message": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::InvalidInput("bad url".to_string());
        assert_eq!(err.to_string(), "invalid input: bad url");

        let err = AppError::NotFound("report abc".to_string());
        assert!(err.to_string().contains("report abc"));

        let err = AppError::InsufficientAccess {
            reason: "not enough credits".to_string(),
            credits_available: 1,
            credits_needed: 3,
            upgrade_required: true,
        };
        assert!(err.to_string().contains("not enough credits"));
    }

    #[test]
    fn test_error_status_codes() {
        let response = AppError::InvalidInput("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::InsufficientAccess {
            reason: "x".to_string(),
            credits_available: 0,
            credits_needed: 1,
            upgrade_required: true,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let response = AppError::Upstream("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::Internal("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_error_conversion() {
        let db_err = DatabaseError::NotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::Database(_)));
    }
}
