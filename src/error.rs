use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

/// Application error type shared by the gateway and the backend services.
///
/// Client-class errors (4xx) keep their message in the response body.
/// Server-class errors (5xx) are all collapsed into one generic body, so a
/// caller cannot tell an open circuit from a crashed backend; the details go
/// to the logs instead.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication Errors =====
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // ===== Client Errors =====
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ===== Server Errors =====
    #[error("{service} service unavailable")]
    Unavailable {
        service: &'static str,
        fallback: serde_json::Value,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable { .. }
            | AppError::Internal(_)
            | AppError::Hash(_)
            | AppError::Json(_)
            | AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message, safe to put in a response body
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Jwt(_) => "Invalid or expired token".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unavailable { .. } => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Hash(_) => "HASH_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log with severity matching the status class
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_code = %code, "Request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self, error_code = %code, "Request rejected");
        } else {
            tracing::debug!(error = %self, error_code = %code, "Request rejected");
        }
    }

    // Convenience constructors

    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        // The wire shape is a bare {"error": message}; error codes stay in
        // the logs. Every 5xx collapses to the same message inside
        // user_message, so internals never leak.
        let status = self.status_code();
        let body = json!({ "error": self.user_message() });

        (status, axum::Json(body)).into_response()
    }
}
