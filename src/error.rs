use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

const TRY_AGAIN: &str = "The review platform is temporarily unavailable. Please try again in a few minutes.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Google Business Profile is not connected")]
    NotConnected,
    #[error("Upstream rate limit still exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("Upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("AI generation failed: {0}")]
    GenerationFailed(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal",
            AppError::NotConnected => "not_connected",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::UpstreamRejected { .. } => "upstream_rejected",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::QuotaExceeded(_) => "quota_exceeded",
            AppError::GenerationFailed(_) => "generation_failed",
            AppError::Unauthorized => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation",
            AppError::Internal | AppError::InternalWithMsg(_) => "internal",
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .and_then(|db_err| db_err.code())
                // 2067 = SQLite Unique Constraint
                // 23505 = PostgreSQL Unique Violation
                .map(|code| code == "2067" || code == "23505")
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unique_violation() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "conflict", "message": "Resource already exists (duplicate entry)" })),
            )
                .into_response();
        }

        let (status, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotConnected => (
                StatusCode::PRECONDITION_FAILED,
                "Google Business Profile is not connected. Connect your account in Settings to continue.".to_string(),
            ),
            AppError::QuotaExceeded(reason) => (StatusCode::PAYMENT_REQUIRED, reason.clone()),
            AppError::RateLimited { attempts } => {
                warn!("Upstream rate limit exhausted after {} attempts", attempts);
                (StatusCode::SERVICE_UNAVAILABLE, TRY_AGAIN.to_string())
            }
            AppError::UpstreamRejected { status, message } => {
                error!("Upstream rejected request. Status: {}, Message: {}", status, message);
                (StatusCode::BAD_GATEWAY, TRY_AGAIN.to_string())
            }
            AppError::GenerationFailed(cause) => {
                error!("AI generation failed: {}", cause);
                (
                    StatusCode::BAD_GATEWAY,
                    "We couldn't generate a response right now. Please try again.".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message
        }));

        (status, body).into_response()
    }
}
