use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid stage selection: {0}")]
    InvalidStages(String),

    #[error("Invalid stage transition: {0}")]
    InvalidTransition(String),

    #[error("Stale stage: {0}")]
    StaleStage(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Transition and staleness failures are conflicts the caller can resolve
    /// by re-fetching progress and retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::InvalidTransition(_) | Error::StaleStage(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::InvalidStages(_) | Error::Validation(_) => "validation_error",
            Error::InvalidTransition(_) => "invalid_transition",
            Error::StaleStage(_) => "stale_stage",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let retryable = self.is_retryable();
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Error::InvalidStages(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::InvalidTransition(msg) => (StatusCode::CONFLICT, msg),
            Error::StaleStage(msg) => (StatusCode::CONFLICT, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Database(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            other => {
                tracing::error!(error = %other, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
            "retryable": retryable,
        }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::BadRequest(
                "Referenced account or record does not exist; register with POST /api/users first"
                    .to_string(),
            ),
            other => Error::Database(other),
        }
    }
}
