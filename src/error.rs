use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application error taxonomy. Every fallible service and repository call
/// funnels into this type; the `IntoResponse` impl decides the HTTP shape.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input.
    #[error("{0}")]
    Validation(String),

    /// Bad or missing credential, token, or password. Login failures use a
    /// deliberately generic message to avoid account enumeration.
    #[error("{0}")]
    Unauthenticated(String),

    /// Email or Google subject id already bound in an incompatible way,
    /// including the loser of a concurrent-creation race.
    #[error("{0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    /// Blob store unconfigured or unreachable.
    #[error("{0}")]
    Storage(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return ApiError::Conflict("Record already exists, retry the request".into());
            }
        }
        ApiError::Internal(e.into())
    }
}
