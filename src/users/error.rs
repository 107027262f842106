use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::repo::StoreError;

/// Failures surfaced by the user directory. Each maps to exactly one HTTP status.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DirectoryError {
    pub fn status(&self) -> StatusCode {
        match self {
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::Conflict(_) => StatusCode::CONFLICT,
            DirectoryError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DirectoryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Internal(_) | DirectoryError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            DirectoryError::Store(e) => {
                error!(error = %e, "user store failed");
                "Internal server error".to_string()
            }
            DirectoryError::Internal(e) => {
                error!(error = %e, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(DirectoryError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(DirectoryError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(DirectoryError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(DirectoryError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            DirectoryError::Store(StoreError::Missing(1)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_are_not_leaked_to_clients() {
        let res = DirectoryError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
