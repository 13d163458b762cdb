use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::{StoreError, UniqueKey};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateEmail,

    #[error("You have already applied to this job")]
    DuplicateApplication,

    #[error("Resume file is required")]
    MissingResume,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authorized, no token")]
    NoToken,

    #[error("Not authorized, token failed")]
    TokenFailed,

    #[error("Not authorized, User not found")]
    UserNotFound,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateEmail
            | AppError::DuplicateApplication
            | AppError::MissingResume => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::NoToken
            | AppError::TokenFailed
            | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(UniqueKey::UserEmail) => AppError::DuplicateEmail,
            StoreError::Conflict(UniqueKey::ApplicationPair) => AppError::DuplicateApplication,
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                "A storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "data": null,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateApplication.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TokenFailed.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Job not found".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Storage("disk".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflicts_map_to_duplicates() {
        assert!(matches!(
            AppError::from(StoreError::Conflict(UniqueKey::UserEmail)),
            AppError::DuplicateEmail
        ));
        assert!(matches!(
            AppError::from(StoreError::Conflict(UniqueKey::ApplicationPair)),
            AppError::DuplicateApplication
        ));
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let response = AppError::Storage("/srv/uploads is read-only".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
