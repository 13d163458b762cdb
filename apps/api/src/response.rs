use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope shared by every endpoint: `{ success, data, message }`.
/// Failures use the same shape via `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: &'static str,
}

/// An `ApiResponse` paired with its HTTP status.
pub struct Envelope<T> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, message: &'static str) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: &'static str) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    fn with_status(status: StatusCode, data: T, message: &'static str) -> Self {
        Envelope {
            status,
            body: ApiResponse {
                success: true,
                data,
                message,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
