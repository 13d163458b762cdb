//! Axum extractors whose rejections render through `AppError`, so malformed
//! bodies and query strings still get the standard envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path ids that do not parse as UUIDs name nothing, so they surface as 404
/// with the same message a missing row would.
pub fn parse_id(raw: &str, not_found: &str) -> Result<uuid::Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(not_found.to_string()))
}
