use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::auth::credentials::find_by_id;
use crate::auth::token::TokenService;
use crate::errors::AppError;
use crate::policy::Identity;
use crate::state::AppState;
use crate::store::Store;

/// Bearer token from the `Authorization` header, if one is present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves a bearer token to an identity: signature and expiry first, then
/// the subject must still exist.
pub async fn authenticate(
    store: &dyn Store,
    tokens: &TokenService,
    token: Option<&str>,
) -> Result<Identity, AppError> {
    let token = token.ok_or(AppError::NoToken)?;
    let user_id = tokens.verify(token).map_err(|e| {
        tracing::warn!("token rejected: {e}");
        AppError::TokenFailed
    })?;
    let user = find_by_id(store, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Identity {
        id: user.id,
        role: user.role,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(state.store.as_ref(), &state.tokens, bearer_token(&parts.headers)).await
    }
}
