use axum::extract::State;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::user::PublicUser;
use crate::policy::Identity;
use crate::response::Envelope;
use crate::state::AppState;
use crate::users::profile::{self, ProfileRequest};

/// GET /api/users/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Envelope<PublicUser>, AppError> {
    let user = profile::get_profile(state.store.as_ref(), &identity).await?;
    Ok(Envelope::ok(user, "Profile retrieved successfully"))
}

/// PUT /api/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    identity: Identity,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<Envelope<PublicUser>, AppError> {
    let user = profile::update_profile(state.store.as_ref(), &identity, req).await?;
    Ok(Envelope::ok(user, "Profile updated successfully"))
}

/// GET /api/users
pub async fn handle_list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Envelope<Vec<PublicUser>>, AppError> {
    let users = profile::list_users(state.store.as_ref(), &identity).await?;
    Ok(Envelope::ok(users, "Users retrieved successfully"))
}
