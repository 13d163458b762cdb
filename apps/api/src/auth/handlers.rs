use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::credentials::{find_by_id, register, verify_credentials, Registration};
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::user::{PublicUser, Role, User};
use crate::policy::Identity;
use crate::response::Envelope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_name: Option<String>,
    pub token: String,
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        company_name: user.company_name,
        token,
    })
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Envelope<AuthResponse>, AppError> {
    let role = match req.role.as_deref().filter(|r| !r.is_empty()) {
        None => Role::JobSeeker,
        Some(raw) => raw.parse::<Role>().map_err(AppError::Validation)?,
    };
    if role == Role::Admin && !state.config.allow_admin_signup {
        return Err(AppError::Validation(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let user = register(
        state.store.as_ref(),
        Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            role,
            company_name: req.company_name,
        },
    )
    .await?;

    Ok(Envelope::created(
        auth_response(&state, user)?,
        "User registered successfully",
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Envelope<AuthResponse>, AppError> {
    let user = verify_credentials(state.store.as_ref(), &req.email, &req.password).await?;
    Ok(Envelope::ok(auth_response(&state, user)?, "Login successful"))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Envelope<PublicUser>, AppError> {
    let user = find_by_id(state.store.as_ref(), identity.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Envelope::ok(
        PublicUser::from(&user),
        "User retrieved successfully",
    ))
}
