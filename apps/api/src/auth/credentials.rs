//! Credential store: registration, password login, and identity lookup.

use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::store::Store;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub company_name: Option<String>,
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and somewhere in the
/// domain a dot with at least one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn validate(reg: &Registration) -> Result<(), AppError> {
    if reg.name.trim().is_empty() || reg.email.trim().is_empty() || reg.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide all required fields".to_string(),
        ));
    }
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !is_valid_email(reg.email.trim()) {
        return Err(AppError::Validation(
            "Please provide a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Creates exactly one user. The email must be unused (exact, case-sensitive
/// match); `company_name` is kept only for employers.
pub async fn register(store: &dyn Store, reg: Registration) -> Result<User, AppError> {
    validate(&reg)?;

    let email = reg.email.trim().to_string();
    if store.user_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let company_name = match reg.role {
        Role::Employer => reg
            .company_name
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        _ => None,
    };

    // a concurrent registration that slipped past the check above still hits
    // the store's unique email constraint and maps to DuplicateEmail
    let user = store
        .insert_user(NewUser {
            name: reg.name.trim().to_string(),
            email,
            password_hash: hash_password(&reg.password)?,
            role: reg.role,
            company_name,
        })
        .await?;

    info!("Registered user {} as {}", user.id, user.role);
    Ok(user)
}

/// Same error whether the email is unknown or the password is wrong.
pub async fn verify_credentials(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = store
        .user_by_email(email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn find_by_id(store: &dyn Store, id: Uuid) -> Result<Option<User>, AppError> {
    Ok(store.user_by_id(id).await?)
}
