use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{ProfileUpdate, PublicUser, Role};
use crate::policy::{authorize, Action, Identity, Resource};
use crate::store::Store;

/// Body of `PUT /api/users/profile`. Email, role and password are not
/// accepted here; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl ProfileRequest {
    fn into_update(self, role: Role) -> Result<ProfileUpdate, AppError> {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        let name = trim(self.name);
        if name.as_deref() == Some("") {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
        Ok(ProfileUpdate {
            name,
            company_name: trim(self.company_name).filter(|_| role == Role::Employer),
            phone: trim(self.phone),
            bio: trim(self.bio),
            location: trim(self.location),
        })
    }
}

pub async fn get_profile(store: &dyn Store, identity: &Identity) -> Result<PublicUser, AppError> {
    authorize(identity, Action::ViewOwnProfile, Resource::Unresolved)?;
    let user = store
        .user_by_id(identity.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(PublicUser::from(&user))
}

pub async fn update_profile(
    store: &dyn Store,
    identity: &Identity,
    req: ProfileRequest,
) -> Result<PublicUser, AppError> {
    authorize(identity, Action::UpdateOwnProfile, Resource::Unresolved)?;
    let update = req.into_update(identity.role)?;
    let user = store
        .update_profile(identity.id, &update)
        .await?
        .ok_or(AppError::UserNotFound)?;
    info!("Profile updated for {}", identity.id);
    Ok(PublicUser::from(&user))
}

pub async fn list_users(store: &dyn Store, identity: &Identity) -> Result<Vec<PublicUser>, AppError> {
    authorize(identity, Action::ListUsers, Resource::Unresolved)?;
    let users = store.list_users().await?;
    Ok(users.iter().map(PublicUser::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{NewUser, User};
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, name: &str, role: Role) -> (User, Identity) {
        let user = store
            .insert_user(NewUser {
                name: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "hash".into(),
                role,
                company_name: (role == Role::Employer).then(|| "Acme".to_string()),
            })
            .await
            .unwrap();
        let identity = Identity {
            id: user.id,
            role: user.role,
        };
        (user, identity)
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let store = MemoryStore::new();
        let (_, me) = seed(&store, "jane", Role::JobSeeker).await;
        let updated = update_profile(
            &store,
            &me,
            ProfileRequest {
                bio: Some("  Rustacean ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Rustacean"));
        assert_eq!(updated.name, "jane");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(updated.role, Role::JobSeeker);
    }

    #[tokio::test]
    async fn test_company_name_only_for_employers() {
        let store = MemoryStore::new();
        let (_, seeker) = seed(&store, "jane", Role::JobSeeker).await;
        let (_, employer) = seed(&store, "acme", Role::Employer).await;
        let req = || ProfileRequest {
            company_name: Some("Globex".into()),
            ..Default::default()
        };

        let s = update_profile(&store, &seeker, req()).await.unwrap();
        assert_eq!(s.company_name, None);
        let e = update_profile(&store, &employer, req()).await.unwrap();
        assert_eq!(e.company_name.as_deref(), Some("Globex"));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = MemoryStore::new();
        let (_, me) = seed(&store, "jane", Role::JobSeeker).await;
        let err = update_profile(
            &store,
            &me,
            ProfileRequest {
                name: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get_profile(&store, &me).await.unwrap().name, "jane");
    }

    #[tokio::test]
    async fn test_list_users_admin_only() {
        let store = MemoryStore::new();
        let (_, seeker) = seed(&store, "jane", Role::JobSeeker).await;
        let (_, employer) = seed(&store, "acme", Role::Employer).await;
        let (_, admin) = seed(&store, "root", Role::Admin).await;

        for caller in [&seeker, &employer] {
            match list_users(&store, caller).await {
                Err(AppError::Forbidden(msg)) => {
                    assert_eq!(msg, "Not authorized as an admin. Admin only")
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(list_users(&store, &admin).await.unwrap().len(), 3);
    }
}
