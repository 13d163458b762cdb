//! Authorization policy: the single place that decides whether an identity may
//! perform an action.
//!
//! Two rules, applied in order:
//! 1. role capability, per action (`Action::required_role`)
//! 2. ownership, for job and application actions: the caller must be the job's
//!    employer, or an admin

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Role;

/// An authenticated actor, resolved from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // public
    Register,
    Login,
    BrowseJobs,
    ViewJob,
    // any authenticated identity
    ViewOwnProfile,
    UpdateOwnProfile,
    Apply,
    ListOwnApplications,
    // employer or admin
    CreateJob,
    ListOwnJobs,
    UpdateJob,
    DeleteJob,
    ViewJobApplications,
    SetApplicationStatus,
    // admin
    ListUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Public,
    Authenticated,
    Employer,
    Admin,
}

/// Ownership context of the resource an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Not looked up yet. Only the role gate applies.
    Unresolved,
    /// Owned by this user id (a job's employer).
    OwnedBy(Uuid),
    /// Owner no longer exists, e.g. an application whose job was deleted.
    Orphaned,
}

impl Action {
    pub fn required_role(self) -> RoleRequirement {
        match self {
            Action::Register | Action::Login | Action::BrowseJobs | Action::ViewJob => {
                RoleRequirement::Public
            }
            Action::ViewOwnProfile
            | Action::UpdateOwnProfile
            | Action::Apply
            | Action::ListOwnApplications => RoleRequirement::Authenticated,
            Action::CreateJob
            | Action::ListOwnJobs
            | Action::UpdateJob
            | Action::DeleteJob
            | Action::ViewJobApplications
            | Action::SetApplicationStatus => RoleRequirement::Employer,
            Action::ListUsers => RoleRequirement::Admin,
        }
    }

    fn is_ownership_scoped(self) -> bool {
        matches!(
            self,
            Action::UpdateJob
                | Action::DeleteJob
                | Action::ViewJobApplications
                | Action::SetApplicationStatus
        )
    }

    fn ownership_denial(self) -> &'static str {
        match self {
            Action::UpdateJob => "Not authorized to update this job",
            Action::DeleteJob => "Not authorized to delete this job",
            Action::ViewJobApplications => "Not authorized to view applications for this job",
            Action::SetApplicationStatus => "Not authorized to update this application",
            _ => "Not authorized",
        }
    }
}

impl RoleRequirement {
    fn admits(self, role: Role) -> bool {
        match self {
            RoleRequirement::Public | RoleRequirement::Authenticated => true,
            RoleRequirement::Employer => matches!(role, Role::Employer | Role::Admin),
            RoleRequirement::Admin => role == Role::Admin,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            RoleRequirement::Admin => "Not authorized as an admin. Admin only",
            _ => "Not authorized as an employer. Employer only",
        }
    }
}

/// Full decision for an authenticated caller, with the user-facing reason on denial.
pub fn authorize(identity: &Identity, action: Action, resource: Resource) -> Result<(), AppError> {
    let requirement = action.required_role();
    if !requirement.admits(identity.role) {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            ?action,
            "role denied"
        );
        return Err(AppError::Forbidden(requirement.denial().to_string()));
    }

    if action.is_ownership_scoped() {
        let owns = match resource {
            Resource::Unresolved => true,
            Resource::OwnedBy(owner) => owner == identity.id || identity.is_admin(),
            Resource::Orphaned => identity.is_admin(),
        };
        if !owns {
            tracing::warn!(user_id = %identity.id, ?action, "ownership denied");
            return Err(AppError::Forbidden(action.ownership_denial().to_string()));
        }
    }

    Ok(())
}

/// Boolean form of the policy, including unauthenticated callers.
pub fn allow(identity: Option<&Identity>, action: Action, resource: Resource) -> bool {
    match identity {
        None => action.required_role() == RoleRequirement::Public,
        Some(identity) => authorize(identity, action, resource).is_ok(),
    }
}
