use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed set of roles. Capability checks live in `crate::policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_seeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("'{other}' is not a valid role")),
        }
    }
}

/// Stored user record. Holds the password hash, so it is never serialized;
/// responses go through [`PublicUser`] or one of the summaries.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Only ever set when `role == Employer`.
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub company_name: Option<String>,
}

/// Profile fields a user may change about themselves. `None` leaves the
/// stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        PublicUser {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            company_name: u.company_name.clone(),
            phone: u.phone.clone(),
            bio: u.bio.clone(),
            location: u.location.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Employer fields embedded in job listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerSummary {
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
}

impl From<&User> for EmployerSummary {
    fn from(u: &User) -> Self {
        EmployerSummary {
            id: u.id,
            name: u.name.clone(),
            company_name: u.company_name.clone(),
            email: u.email.clone(),
        }
    }
}

/// Employer fields embedded in a single job's detail view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl From<&User> for EmployerProfile {
    fn from(u: &User) -> Self {
        EmployerProfile {
            id: u.id,
            name: u.name.clone(),
            company_name: u.company_name.clone(),
            email: u.email.clone(),
            bio: u.bio.clone(),
            location: u.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for ApplicantSummary {
    fn from(u: &User) -> Self {
        ApplicantSummary {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

/// Applicant fields shown to the owner of a job when reviewing applications.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl From<&User> for ApplicantProfile {
    fn from(u: &User) -> Self {
        ApplicantProfile {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            bio: u.bio.clone(),
            location: u.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::JobSeeker, Role::Employer, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("recruiter".parse::<Role>().is_err());
        assert!("Employer".parse::<Role>().is_err());
    }

    #[test]
    fn test_public_user_has_no_password() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::JobSeeker,
            company_name: None,
            phone: None,
            bio: None,
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"role\":\"job_seeker\""));
    }
}
