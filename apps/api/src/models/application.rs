use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::{JobBrief, JobSummary};
use crate::models::user::{ApplicantProfile, ApplicantSummary};

/// Review state of an application. Any value may follow any other; only who
/// may set it is restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("'{other}' is not a valid application status")),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    /// Storage reference of the uploaded resume, never the bytes.
    pub resume: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub resume: String,
    pub cover_letter: Option<String>,
}

/// Returned after applying and after a status change.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobBrief>,
    pub applicant: Option<ApplicantSummary>,
}

/// One row of the caller's own application list.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedApplication {
    #[serde(flatten)]
    pub application: Application,
    /// `None` once the job has been deleted.
    pub job: Option<JobSummary>,
}

/// One row of a job owner's applicant list.
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedApplication {
    #[serde(flatten)]
    pub application: Application,
    pub applicant: Option<ApplicantProfile>,
}
