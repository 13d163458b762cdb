use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::{EmployerProfile, EmployerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type")]
pub enum JobType {
    #[default]
    #[sqlx(rename = "Full-time")]
    #[serde(rename = "Full-time")]
    FullTime,
    #[sqlx(rename = "Part-time")]
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full-time" => Ok(JobType::FullTime),
            "Part-time" => Ok(JobType::PartTime),
            "Contract" => Ok(JobType::Contract),
            "Internship" => Ok(JobType::Internship),
            other => Err(format!("'{other}' is not a valid job type")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("'{other}' is not a valid job status")),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub salary: Option<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub requirements: Vec<String>,
    #[serde(rename = "employerId")]
    pub employer_id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every mutable field of a job, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFields {
    pub title: String,
    pub description: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: JobType,
    pub requirements: Vec<String>,
    pub status: JobStatus,
}

impl From<&Job> for JobFields {
    fn from(job: &Job) -> Self {
        JobFields {
            title: job.title.clone(),
            description: job.description.clone(),
            company: job.company.clone(),
            category: job.category.clone(),
            location: job.location.clone(),
            salary: job.salary.clone(),
            job_type: job.job_type,
            requirements: job.requirements.clone(),
            status: job.status,
        }
    }
}

pub struct NewJob {
    pub employer_id: Uuid,
    pub fields: JobFields,
}

/// Case-insensitive substring filters for the public listing. Absent filters
/// match everything; present ones are ANDed.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }
        contains(&job.title, &self.title)
            && contains(&job.category, &self.category)
            && contains(&job.location, &self.location)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub employer: Option<EmployerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub employer: Option<EmployerProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub jobs: Vec<JobListing>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// `{ id, title, company }`, attached to a single application.
#[derive(Debug, Clone, Serialize)]
pub struct JobBrief {
    pub id: Uuid,
    pub title: String,
    pub company: String,
}

impl From<&Job> for JobBrief {
    fn from(job: &Job) -> Self {
        JobBrief {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
        }
    }
}

/// Job fields shown in an applicant's own application list.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub category: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        JobSummary {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            category: job.category.clone(),
            job_type: job.job_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, category: &str, location: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "d".into(),
            company: "c".into(),
            category: category.into(),
            location: location.into(),
            salary: None,
            job_type: JobType::FullTime,
            requirements: vec![],
            employer_id: Uuid::new_v4(),
            status: JobStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_type_serializes_with_hyphen() {
        assert_eq!(
            serde_json::to_string(&JobType::PartTime).unwrap(),
            "\"Part-time\""
        );
        assert_eq!("Full-time".parse::<JobType>().unwrap(), JobType::FullTime);
        assert!("full-time".parse::<JobType>().is_err());
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let j = job("Senior React Developer", "Technology", "Remote");
        let f = JobFilter {
            title: Some("react".into()),
            ..Default::default()
        };
        assert!(f.matches(&j));
    }

    #[test]
    fn test_filters_are_anded() {
        let j = job("React Developer", "Technology", "New York");
        let f = JobFilter {
            title: Some("React".into()),
            location: Some("remote".into()),
            ..Default::default()
        };
        assert!(!f.matches(&j));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(JobFilter::default().matches(&job("a", "b", "c")));
    }

    #[test]
    fn test_listing_flattens_job_fields() {
        let listing = JobListing {
            job: job("Backend", "Technology", "Remote"),
            employer: None,
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["title"], "Backend");
        assert_eq!(value["type"], "Full-time");
        assert_eq!(value["status"], "active");
        assert!(value["employer"].is_null());
    }
}
