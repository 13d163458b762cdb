//! Job registry: public listing and detail, plus owner-scoped create, update
//! and delete.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{
    Job, JobDetail, JobFields, JobFilter, JobListing, JobPage, JobStatus, JobType, NewJob,
};
use crate::models::user::{EmployerProfile, EmployerSummary};
use crate::policy::{authorize, Action, Identity, Resource};
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `requirements` may arrive as one string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Requirements {
    One(String),
    Many(Vec<String>),
}

impl From<Requirements> for Vec<String> {
    fn from(r: Requirements) -> Self {
        match r {
            Requirements::One(s) if s.trim().is_empty() => Vec::new(),
            Requirements::One(s) => vec![s],
            Requirements::Many(list) => list,
        }
    }
}

/// Create body and update patch share this shape: every field optional at the
/// wire level, completeness checked after merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub requirements: Option<Requirements>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl JobQuery {
    fn filter(&self) -> JobFilter {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
        JobFilter {
            title: clean(&self.title),
            category: clean(&self.category),
            location: clean(&self.location),
        }
    }

    /// `(page, limit)` with values below 1 raised to 1 and `limit` capped.
    fn paging(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

/// Applies `input` on top of `base` (or nothing, for a create) and validates
/// the whole result.
fn merge(base: Option<JobFields>, input: JobInput) -> Result<JobFields, AppError> {
    fn text(new: Option<String>, old: Option<&String>) -> String {
        new.or_else(|| old.cloned())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    let mut missing = Vec::new();
    let mut required = |name: &'static str, value: String| {
        if value.is_empty() {
            missing.push(name);
        }
        value
    };

    let b = base.as_ref();
    let fields = JobFields {
        title: required("title", text(input.title, b.map(|b| &b.title))),
        description: required(
            "description",
            text(input.description, b.map(|b| &b.description)),
        ),
        company: required("company", text(input.company, b.map(|b| &b.company))),
        category: required("category", text(input.category, b.map(|b| &b.category))),
        location: required("location", text(input.location, b.map(|b| &b.location))),
        salary: match input.salary {
            Some(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            None => b.and_then(|b| b.salary.clone()),
        },
        job_type: match input.job_type {
            Some(t) => t.trim().parse::<JobType>().map_err(AppError::Validation)?,
            None => b.map(|b| b.job_type).unwrap_or_default(),
        },
        requirements: match input.requirements {
            Some(r) => r.into(),
            None => b.map(|b| b.requirements.clone()).unwrap_or_default(),
        },
        status: match input.status {
            Some(s) => s.trim().parse::<JobStatus>().map_err(AppError::Validation)?,
            None => b.map(|b| b.status).unwrap_or_default(),
        },
    };

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required job fields: {}",
            missing.join(", ")
        )));
    }
    Ok(fields)
}

async fn load(store: &dyn Store, id: Uuid) -> Result<Job, AppError> {
    store
        .job_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

/// Active jobs only, newest first, offset-paginated.
pub async fn list(store: &dyn Store, query: &JobQuery) -> Result<JobPage, AppError> {
    let (page, limit) = query.paging();
    let (jobs, total) = store
        .search_active_jobs(&query.filter(), (page - 1).saturating_mul(limit), limit)
        .await?;

    let mut employer_ids: Vec<Uuid> = jobs.iter().map(|j| j.employer_id).collect();
    employer_ids.sort_unstable();
    employer_ids.dedup();
    let employers: HashMap<Uuid, EmployerSummary> = store
        .users_by_ids(&employer_ids)
        .await?
        .iter()
        .map(|u| (u.id, EmployerSummary::from(u)))
        .collect();

    let jobs = jobs
        .into_iter()
        .map(|job| JobListing {
            employer: employers.get(&job.employer_id).cloned(),
            job,
        })
        .collect();

    Ok(JobPage {
        jobs,
        total,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
    })
}

/// Any status; closed jobs stay reachable by id.
pub async fn get_by_id(store: &dyn Store, id: Uuid) -> Result<JobDetail, AppError> {
    let job = load(store, id).await?;
    let employer = store
        .user_by_id(job.employer_id)
        .await?
        .map(|u| EmployerProfile::from(&u));
    Ok(JobDetail { job, employer })
}

/// The caller becomes the employer regardless of the input.
pub async fn create(store: &dyn Store, identity: &Identity, input: JobInput) -> Result<Job, AppError> {
    authorize(identity, Action::CreateJob, Resource::Unresolved)?;
    let fields = merge(None, input)?;
    let job = store
        .insert_job(NewJob {
            employer_id: identity.id,
            fields,
        })
        .await?;
    info!("Job {} created by {}", job.id, identity.id);
    Ok(job)
}

pub async fn update(
    store: &dyn Store,
    identity: &Identity,
    id: Uuid,
    patch: JobInput,
) -> Result<Job, AppError> {
    authorize(identity, Action::UpdateJob, Resource::Unresolved)?;
    let job = load(store, id).await?;
    authorize(identity, Action::UpdateJob, Resource::OwnedBy(job.employer_id))?;

    let fields = merge(Some(JobFields::from(&job)), patch)?;
    let updated = store
        .replace_job(id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    info!("Job {} updated by {}", id, identity.id);
    Ok(updated)
}

pub async fn delete(store: &dyn Store, identity: &Identity, id: Uuid) -> Result<(), AppError> {
    authorize(identity, Action::DeleteJob, Resource::Unresolved)?;
    let job = load(store, id).await?;
    authorize(identity, Action::DeleteJob, Resource::OwnedBy(job.employer_id))?;

    if !store.delete_job(id).await? {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    info!("Job {} deleted by {}", id, identity.id);
    Ok(())
}

/// Every job the caller owns, any status, newest first.
pub async fn list_mine(store: &dyn Store, identity: &Identity) -> Result<Vec<Job>, AppError> {
    authorize(identity, Action::ListOwnJobs, Resource::Unresolved)?;
    Ok(store.jobs_by_employer(identity.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::store::MemoryStore;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
        }
    }

    fn input(title: &str) -> JobInput {
        JobInput {
            title: Some(title.into()),
            description: Some("We are hiring".into()),
            company: Some("Tech Corp".into()),
            category: Some("Technology".into()),
            location: Some("Remote".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_scalar_requirements_become_single_item() {
        let parsed: JobInput =
            serde_json::from_str(r#"{"requirements": "Rust"}"#).unwrap();
        let fields = merge(None, JobInput { requirements: parsed.requirements, ..input("x") })
            .unwrap();
        assert_eq!(fields.requirements, vec!["Rust".to_string()]);
    }

    #[test]
    fn test_list_requirements_keep_order() {
        let parsed: JobInput =
            serde_json::from_str(r#"{"requirements": ["Node.js", "React", "SQL"]}"#).unwrap();
        let fields = merge(None, JobInput { requirements: parsed.requirements, ..input("x") })
            .unwrap();
        assert_eq!(fields.requirements, ["Node.js", "React", "SQL"]);
    }

    #[test]
    fn test_defaults_and_trimming() {
        let mut i = input("  Backend Engineer  ");
        i.salary = Some("   ".into());
        let fields = merge(None, i).unwrap();
        assert_eq!(fields.title, "Backend Engineer");
        assert_eq!(fields.salary, None);
        assert_eq!(fields.job_type, JobType::FullTime);
        assert_eq!(fields.status, JobStatus::Active);
        assert!(fields.requirements.is_empty());
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let err = merge(
            None,
            JobInput {
                title: Some("Only title".into()),
                company: Some("  ".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("description"));
        assert!(msg.contains("company"));
        assert!(!msg.contains("title"));
    }

    #[test]
    fn test_invalid_enum_values_rejected() {
        let mut i = input("x");
        i.job_type = Some("Gig".into());
        assert!(matches!(merge(None, i), Err(AppError::Validation(_))));

        let mut i = input("x");
        i.status = Some("archived".into());
        assert!(matches!(merge(None, i), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_paging_guards() {
        let q = JobQuery {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(q.paging(), (1, MAX_PAGE_SIZE));
        assert_eq!(JobQuery::default().paging(), (1, DEFAULT_PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        let employer = identity(Role::Employer);
        create(&store, &employer, input("Only job")).await.unwrap();

        let page = list(
            &store,
            &JobQuery {
                page: Some(i64::MAX),
                limit: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(page.jobs.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, i64::MAX);
    }

    #[tokio::test]
    async fn test_create_forces_employer_and_denies_seekers() {
        let store = MemoryStore::new();
        let employer = identity(Role::Employer);
        let job = create(&store, &employer, input("Dev")).await.unwrap();
        assert_eq!(job.employer_id, employer.id);

        let seeker = identity(Role::JobSeeker);
        let err = create(&store, &seeker, input("Dev")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let admin = identity(Role::Admin);
        assert!(create(&store, &admin, input("Admin job")).await.is_ok());
    }

    #[tokio::test]
    async fn test_pagination_of_five_active_jobs() {
        let store = MemoryStore::new();
        let employer = identity(Role::Employer);
        for n in 0..5 {
            create(&store, &employer, input(&format!("Job {n}"))).await.unwrap();
        }
        let page = list(
            &store,
            &JobQuery {
                page: Some(1),
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 5);

        let last = list(
            &store,
            &JobQuery {
                page: Some(3),
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(last.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_jobs_hidden_from_listing_but_reachable() {
        let store = MemoryStore::new();
        let employer = identity(Role::Employer);
        let job = create(&store, &employer, input("Closing soon")).await.unwrap();
        update(
            &store,
            &employer,
            job.id,
            JobInput {
                status: Some("closed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = list(&store, &JobQuery::default()).await.unwrap();
        assert!(page.jobs.is_empty());
        assert_eq!(page.total_pages, 0);

        let detail = get_by_id(&store, job.id).await.unwrap();
        assert_eq!(detail.job.status, JobStatus::Closed);
        assert_eq!(list_mine(&store, &employer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_ownership() {
        let store = MemoryStore::new();
        let owner = identity(Role::Employer);
        let other = identity(Role::Employer);
        let seeker = identity(Role::JobSeeker);
        let admin = identity(Role::Admin);
        let job = create(&store, &owner, input("Owned")).await.unwrap();

        let patch = JobInput {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        for intruder in [&other, &seeker] {
            let err = update(&store, intruder, job.id, patch.clone())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
            let err = delete(&store, intruder, job.id).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
        assert_eq!(get_by_id(&store, job.id).await.unwrap().job.title, "Owned");

        let updated = update(&store, &admin, job.id, patch).await.unwrap();
        assert_eq!(updated.title, "Hijacked");
        assert_eq!(updated.employer_id, owner.id);

        delete(&store, &owner, job.id).await.unwrap();
        assert!(matches!(
            get_by_id(&store, job.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, &owner, job.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_job_unchanged() {
        let store = MemoryStore::new();
        let owner = identity(Role::Employer);
        let job = create(&store, &owner, input("Stable")).await.unwrap();
        let err = update(
            &store,
            &owner,
            job.id,
            JobInput {
                title: Some("New title".into()),
                description: Some("".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get_by_id(&store, job.id).await.unwrap().job.title, "Stable");
    }

    #[tokio::test]
    async fn test_filters_on_listing() {
        let store = MemoryStore::new();
        let employer = identity(Role::Employer);
        create(&store, &employer, input("React Developer")).await.unwrap();
        let mut marketing = input("Marketing Manager");
        marketing.category = Some("Marketing".into());
        marketing.location = Some("New York".into());
        create(&store, &employer, marketing).await.unwrap();

        let by_title = list(
            &store,
            &JobQuery {
                title: Some("react".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_title.total, 1);
        assert_eq!(by_title.jobs[0].job.title, "React Developer");
        assert!(by_title.jobs[0].employer.is_none());

        let by_location = list(
            &store,
            &JobQuery {
                location: Some("new york".into()),
                category: Some("market".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_location.total, 1);
    }
}
