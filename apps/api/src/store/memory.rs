use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus, NewApplication};
use crate::models::job::{Job, JobFields, JobFilter, JobStatus, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::store::{Store, StoreError, StoreResult, UniqueKey};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
}

/// Process-local store. Each operation takes the single lock once, so the
/// uniqueness checks and the inserts they guard are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first. Rows are appended in creation order, so walking backwards and
/// then stable-sorting keeps later inserts ahead on timestamp ties.
fn newest_first<'a, T: Clone + 'a, K: Ord>(
    rows: impl DoubleEndedIterator<Item = &'a T>,
    created_at: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut out: Vec<T> = rows.rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueKey::UserEmail));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            company_name: user.company_name,
            phone: None,
            bio: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.users.iter(), |u| u.created_at))
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        let mut t = self.tables.write().await;
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(company_name) = &update.company_name {
            user.company_name = Some(company_name.clone());
        }
        if let Some(phone) = &update.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(location) = &update.location {
            user.location = Some(location.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let f = job.fields;
        let row = Job {
            id: Uuid::new_v4(),
            title: f.title,
            description: f.description,
            company: f.company,
            category: f.category,
            location: f.location,
            salary: f.salary,
            job_type: f.job_type,
            requirements: f.requirements,
            employer_id: job.employer_id,
            status: f.status,
            created_at: now,
            updated_at: now,
        };
        t.jobs.push(row.clone());
        Ok(row)
    }

    async fn job_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let t = self.tables.read().await;
        Ok(t.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn jobs_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Job>> {
        let t = self.tables.read().await;
        Ok(t.jobs.iter().filter(|j| ids.contains(&j.id)).cloned().collect())
    }

    async fn search_active_jobs(
        &self,
        filter: &JobFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Job>, i64)> {
        let t = self.tables.read().await;
        let matching = newest_first(
            t.jobs
                .iter()
                .filter(|j| j.status == JobStatus::Active && filter.matches(j)),
            |j| j.created_at,
        );
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn jobs_by_employer(&self, employer_id: Uuid) -> StoreResult<Vec<Job>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            t.jobs
                .iter()
                .filter(|j| j.employer_id == employer_id),
            |j| j.created_at,
        ))
    }

    async fn replace_job(&self, id: Uuid, f: &JobFields) -> StoreResult<Option<Job>> {
        let mut t = self.tables.write().await;
        let Some(job) = t.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        job.title = f.title.clone();
        job.description = f.description.clone();
        job.company = f.company.clone();
        job.category = f.category.clone();
        job.location = f.location.clone();
        job.salary = f.salary.clone();
        job.job_type = f.job_type;
        job.requirements = f.requirements.clone();
        job.status = f.status;
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.jobs.len();
        t.jobs.retain(|j| j.id != id);
        Ok(t.jobs.len() < before)
    }

    async fn insert_application(&self, app: NewApplication) -> StoreResult<Application> {
        let mut t = self.tables.write().await;
        if t
            .applications
            .iter()
            .any(|a| a.job_id == app.job_id && a.applicant_id == app.applicant_id)
        {
            return Err(StoreError::Conflict(UniqueKey::ApplicationPair));
        }
        let now = Utc::now();
        let row = Application {
            id: Uuid::new_v4(),
            job_id: app.job_id,
            applicant_id: app.applicant_id,
            resume: app.resume,
            cover_letter: app.cover_letter,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        t.applications.push(row.clone());
        Ok(row)
    }

    async fn application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let t = self.tables.read().await;
        Ok(t.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id))
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<Application>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            t.applications
                .iter()
                .filter(|a| a.applicant_id == applicant_id && status.map_or(true, |s| a.status == s)),
            |a| a.created_at,
        ))
    }

    async fn applications_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            t.applications
                .iter()
                .filter(|a| a.job_id == job_id),
            |a| a.created_at,
        ))
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let mut t = self.tables.write().await;
        let Some(app) = t.applications.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        app.status = status;
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }
}
