//! Persistence seam. Handlers and core operations only ever see `Arc<dyn Store>`;
//! `PgStore` backs production and `MemoryStore` backs development and tests.
//!
//! Both backends enforce the two uniqueness rules themselves: a user email, and
//! a (job, applicant) pair. Core operations pre-check these for friendly errors,
//! but only the store closes the race between concurrent writers.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus, NewApplication};
use crate::models::job::{Job, JobFields, JobFilter, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    UserEmail,
    ApplicationPair,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Conflict(UniqueKey),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>>;

    // jobs
    async fn insert_job(&self, job: NewJob) -> StoreResult<Job>;
    async fn job_by_id(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn jobs_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Job>>;
    /// Active jobs matching `filter`, newest first, plus the total match count.
    async fn search_active_jobs(
        &self,
        filter: &JobFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Job>, i64)>;
    async fn jobs_by_employer(&self, employer_id: Uuid) -> StoreResult<Vec<Job>>;
    async fn replace_job(&self, id: Uuid, fields: &JobFields) -> StoreResult<Option<Job>>;
    async fn delete_job(&self, id: Uuid) -> StoreResult<bool>;

    // applications
    async fn insert_application(&self, application: NewApplication) -> StoreResult<Application>;
    async fn application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>>;
    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<bool>;
    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<Application>>;
    async fn applications_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>>;
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>>;
}
