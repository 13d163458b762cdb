use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus, NewApplication};
use crate::models::job::{Job, JobFields, JobFilter, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::store::{Store, StoreError, StoreResult, UniqueKey};

const USERS_EMAIL_KEY: &str = "users_email_key";
const APPLICATIONS_PAIR_KEY: &str = "applications_job_applicant_key";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

/// Turns a unique-index violation into the matching `Conflict`.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(USERS_EMAIL_KEY) => return StoreError::Conflict(UniqueKey::UserEmail),
                Some(APPLICATIONS_PAIR_KEY) => {
                    return StoreError::Conflict(UniqueKey::ApplicationPair)
                }
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

/// `%needle%` for ILIKE, with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &Option<String>) -> Option<String> {
    needle.as_ref().map(|n| {
        let escaped = n
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, company_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.company_name)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                company_name = COALESCE($3, company_name),
                phone = COALESCE($4, phone),
                bio = COALESCE($5, bio),
                location = COALESCE($6, location),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.company_name)
        .bind(&update.phone)
        .bind(&update.bio)
        .bind(&update.location)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let f = &job.fields;
        Ok(sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs
                (id, title, description, company, category, location,
                 salary, job_type, requirements, employer_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&f.title)
        .bind(&f.description)
        .bind(&f.company)
        .bind(&f.category)
        .bind(&f.location)
        .bind(&f.salary)
        .bind(f.job_type)
        .bind(&f.requirements)
        .bind(job.employer_id)
        .bind(f.status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn job_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn jobs_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Job>> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_active_jobs(
        &self,
        filter: &JobFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Job>, i64)> {
        const WHERE: &str = r#"
            WHERE status = 'active'
              AND ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR category ILIKE $2)
              AND ($3::text IS NULL OR location ILIKE $3)
        "#;
        let title = like_pattern(&filter.title);
        let category = like_pattern(&filter.category);
        let location = like_pattern(&filter.location);

        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT * FROM jobs {WHERE} ORDER BY created_at DESC, id DESC OFFSET $4 LIMIT $5"
        ))
        .bind(&title)
        .bind(&category)
        .bind(&location)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM jobs {WHERE}"))
            .bind(&title)
            .bind(&category)
            .bind(&location)
            .fetch_one(&self.pool)
            .await?;

        Ok((jobs, total))
    }

    async fn jobs_by_employer(&self, employer_id: Uuid) -> StoreResult<Vec<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE employer_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn replace_job(&self, id: Uuid, f: &JobFields) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                title = $2, description = $3, company = $4, category = $5,
                location = $6, salary = $7, job_type = $8, requirements = $9,
                status = $10, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&f.title)
        .bind(&f.description)
        .bind(&f.company)
        .bind(&f.category)
        .bind(&f.location)
        .bind(&f.salary)
        .bind(f.job_type)
        .bind(&f.requirements)
        .bind(f.status)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_application(&self, app: NewApplication) -> StoreResult<Application> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, job_id, applicant_id, resume, cover_letter)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(app.job_id)
        .bind(app.applicant_id)
        .bind(&app.resume)
        .bind(&app.cover_letter)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(
            sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn application_exists(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE applicant_id = $1
              AND ($2::application_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(applicant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn applications_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?)
    }
}
