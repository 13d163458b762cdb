use axum::extract::{Path, State};

use crate::errors::AppError;
use crate::extract::{parse_id, ApiJson, ApiQuery};
use crate::jobs::registry::{self, JobInput, JobQuery};
use crate::models::job::{Job, JobDetail, JobPage};
use crate::policy::Identity;
use crate::response::Envelope;
use crate::state::AppState;

const JOB_NOT_FOUND: &str = "Job not found";

/// GET /api/jobs
pub async fn handle_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JobQuery>,
) -> Result<Envelope<JobPage>, AppError> {
    let page = registry::list(state.store.as_ref(), &query).await?;
    Ok(Envelope::ok(page, "Jobs retrieved successfully"))
}

/// GET /api/jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<JobDetail>, AppError> {
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    let job = registry::get_by_id(state.store.as_ref(), id).await?;
    Ok(Envelope::ok(job, "Job retrieved successfully"))
}

/// POST /api/jobs
pub async fn handle_create(
    State(state): State<AppState>,
    identity: Identity,
    ApiJson(input): ApiJson<JobInput>,
) -> Result<Envelope<Job>, AppError> {
    let job = registry::create(state.store.as_ref(), &identity, input).await?;
    Ok(Envelope::created(job, "Job created successfully"))
}

/// PUT /api/jobs/:id
pub async fn handle_update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<JobInput>,
) -> Result<Envelope<Job>, AppError> {
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    let job = registry::update(state.store.as_ref(), &identity, id, patch).await?;
    Ok(Envelope::ok(job, "Job updated successfully"))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Envelope<()>, AppError> {
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    registry::delete(state.store.as_ref(), &identity, id).await?;
    Ok(Envelope::ok((), "Job deleted successfully"))
}

/// GET /api/jobs/my-jobs
pub async fn handle_list_mine(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Envelope<Vec<Job>>, AppError> {
    let jobs = registry::list_mine(state.store.as_ref(), &identity).await?;
    Ok(Envelope::ok(jobs, "Jobs retrieved successfully"))
}
