use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::applications::ledger::{self, ApplyForm, ResumeIntake};
use crate::errors::AppError;
use crate::extract::{parse_id, ApiJson, ApiQuery};
use crate::models::application::{ApplicationDetail, ReceivedApplication, SubmittedApplication};
use crate::policy::Identity;
use crate::response::Envelope;
use crate::resumes::ResumeUpload;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(format!("Resume file must be at most {max_bytes} bytes"))
    } else {
        AppError::Validation(err.body_text())
    }
}

/// Reads `resume`, `jobId` and `coverLetter`; other fields are ignored.
async fn read_form(mut multipart: Multipart, max_bytes: usize) -> Result<ApplyForm, AppError> {
    let mut form = ApplyForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                // An empty file input still submits a nameless, empty part.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.resume = Some(ResumeUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("jobId") => {
                form.job_id = Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            Some("coverLetter") => {
                form.cover_letter =
                    Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /api/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Envelope<ApplicationDetail>, AppError> {
    let max_bytes = state.config.max_resume_bytes;
    // A body that is not multipart at all carries no file.
    let form = match multipart {
        Ok(multipart) => read_form(multipart, max_bytes).await?,
        Err(_) => ApplyForm::default(),
    };
    let detail = ledger::apply(
        state.store.as_ref(),
        ResumeIntake {
            storage: state.resumes.as_ref(),
            max_bytes,
        },
        &identity,
        form,
    )
    .await?;
    Ok(Envelope::created(detail, "Application submitted successfully"))
}

/// GET /api/applications/my-applications
pub async fn handle_list_mine(
    State(state): State<AppState>,
    identity: Identity,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<Envelope<Vec<SubmittedApplication>>, AppError> {
    let applications =
        ledger::list_mine(state.store.as_ref(), &identity, query.status.as_deref()).await?;
    Ok(Envelope::ok(applications, "Applications retrieved successfully"))
}

/// GET /api/applications/job/:job_id
pub async fn handle_list_for_job(
    State(state): State<AppState>,
    identity: Identity,
    Path(job_id): Path<String>,
) -> Result<Envelope<Vec<ReceivedApplication>>, AppError> {
    let job_id = parse_id(&job_id, "Job not found")?;
    let applications = ledger::list_for_job(state.store.as_ref(), &identity, job_id).await?;
    Ok(Envelope::ok(
        applications,
        "Job applications retrieved successfully",
    ))
}

/// PUT /api/applications/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Envelope<ApplicationDetail>, AppError> {
    let id = parse_id(&id, "Application not found")?;
    let detail =
        ledger::set_status(state.store.as_ref(), &identity, id, body.status.as_deref()).await?;
    Ok(Envelope::ok(
        detail,
        "Application status updated successfully",
    ))
}
