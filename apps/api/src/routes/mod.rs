pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::config::ResumeBackend;
use crate::errors::AppError;
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::users::handlers as users;

/// Room for the non-file multipart fields around a maximum-size resume.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

async fn not_found(uri: Uri) -> AppError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    AppError::NotFound(format!("Not Found - {target}"))
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_resume_bytes + FORM_OVERHEAD_BYTES;

    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Jobs
        .route("/api/jobs", get(jobs::handle_list).post(jobs::handle_create))
        .route("/api/jobs/my-jobs", get(jobs::handle_list_mine))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get)
                .put(jobs::handle_update)
                .delete(jobs::handle_delete),
        )
        // Applications
        .route(
            "/api/applications",
            post(applications::handle_apply).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/applications/my-applications",
            get(applications::handle_list_mine),
        )
        .route(
            "/api/applications/job/:job_id",
            get(applications::handle_list_for_job),
        )
        .route(
            "/api/applications/:id/status",
            put(applications::handle_set_status),
        )
        // Users
        .route(
            "/api/users/profile",
            get(users::handle_get_profile).put(users::handle_update_profile),
        )
        .route("/api/users", get(users::handle_list));

    // S3 references are object keys, not URLs under this service.
    let router = match state.config.resume_backend {
        ResumeBackend::Local => {
            router.nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        }
        ResumeBackend::S3 { .. } => router,
    };

    router.fallback(not_found).with_state(state)
}
