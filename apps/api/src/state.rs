use std::sync::Arc;

use crate::auth::token::TokenService;
use crate::config::Config;
use crate::resumes::ResumeStorage;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, in-memory for development and tests.
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    /// Where uploaded resumes land. Applications keep only the returned reference.
    pub resumes: Arc<dyn ResumeStorage>,
    pub config: Config,
}
