use std::sync::Arc;

use crate::analysis::pipeline::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Request body ceiling for resume uploads.
    pub upload_limit_bytes: usize,
    /// Answer every request with 503 while set.
    pub api_disabled: bool,
}
