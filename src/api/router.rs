//! Route table and shared request context.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints::{audio, health, patients};
use crate::db::RecordStore;
use crate::pipeline::IntakePipeline;

/// Uploads above this are rejected before any handler runs.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Everything a handler needs, cloned per request.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: IntakePipeline,
    pub store: RecordStore,
}

pub fn build_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/patients", get(patients::list_patients))
        .route("/api/patient/:id", get(patients::get_patient))
        .route("/api/process-audio", post(audio::process_audio))
        .route("/api/record", post(audio::record_audio))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(ctx)
}
