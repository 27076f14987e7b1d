//! API error type and its HTTP mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::PipelineError;

/// Errors surfaced to HTTP clients.
///
/// Every variant renders as `{"error": <message>}`; the status code is
/// the only other signal a client gets.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Multipart form carried no `audio` file field.
    #[error("No audio file provided")]
    MissingAudioField,

    /// An `audio` field arrived with an empty filename.
    #[error("No audio file selected")]
    EmptyAudioFilename,

    /// Raw capture endpoint received an empty body.
    #[error("No audio data received")]
    EmptyAudioBody,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("could not read multipart upload: {0}")]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingAudioField
            | ApiError::EmptyAudioFilename
            | ApiError::EmptyAudioBody
            | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::PatientNotFound => StatusCode::NOT_FOUND,
            ApiError::Pipeline(err) => {
                tracing::error!(error = %err, "intake pipeline failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Database(err) => {
                tracing::error!(error = %err, "record store failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
