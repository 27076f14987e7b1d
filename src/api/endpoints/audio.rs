//! Audio intake endpoints.
//!
//! Both endpoints stage the audio to a temp file and hand the path to
//! the pipeline. Staging uses RAII handles, so the file disappears when
//! the handler returns, on the error paths included.

use std::io::Write as _;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use tempfile::NamedTempFile;

use crate::api::error::ApiError;
use crate::api::router::ApiContext;
use crate::pipeline::{ExtractionOutcome, PipelineError};

/// `POST /api/process-audio`
///
/// Multipart upload with the clip in an `audio` file field.
pub async fn process_audio(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionOutcome>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            // A plain form value named "audio" is not a file upload.
            None => continue,
        };
        upload = Some((filename, field.bytes().await?));
        break;
    }

    let (filename, bytes) = match upload {
        Some(found) => found,
        None => return Err(ApiError::MissingAudioField),
    };
    if filename.is_empty() {
        return Err(ApiError::EmptyAudioFilename);
    }

    let suffix = match safe_extension(&filename) {
        Some(ext) => format!(".{ext}"),
        None => String::new(),
    };
    let staged = stage_audio(&bytes, "upload_", &suffix)?;

    let outcome = ctx.pipeline.ingest_file(staged.path()).await?;
    Ok(Json(outcome))
}

/// `POST /api/record`
///
/// Raw audio bytes as sent by the in-browser recorder, which captures
/// webm.
pub async fn record_audio(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<Json<ExtractionOutcome>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::EmptyAudioBody);
    }

    let staged = stage_audio(&body, "recording_", ".webm")?;

    let outcome = ctx.pipeline.ingest_file(staged.path()).await?;
    Ok(Json(outcome))
}

/// Write audio bytes to a temp file whose suffix keeps the original
/// extension, so MIME guessing still has something to look at.
fn stage_audio(bytes: &[u8], prefix: &str, suffix: &str) -> Result<NamedTempFile, PipelineError> {
    let mut staged = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()?;
    staged.write_all(bytes)?;
    Ok(staged)
}

/// Extension of an uploaded filename, if it is safe to reuse in a temp
/// file name. Uploaded names are untrusted; everything but the
/// extension is discarded.
fn safe_extension(filename: &str) -> Option<&str> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext)
    } else {
        None
    }
}
