//! End-to-end flow from captured audio to a stored patient record.

use std::path::Path;
use std::sync::Arc;

use super::parser::normalize_extraction;
use super::prompt::build_extraction_prompt;
use super::types::{ExtractionOutcome, GenerativeClient};
use super::PipelineError;
use crate::db::RecordStore;

/// MIME type used when the filename gives no usable audio type.
pub const FALLBACK_AUDIO_MIME: &str = "audio/mp3";

/// Orchestrates transcription, extraction, and persistence.
///
/// Holds its collaborators by handle, so one pipeline can be cloned into
/// every request handler.
#[derive(Clone)]
pub struct IntakePipeline {
    client: Arc<dyn GenerativeClient>,
    store: RecordStore,
}

impl IntakePipeline {
    pub fn new(client: Arc<dyn GenerativeClient>, store: RecordStore) -> Self {
        Self { client, store }
    }

    /// Run the full flow for an audio file staged on disk.
    pub async fn ingest_file(&self, path: &Path) -> Result<ExtractionOutcome, PipelineError> {
        let audio = tokio::fs::read(path).await?;
        let mime_type = audio_mime_for(path);
        self.ingest(&audio, &mime_type).await
    }

    /// Transcribe one audio clip, extract a record, and persist it.
    ///
    /// A reply that cannot be normalized is not an error: the caller gets
    /// the failure payload back and nothing is written. Collaborator
    /// failures abort before any write.
    pub async fn ingest(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<ExtractionOutcome, PipelineError> {
        let transcript = self.client.transcribe(audio, mime_type).await?;
        tracing::debug!(transcript_chars = transcript.len(), "audio transcribed");

        let prompt = build_extraction_prompt(&transcript);
        let reply = self.client.generate(&prompt).await?;

        match normalize_extraction(&reply) {
            ExtractionOutcome::Record(mut record) => {
                let id = self.store.insert(&mut record)?;
                record.insert("id".to_string(), serde_json::Value::String(id.clone()));
                tracing::info!(record_id = %id, "patient record stored");
                Ok(ExtractionOutcome::Record(record))
            }
            ExtractionOutcome::Failure(failure) => {
                tracing::warn!("model reply had no recoverable record, returning raw text");
                Ok(ExtractionOutcome::Failure(failure))
            }
        }
    }
}

/// Audio MIME type for a staged file, guessed from its extension.
///
/// webm is special-cased: browser recorders capture voice into a webm
/// container, but the MIME table files the extension under `video/*`.
/// Other extensions without an `audio/*` candidate fall back to the
/// default the API accepts for voice clips.
pub fn audio_mime_for(path: &Path) -> String {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webm"))
    {
        return "audio/webm".to_string();
    }
    mime_guess::from_path(path)
        .iter_raw()
        .find(|mime| mime.starts_with("audio/"))
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_AUDIO_MIME.to_string())
}
