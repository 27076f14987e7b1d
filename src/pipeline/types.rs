//! Shared types for the intake pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PipelineError;

/// A clinical record as extracted from a conversation.
///
/// Deliberately schemaless: the extraction prompt asks for a fixed set of
/// section keys (`patientDemographics`, `clinicalNotes`, ...) but nothing
/// is mandatory and the model may omit or add sections. The only enforced
/// shape is "JSON object at the top level".
pub type StructuredRecord = serde_json::Map<String, serde_json::Value>;

/// Marker placed in the `error` field of an [`ExtractionFailure`].
pub const PARSE_FAILURE_MARKER: &str = "Failed to parse structured data";

/// Fallback payload when no recovery strategy yields a JSON object.
///
/// Not an error type: the request that produced it still succeeds, the
/// caller just receives the model's reply verbatim instead of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionFailure {
    pub error: String,
    pub raw_text: String,
}

impl ExtractionFailure {
    /// Failure payload preserving the model's reply byte-for-byte.
    pub fn unparsed(raw_text: impl Into<String>) -> Self {
        Self {
            error: PARSE_FAILURE_MARKER.to_string(),
            raw_text: raw_text.into(),
        }
    }
}

/// Result of normalizing a model reply: a record or the raw fallback.
///
/// Serializes untagged so handlers return either shape directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Record(StructuredRecord),
    Failure(ExtractionFailure),
}

impl ExtractionOutcome {
    pub fn is_record(&self) -> bool {
        matches!(self, ExtractionOutcome::Record(_))
    }
}

/// Generative API abstraction (allows mocking).
///
/// One collaborator serves both calls the pipeline makes: speech-to-text
/// over raw audio, and text generation over a prompt.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Transcribe an audio clip.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, PipelineError>;

    /// Complete a text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}
