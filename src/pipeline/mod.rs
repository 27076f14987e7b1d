//! Audio intake pipeline.
//!
//! Capture lands here as raw bytes and leaves as either a stored patient
//! record or a raw-text fallback. The stages are deliberately small:
//! prompt construction, one generative API client, reply normalization,
//! and an orchestrator that wires them to the record store.

pub mod gemini;
pub mod intake;
pub mod parser;
pub mod prompt;
pub mod types;

pub use gemini::{GeminiClient, MockGenerativeClient};
pub use intake::{audio_mime_for, IntakePipeline, FALLBACK_AUDIO_MIME};
pub use parser::normalize_extraction;
pub use types::{ExtractionFailure, ExtractionOutcome, GenerativeClient, StructuredRecord};

use thiserror::Error;

use crate::db::DatabaseError;

/// Failures of the intake flow.
///
/// Display strings double as client-facing error messages, so they name
/// the failing collaborator without leaking request internals.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generative API unreachable at {url}")]
    ApiUnreachable { url: String },

    #[error("generative API request timed out after {seconds}s")]
    ApiTimeout { seconds: u64 },

    #[error("generative API returned HTTP {status}: {detail}")]
    ApiStatus { status: u16, detail: String },

    #[error("generative API reply contained no text")]
    EmptyReply,

    #[error("generative API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("audio staging failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}
