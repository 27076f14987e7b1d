//! voxchart: a voice-to-record intake service for clinical visits.
//!
//! Audio of a visit comes in over HTTP, gets transcribed and distilled
//! into a structured patient record by a generative API, and lands in a
//! local SQLite document store that the read endpoints query by id,
//! extracted patient id, or first name.

pub mod api;
pub mod config;
pub mod db;
pub mod pipeline;

pub use api::{build_router, ApiContext};
pub use config::Settings;
pub use db::{Database, RecordStore};
pub use pipeline::{GeminiClient, IntakePipeline};
