//! SQLite-backed persistence.
//!
//! Records are stored as JSON bodies in a single table and queried with
//! `json_extract` expression indexes, keeping the document shape the
//! extraction step produces without mapping it onto columns.

pub mod records;
pub mod sqlite;

pub use records::RecordStore;
pub use sqlite::Database;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("record body is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored record {id} is not a JSON object")]
    MalformedBody { id: String },

    #[error("database lock poisoned")]
    LockPoisoned,
}
