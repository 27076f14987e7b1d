//! HTTP surface.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{build_router, ApiContext, MAX_UPLOAD_BYTES};
pub use server::{start, ServerError, ServerHandle};
