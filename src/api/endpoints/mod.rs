//! Request handlers, one module per resource.

pub mod audio;
pub mod health;
pub mod patients;
