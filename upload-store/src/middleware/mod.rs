//! Middleware and serving helpers for upload-store
//!
//! Provides file serving for stored uploads (range requests, caching).

pub mod file_serving;

pub use file_serving::{serve_upload, FileServingError};
