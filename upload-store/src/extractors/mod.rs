//! Axum extractors for upload-store

mod file_upload;

pub use file_upload::{FileUpload, FileUploadError};
