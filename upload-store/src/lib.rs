//! upload-store: persistence for uploaded files
//!
//! Takes an in-memory upload and a client-supplied name, writes it under
//! `<public_root>/uploads` with a collision-resistant stored name
//! (`<millis>-<sanitized name>`) and hands that name back so the caller can
//! keep it and serve the file from `/uploads/<stored name>` later.
//!
//! Around the store sits a thin axum adapter: a multipart extractor, an upload
//! handler and a file-serving handler, plus configuration and logging.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use upload_store::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     upload_store::observability::init()?;
//!
//!     let config = UploadStoreConfig::load_for_service("upload-store")?;
//!     let addr = config.server.bind_addr();
//!     let app = upload_store::handlers::router(AppState::new(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! Authentication, sessions and captcha checks are not part of this crate;
//! mount the router behind whatever layer provides them.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod storage;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use upload_store::prelude::*;
    //! ```

    pub use crate::config::UploadStoreConfig;
    pub use crate::error::AppError;
    pub use crate::extractors::{FileUpload, FileUploadError};
    pub use crate::state::AppState;
    pub use crate::storage::{
        AssetStore, LocalAssetStore, StoreError, StoreResult, StoredAsset, UploadedAsset,
    };

    pub use axum;
}
