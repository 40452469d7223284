//! Upload store abstraction and the local filesystem implementation
//!
//! The `AssetStore` trait gives handlers one API for persisting uploaded
//! payloads and looking them up again, independent of where the bytes live.
//! `LocalAssetStore` writes each asset as a single flat file under
//! `<public_root>/uploads`, named `<millis>-<sanitized name>`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use upload_store::storage::{AssetStore, LocalAssetStore, UploadedAsset};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = LocalAssetStore::new("./public")?;
//!
//! let uploaded = UploadedAsset::new("a.txt", "text/plain", b"hello".to_vec());
//! let stored = store.store(uploaded).await?;
//! println!("Stored asset: {}", stored.stored_name);
//!
//! let data = store.retrieve(&stored.stored_name).await?;
//! assert_eq!(data, b"hello");
//! # Ok(())
//! # }
//! ```

mod local;
mod naming;
mod traits;
mod types;

pub use local::{LocalAssetStore, DEFAULT_URL_PREFIX, UPLOADS_DIR};
pub use naming::{
    sanitize_filename, stored_name, uploaded_at, validate_stored_name, Clock, FixedClock,
    SystemClock, MAX_NAME_LEN,
};
#[cfg(test)]
pub use traits::MockAssetStore;
pub use traits::AssetStore;
pub use types::{AssetMetadata, StoreError, StoreResult, StoredAsset, UploadedAsset};
