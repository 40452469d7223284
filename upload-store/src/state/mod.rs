//! Application state shared by the HTTP handlers

use crate::config::UploadStoreConfig;
use crate::storage::{AssetStore, LocalAssetStore, StoreResult};
use std::sync::Arc;

/// Application state for upload-store
///
/// Cheap to clone; the configuration and store are shared behind `Arc`s.
///
/// # Example
///
/// ```rust,no_run
/// use upload_store::{config::UploadStoreConfig, state::AppState};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = UploadStoreConfig::load_for_service("upload-store")?;
/// let state = AppState::new(config)?;
/// let app = upload_store::handlers::router(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppState {
    config: Arc<UploadStoreConfig>,
    store: Arc<dyn AssetStore>,
}

impl AppState {
    /// Create state backed by a [`LocalAssetStore`] built from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured public root is not a directory.
    pub fn new(config: UploadStoreConfig) -> StoreResult<Self> {
        let store = LocalAssetStore::new(config.storage.public_root.clone())?
            .with_url_prefix(config.storage.normalized_url_prefix());

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create state around an existing store
    #[must_use]
    pub fn with_store(config: UploadStoreConfig, store: Arc<dyn AssetStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Application configuration
    #[must_use]
    pub fn config(&self) -> &UploadStoreConfig {
        &self.config
    }

    /// Upload store
    #[must_use]
    pub fn store(&self) -> &dyn AssetStore {
        self.store.as_ref()
    }
}
