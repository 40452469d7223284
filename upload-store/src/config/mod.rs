//! Configuration management for upload-store
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `UPLOAD_STORE_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/upload-store/{service}/config.toml` (user config, XDG)
//! 4. `/etc/upload-store/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [storage]
//! public_root = "/srv/app/public"
//! url_prefix = "/uploads"
//! max_upload_bytes = 5242880
//! cache_max_age_secs = 3600
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use upload_store::config::UploadStoreConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = UploadStoreConfig::load_for_service("upload-store")?;
//! let root = &config.storage.public_root;
//! # Ok(())
//! # }
//! ```

use crate::storage::DEFAULT_URL_PREFIX;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "UPLOAD_STORE_";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    /// `host:port` string suitable for `TcpListener::bind`
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Public root; assets are written to `<public_root>/uploads`
    pub public_root: PathBuf,

    /// URL path stored assets are served from
    pub url_prefix: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: u64,

    /// `Cache-Control` max-age for served assets
    pub cache_max_age_secs: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            public_root: PathBuf::from("./public"),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
            cache_max_age_secs: 86400,          // 1 day
        }
    }
}

impl StorageSettings {
    /// URL prefix with a leading slash and no trailing slash
    ///
    /// Falls back to `/uploads` when the configured prefix is empty.
    ///
    /// ```rust
    /// use upload_store::config::StorageSettings;
    ///
    /// let settings = StorageSettings { url_prefix: "files/".into(), ..Default::default() };
    /// assert_eq!(settings.normalized_url_prefix(), "/files");
    /// ```
    #[must_use]
    pub fn normalized_url_prefix(&self) -> String {
        let trimmed = self.url_prefix.trim_matches('/');
        if trimmed.is_empty() {
            DEFAULT_URL_PREFIX.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Complete upload-store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadStoreConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Upload storage settings
    #[serde(default)]
    pub storage: StorageSettings,
}

impl UploadStoreConfig {
    /// Load configuration for a specific service
    ///
    /// Merges defaults, system, user and local `config.toml` files, then
    /// `UPLOAD_STORE_*` environment variables, in increasing priority.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be parsed
    /// - Values fail type conversion
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config
        let system_config = PathBuf::from("/etc/upload-store")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config
        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables (highest priority)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file leaves the defaults in place. Environment variables
    /// still override file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or values fail type
    /// conversion.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// ```rust
    /// use upload_store::config::UploadStoreConfig;
    ///
    /// let path = UploadStoreConfig::recommended_path("my-app");
    /// // Returns: ~/.config/upload-store/my-app/config.toml
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("upload-store")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
