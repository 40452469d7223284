//! upload-store server
//!
//! # Usage
//!
//! ```bash
//! # Layered config lookup (XDG, ./config.toml, UPLOAD_STORE_* env)
//! upload-store
//!
//! # Explicit config file
//! upload-store --config ./config/production.toml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use upload_store::{config::UploadStoreConfig, handlers, observability, state::AppState};

#[derive(Parser)]
#[command(name = "upload-store")]
#[command(version)]
#[command(about = "Stores uploaded files and serves them back", long_about = None)]
struct Cli {
    /// Configuration file to load instead of the layered lookup
    #[arg(short, long)]
    config: Option<String>,

    /// Service name used for the XDG and /etc config locations
    #[arg(long, default_value = "upload-store")]
    service: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init()?;

    let config = match cli.config.as_deref() {
        Some(path) => UploadStoreConfig::load_from(path)?,
        None => UploadStoreConfig::load_for_service(&cli.service)?,
    };

    let addr = config.server.bind_addr();
    let public_root = config.storage.public_root.clone();
    let state = AppState::new(config).context("invalid storage.public_root")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, public_root = %public_root.display(), "upload-store listening");

    axum::serve(listener, handlers::router(state)).await?;
    Ok(())
}
