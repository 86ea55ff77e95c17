//! Storage setup

use anyhow::{Context, Result};
use std::sync::Arc;
use videostore_core::Config;
use videostore_storage::{LocalStorage, Storage};

/// Create the local storage backend and make sure its directory exists.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.storage_path());
    storage
        .ensure_directory()
        .await
        .context("Failed to prepare storage directory")?;

    tracing::info!(path = %config.storage_path(), "Local storage ready");

    Ok(Arc::new(storage))
}
