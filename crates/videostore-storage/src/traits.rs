//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The file service only talks to storage through this trait, so its
/// compensation logic can be exercised against `MemoryStorage` without a disk.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create the storage root if it does not exist. Idempotent.
    async fn ensure_directory(&self) -> StorageResult<()>;

    /// Write the full payload under `key`, replacing any previous content.
    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Remove the file stored under `key`.
    ///
    /// A missing file is an error (`NotFound`), not a no-op: callers rely on
    /// removal failures to decide whether to restore metadata.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Move the file at `from` to `to`, replacing `to` if present.
    async fn promote(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Read the full content of a file
    async fn read(&self, key: &str) -> StorageResult<Bytes>;

    /// Check if a file exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
