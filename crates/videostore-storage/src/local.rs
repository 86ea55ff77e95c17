use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path` (e.g., "storage/videos").
    ///
    /// The directory is not touched here; `ensure_directory` creates it.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn ensure_directory(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn promote(&self, from: &str, to: &str) -> StorageResult<()> {
        let from_path = self.key_to_path(from)?;
        let to_path = self.key_to_path(to)?;

        fs::rename(&from_path, &to_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(from.to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to move {} to {}: {}",
                    from_path.display(),
                    to_path.display(),
                    e
                ))
            }
        })?;

        tracing::debug!(
            from_key = %from,
            to_key = %to,
            "Local storage promote successful"
        );

        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(Bytes::from(data))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::staging_key;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        let storage = LocalStorage::new(dir.join("videos"));
        storage.ensure_directory().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage").join("videos"));

        storage.ensure_directory().await.unwrap();
        storage.ensure_directory().await.unwrap();

        assert!(storage.base_path().is_dir());
    }

    #[tokio::test]
    async fn test_local_storage_write_read() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let data = b"test data".to_vec();
        storage.write("clip.mp4", data.clone()).await.unwrap();

        let read = storage.read("clip.mp4").await.unwrap();
        assert_eq!(read.as_ref(), data.as_slice());
        assert!(storage.exists("clip.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.remove("missing.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_existing_file() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        storage.write("clip.mp4", b"abc".to_vec()).await.unwrap();
        storage.remove("clip.mp4").await.unwrap();

        assert!(!storage.exists("clip.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_moves_file() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let staging = staging_key();
        storage.write(&staging, b"payload".to_vec()).await.unwrap();
        storage.promote(&staging, "clip.mp4").await.unwrap();

        assert!(!storage.exists(&staging).await.unwrap());
        assert_eq!(storage.read("clip.mp4").await.unwrap().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_promote_to_long_name() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let long_name = format!("{}.mp4", "a".repeat(230));

        let staging = staging_key();
        storage.write(&staging, b"payload".to_vec()).await.unwrap();
        storage.promote(&staging, &long_name).await.unwrap();

        assert!(storage.exists(&long_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_reports_io_errors() {
        let dir = tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        std::fs::write(&not_a_dir, b"x").unwrap();
        let storage = LocalStorage::new(not_a_dir);

        let result = storage.exists("clip.mp4").await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }

    #[tokio::test]
    async fn test_write_fails_without_directory() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("never-created"));

        let result = storage.write("clip.mp4", b"abc".to_vec()).await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.read("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
