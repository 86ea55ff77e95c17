//! File service: keeps stored bytes and metadata records in step.
//!
//! Storage and the metadata store cannot be updated atomically together.
//! Upload writes bytes first and records second; delete removes the record
//! first and bytes second. When the second step fails the first one is
//! compensated before the error is returned, so a failed call never leaves
//! an orphaned file or an orphaned record behind. When the compensation
//! itself fails, the error carries that second failure as well.
//!
//! Uploads land under a per-attempt staging key and are promoted to the
//! canonical key only after the record insert succeeds. A losing concurrent
//! upload of the same id therefore only ever removes its own bytes.
//!
//! Cancellation is checked between durable steps. A cancelled token is
//! treated as a failure of the step about to run and triggers the same
//! compensation; a step already in flight is never abandoned halfway.

use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use videostore_core::models::{FileInfo, FileRecord};
use videostore_core::AppError;
use videostore_db::FileRepository;
use videostore_processing::ContentValidator;
use videostore_storage::{is_staging_key, staging_key, Storage, StorageError};

#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn Storage>,
    repository: Arc<dyn FileRepository>,
    validator: ContentValidator,
}

impl FileService {
    pub fn new(
        storage: Arc<dyn Storage>,
        repository: Arc<dyn FileRepository>,
        validator: ContentValidator,
    ) -> Self {
        Self {
            storage,
            repository,
            validator,
        }
    }

    /// Store an uploaded file and record its metadata.
    ///
    /// Returns the externally resolvable path `<host>/v1/files/<filename>`.
    #[tracing::instrument(skip(self, reader, cancel), fields(file_id = %filename, declared_size = size))]
    pub async fn upload<R>(
        &self,
        reader: R,
        host: &str,
        filename: &str,
        size: i64,
        cancel: &CancellationToken,
    ) -> Result<String, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.storage
            .ensure_directory()
            .await
            .map_err(|e| write_failed(filename, e, None))?;

        let data = self.read_payload(reader).await?;

        if is_staging_key(filename) {
            return Err(AppError::InvalidInput(format!(
                "Invalid filename: {}",
                filename
            )));
        }
        let content_type = self.validator.validate_all(filename, &data)?;

        let staging = staging_key();
        let size_bytes = data.len();

        if cancel.is_cancelled() {
            return Err(write_failed(filename, cancelled(), None));
        }
        if let Err(e) = self.storage.write(&staging, data).await {
            // A failed write may still have created the file
            let compensation_error = self.discard_staged(&staging).await;
            return Err(write_failed(filename, e, compensation_error));
        }

        if cancel.is_cancelled() {
            let compensation_error = self.discard_staged(&staging).await;
            return Err(write_failed(filename, cancelled(), compensation_error));
        }

        let record = FileRecord::new(filename, size, host);
        if let Err(e) = self.repository.insert(&record).await {
            let compensation_error = self.discard_staged(&staging).await;
            return Err(match e {
                AppError::DuplicateKey(id) => {
                    tracing::info!(file_id = %id, "Upload rejected, file already exists");
                    AppError::DuplicateKey(id)
                }
                other => write_failed(filename, other, compensation_error),
            });
        }

        if let Err(e) = self.storage.promote(&staging, filename).await {
            tracing::error!(
                error = %e,
                file_id = %filename,
                "Failed to promote staged upload, removing metadata record"
            );
            let compensation_error = match self.repository.delete_by_id(filename).await {
                Ok(_) => self.discard_staged(&staging).await,
                Err(undo) => {
                    // The record still points at this upload, keep its bytes
                    tracing::error!(
                        error = %undo,
                        file_id = %filename,
                        staging_key = %staging,
                        "Failed to remove metadata record after promote failure, staged upload kept"
                    );
                    Some(format!(
                        "record removal failed: {}; staged upload kept at {}",
                        undo, staging
                    ))
                }
            };
            return Err(write_failed(filename, e, compensation_error));
        }

        tracing::info!(
            file_id = %filename,
            size_bytes,
            content_type = %content_type,
            path = %record.path,
            "File uploaded"
        );

        Ok(record.path)
    }

    /// Delete a file and its metadata record.
    ///
    /// When the file cannot be removed the deleted record is inserted again
    /// and `StorageDeleteFailed` is returned.
    #[tracing::instrument(skip(self, cancel), fields(file_id = %id))]
    pub async fn delete_by_id(&self, id: &str, cancel: &CancellationToken) -> Result<(), AppError> {
        self.validator.validate_filename(id)?;

        let snapshot = self.repository.delete_by_id(id).await?;

        let removed = if cancel.is_cancelled() {
            Err(cancelled())
        } else {
            self.storage.remove(id).await.map_err(anyhow::Error::new)
        };

        if let Err(e) = removed {
            tracing::warn!(
                error = %e,
                file_id = %id,
                "Failed to remove file, restoring metadata record"
            );
            let compensation_error = match self.repository.insert(&snapshot).await {
                Ok(()) => None,
                Err(restore) => {
                    tracing::error!(
                        error = %restore,
                        file_id = %id,
                        "Failed to restore metadata record after file removal failure"
                    );
                    Some(restore.to_string())
                }
            };
            return Err(AppError::StorageDeleteFailed {
                message: format!("Failed to remove file {}", id),
                source: e,
                compensation_error,
            });
        }

        tracing::info!(file_id = %id, "File deleted");
        Ok(())
    }

    /// List metadata for every stored file.
    pub async fn list_all(&self) -> Result<Vec<FileInfo>, AppError> {
        let records = self.repository.list_all().await?;
        Ok(records.into_iter().map(FileInfo::from).collect())
    }

    /// Fetch a file's record and content.
    #[tracing::instrument(skip(self), fields(file_id = %id))]
    pub async fn get(&self, id: &str) -> Result<(FileRecord, Bytes), AppError> {
        self.validator.validate_filename(id)?;

        let record = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} does not exist", id)))?;

        let data = self.storage.read(id).await.map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound(format!("File {} does not exist", id)),
            other => AppError::InternalWithSource {
                message: format!("Failed to read file {}", id),
                source: anyhow::Error::new(other),
            },
        })?;

        Ok((record, data))
    }

    /// Read the whole upload, stopping one byte past the size limit.
    async fn read_payload<R>(&self, reader: R) -> Result<Vec<u8>, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let limit = self.validator.max_file_size() as u64 + 1;
        let mut data = Vec::new();
        reader
            .take(limit)
            .read_to_end(&mut data)
            .await
            .map_err(|e| AppError::InternalWithSource {
                message: "Failed to read uploaded file".to_string(),
                source: anyhow::Error::new(e),
            })?;
        Ok(data)
    }

    /// Remove a staged upload. Returns the failure, if any, for reporting.
    async fn discard_staged(&self, staging: &str) -> Option<String> {
        match self.storage.remove(staging).await {
            Ok(()) | Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %staging,
                    "Failed to remove staged upload"
                );
                Some(format!("staged upload removal failed: {}", e))
            }
        }
    }
}

fn write_failed(
    filename: &str,
    source: impl Into<anyhow::Error>,
    compensation_error: Option<String>,
) -> AppError {
    AppError::StorageWriteFailed {
        message: format!("Failed to store file {}", filename),
        source: source.into(),
        compensation_error,
    }
}

fn cancelled() -> anyhow::Error {
    anyhow::anyhow!("request cancelled")
}
