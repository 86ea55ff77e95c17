//! File metadata repository: CRUD for the files table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use videostore_core::models::FileRecord;
use videostore_core::AppError;

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Metadata store used by the file service.
///
/// `id` uniqueness is enforced by the store itself; `insert` reports a
/// collision as `AppError::DuplicateKey`.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record. When `created_at` is unset the store default applies.
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError>;

    /// Delete a record and return its snapshot, or `AppError::NotFound`.
    async fn delete_by_id(&self, id: &str) -> Result<FileRecord, AppError>;

    async fn list_all(&self) -> Result<Vec<FileRecord>, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>, AppError>;

    /// Cheap round trip used by health checks
    async fn ping(&self) -> Result<(), AppError>;
}

/// Row type for files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRow {
    pub id: String,
    pub size: i64,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl FileRow {
    pub fn to_file_record(self) -> FileRecord {
        FileRecord {
            id: self.id,
            size: self.size,
            path: self.path,
            created_at: Some(self.created_at),
        }
    }
}

/// Repository for files table.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", db.record_id = %record.id))]
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO files (id, size, path, created_at)
            VALUES ($1, $2, $3, COALESCE($4, now()))
            "#,
        )
        .bind(&record.id)
        .bind(record.size)
        .bind(&record.path)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::DuplicateKey(record.id.clone())
            }
            other => AppError::Database(other),
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete_by_id(&self, id: &str) -> Result<FileRecord, AppError> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(
            r#"
            DELETE FROM files
            WHERE id = $1
            RETURNING id, size, path, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRow::to_file_record)
            .ok_or_else(|| AppError::NotFound(format!("File {} does not exist", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn list_all(&self) -> Result<Vec<FileRecord>, AppError> {
        let rows: Vec<FileRow> = sqlx::query_as::<Postgres, FileRow>(
            "SELECT id, size, path, created_at FROM files ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FileRow::to_file_record).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(
            "SELECT id, size, path, created_at FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FileRow::to_file_record))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
