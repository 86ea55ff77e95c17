//! Stored file metadata and its read-facing projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Route under which stored files are addressable.
pub const FILES_ROUTE: &str = "/v1/files";

/// Durable metadata for one stored file.
///
/// `id` is the uploaded filename. It doubles as the storage key and the
/// primary key of the `files` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Byte count as declared by the uploader
    pub size: i64,
    /// Externally resolvable location: `<host>/v1/files/<id>`
    pub path: String,
    /// Unset on first insert so the database default applies
    pub created_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Build a record for a new upload. `created_at` is left for the store to fill.
    pub fn new(id: impl Into<String>, size: i64, host: &str) -> Self {
        let id = id.into();
        let path = file_location(host, &id);
        Self {
            id,
            size,
            path,
            created_at: None,
        }
    }
}

/// Externally visible location of a file.
pub fn file_location(host: &str, id: &str) -> String {
    format!("{}{}/{}", host.trim_end_matches('/'), FILES_ROUTE, id)
}

/// File listing entry returned by `GET /v1/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    pub fileid: String,
    pub name: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileInfo {
    fn from(record: FileRecord) -> Self {
        FileInfo {
            fileid: record.id.clone(),
            name: record.id,
            size: record.size,
            created_at: record.created_at.unwrap_or_default(),
        }
    }
}
