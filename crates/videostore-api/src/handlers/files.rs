//! File upload, listing, download and deletion handlers.
//!
//! Upload and delete run the file service on a spawned task. A client that
//! disconnects mid-request drops the handler future, which cancels the token
//! but never the task itself, so any compensation still runs to completion.

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::files::FileService;
use crate::state::AppState;
use crate::utils::upload::{extract_multipart_file, resolve_host};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use videostore_core::models::FileInfo;
use videostore_core::AppError;
use videostore_processing::content_type_for_extension;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Run `work` on its own task. The token is cancelled if the calling future
/// is dropped before the task finishes.
async fn run_detached<F, Fut, T>(work: F) -> Result<T, AppError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let result = tokio::spawn(work(token)).await;
    guard.disarm();

    result.map_err(|e| AppError::Internal(format!("File task failed: {}", e)))?
}

#[utoipa::path(
    post,
    path = "/v1/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded, Location header points at it", body = String),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "File already exists", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Unsupported media type", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, uri, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_multipart_file(multipart?).await?;
    let host = resolve_host(state.config.public_host(), &headers, &uri);

    let files: FileService = state.files.clone();
    let size = upload.data.len() as i64;
    let location = run_detached(move |cancel| async move {
        files
            .upload(Cursor::new(upload.data), &host, &upload.filename, size, &cancel)
            .await
    })
    .await?;

    let location_header = HeaderValue::from_str(&location)
        .map_err(|e| AppError::Internal(format!("Invalid location header: {}", e)))?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location_header)],
        "OK",
    ))
}

#[utoipa::path(
    get,
    path = "/v1/files",
    tag = "files",
    responses(
        (status = 200, description = "Stored files", body = Vec<FileInfo>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileInfo>>, HttpAppError> {
    let files = state.files.list_all().await?;
    Ok(Json(files))
}

#[utoipa::path(
    get,
    path = "/v1/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (record, data) = state.files.get(&id).await?;

    let content_type = content_type_for_extension(&record.id).unwrap_or(FALLBACK_CONTENT_TYPE);
    let disposition = HeaderValue::from_str(&format!(
        "form-data; name=\"{}\"; filename=\"{}\"",
        crate::constants::UPLOAD_FIELD,
        record.id
    ))
    .map_err(|e| AppError::Internal(format!("Invalid content disposition: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

#[utoipa::path(
    delete,
    path = "/v1/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File name")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let files: FileService = state.files.clone();
    run_detached(move |cancel| async move { files.delete_by_id(&id, &cancel).await }).await?;

    Ok(StatusCode::NO_CONTENT)
}
