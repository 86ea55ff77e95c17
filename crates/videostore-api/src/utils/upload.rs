//! Helpers for the upload handler

use crate::constants::UPLOAD_FIELD;
use crate::error::HttpAppError;
use axum::extract::Multipart;
use axum::http::{header, HeaderMap, Uri};
use bytes::Bytes;
use videostore_core::AppError;

/// The file part of an upload form
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Extract the file from the `data` field of a multipart form.
/// Only one such field is accepted; other fields are ignored.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<UploadedFile, HttpAppError> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if uploaded.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Multiple file fields are not allowed; send exactly one field named '{}'",
                UPLOAD_FIELD
            ))
            .into());
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Uploaded file has no filename".to_string()))?;

        let data = field.bytes().await?;
        uploaded = Some(UploadedFile { filename, data });
    }

    uploaded.ok_or_else(|| {
        AppError::InvalidInput(format!("No file provided in field '{}'", UPLOAD_FIELD)).into()
    })
}

/// Host used to build file locations: the configured public host, else the
/// request `Host` header, else the URI authority.
pub fn resolve_host(public_host: Option<&str>, headers: &HeaderMap, uri: &Uri) -> String {
    if let Some(host) = public_host.filter(|h| !h.is_empty()) {
        return host.to_string();
    }

    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_resolve_host_prefers_public_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        let uri: Uri = "/v1/files".parse().unwrap();

        assert_eq!(
            resolve_host(Some("https://videos.example.com"), &headers, &uri),
            "https://videos.example.com"
        );
        assert_eq!(resolve_host(None, &headers, &uri), "internal:8080");
        assert_eq!(resolve_host(Some(""), &headers, &uri), "internal:8080");
    }

    #[test]
    fn test_resolve_host_falls_back_to_authority() {
        let uri: Uri = "http://localhost:8080/v1/files".parse().unwrap();
        assert_eq!(resolve_host(None, &HeaderMap::new(), &uri), "localhost:8080");
    }
}
