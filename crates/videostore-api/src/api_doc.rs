//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use videostore_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Videostore API",
        version = "0.1.0",
        description = "Video file storage. Uploads are kept on the local filesystem with their metadata in PostgreSQL. All endpoints are versioned under /v1/."
    ),
    paths(
        handlers::files::upload_file,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::delete_file,
        handlers::health::health_check,
    ),
    components(schemas(
        models::FileInfo,
        error::ErrorResponse,
        handlers::health::HealthCheckResponse,
    )),
    tags(
        (name = "files", description = "Video file upload, listing, download and deletion"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_file_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/files"));
        assert!(doc.paths.paths.contains_key("/v1/files/{id}"));
        assert!(doc.paths.paths.contains_key("/v1/health"));
    }
}
