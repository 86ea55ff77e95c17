//! API constants

/// Versioned API prefix
pub const API_PREFIX: &str = "/v1";

/// Multipart form field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "data";

/// Allowance on top of the file size limit for multipart framing
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Per-dependency timeout for health checks, in seconds
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
