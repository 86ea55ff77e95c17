use std::path::Path;
use videostore_core::AppError;

/// Number of leading bytes inspected when sniffing content
pub const SNIFF_LEN: usize = 512;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported media type: {content_type} (allowed: {allowed:?})")]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => {
                AppError::PayloadTooLarge(format!("{} bytes exceeds max {} bytes", size, max))
            }
            ValidationError::UnsupportedMediaType { content_type, .. } => {
                AppError::UnsupportedMediaType(content_type)
            }
            ValidationError::InvalidFilename(name) => {
                AppError::InvalidInput(format!("Invalid filename: {}", name))
            }
            ValidationError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
        }
    }
}

/// Where a detected content type came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// Magic bytes at the start of the payload
    Content,
    /// Filename extension, only consulted when sniffing recognizes nothing
    Extension,
}

/// Decides whether an upload is an accepted media type.
///
/// The allow-list is supplied by the caller. Content sniffing is
/// authoritative; the filename extension is consulted only when sniffing
/// recognizes nothing and `extension_fallback` is enabled.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
    extension_fallback: bool,
}

impl ContentValidator {
    pub fn new(
        max_file_size: usize,
        allowed_content_types: Vec<String>,
        extension_fallback: bool,
    ) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
            extension_fallback,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate that a filename can serve as a flat storage key
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains('/')
            || filename.contains('\\')
            || filename.chars().any(char::is_control)
        {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }
        Ok(())
    }

    /// Validate content type against the allow-list
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::UnsupportedMediaType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Determine the content type of an upload.
    ///
    /// Returns `None` when neither the bytes nor (if enabled) the extension
    /// identify a known type.
    pub fn detect(&self, filename: &str, data: &[u8]) -> Option<(&'static str, DetectionSource)> {
        if let Some(content_type) = sniff(data) {
            return Some((content_type, DetectionSource::Content));
        }

        if self.extension_fallback {
            return content_type_for_extension(filename)
                .map(|content_type| (content_type, DetectionSource::Extension));
        }

        None
    }

    /// Run every check on an upload and return its accepted content type.
    pub fn validate_all(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<&'static str, ValidationError> {
        self.validate_filename(filename)?;
        self.validate_file_size(data.len())?;

        let (content_type, source) =
            self.detect(filename, data)
                .ok_or_else(|| ValidationError::UnsupportedMediaType {
                    content_type: "unknown".to_string(),
                    allowed: self.allowed_content_types.clone(),
                })?;

        if let Err(e) = self.validate_content_type(content_type) {
            tracing::debug!(
                filename = %filename,
                content_type = %content_type,
                source = ?source,
                "Rejected upload content type"
            );
            return Err(e);
        }

        if source == DetectionSource::Extension {
            tracing::warn!(
                filename = %filename,
                content_type = %content_type,
                "Content not recognized, accepted by filename extension"
            );
        }

        Ok(content_type)
    }
}

/// Detect a MIME type from the leading bytes of a payload.
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    let head = &data[..data.len().min(SNIFF_LEN)];
    infer::get(head).map(|kind| kind.mime_type())
}

/// Map a filename extension to its MIME type.
pub fn content_type_for_extension(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let content_type = match extension.as_str() {
        // Videos
        "mp4" => "video/mp4",
        "mpeg" | "mpg" | "mpe" => "video/mpeg",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        // Other
        "txt" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => return None,
    };

    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4_HEADER: &[u8] = &[
        0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
        0x00, b'i', b's', b'o', b'm', b'i', b's', b'o', b'2',
    ];
    const MPEG_HEADER: &[u8] = &[0x00, 0x00, 0x01, 0xBA, 0x44, 0x00, 0x04, 0x00, 0x04, 0x01];
    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    fn test_validator() -> ContentValidator {
        ContentValidator::new(
            1024 * 1024, // 1MB
            vec!["video/mp4".to_string(), "video/mpeg".to_string()],
            false,
        )
    }

    #[test]
    fn test_sniff_mp4() {
        assert_eq!(sniff(MP4_HEADER), Some("video/mp4"));
    }

    #[test]
    fn test_sniff_mpeg() {
        assert_eq!(sniff(MPEG_HEADER), Some("video/mpeg"));
    }

    #[test]
    fn test_sniff_plain_text_is_unknown() {
        assert_eq!(sniff(b"hello, this is not a video"), None);
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(2 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_filename() {
        let validator = test_validator();
        assert!(validator.validate_filename("sample.mp4").is_ok());
        assert!(validator.validate_filename("").is_err());
        assert!(validator.validate_filename("../sample.mp4").is_err());
        assert!(validator.validate_filename("dir/sample.mp4").is_err());
        assert!(validator.validate_filename("bad\nname.mp4").is_err());
        assert!(validator.validate_filename(".").is_err());
        assert!(validator.validate_filename("..").is_err());
    }

    #[test]
    fn test_validate_filename_allows_inner_dots() {
        let validator = test_validator();
        assert!(validator.validate_filename("my..clip.mp4").is_ok());
        assert!(validator.validate_filename("..clip.mp4").is_ok());
        assert!(validator.validate_filename(".hidden.mp4").is_ok());
    }

    #[test]
    fn test_validate_content_type_case_insensitive() {
        let validator = test_validator();
        assert!(validator.validate_content_type("VIDEO/MP4").is_ok());
        assert!(validator.validate_content_type("video/webm").is_err());
    }

    #[test]
    fn test_validate_all_accepts_sniffed_video() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_all("sample.mp4", MP4_HEADER).unwrap(),
            "video/mp4"
        );
        assert_eq!(
            validator.validate_all("clip.mpeg", MPEG_HEADER).unwrap(),
            "video/mpeg"
        );
    }

    #[test]
    fn test_validate_all_content_wins_over_extension() {
        let validator = test_validator();
        // PNG bytes renamed to .mp4
        assert!(matches!(
            validator.validate_all("fake.mp4", PNG_HEADER),
            Err(ValidationError::UnsupportedMediaType { content_type, .. }) if content_type == "image/png"
        ));
        // Video bytes under a misleading name are still accepted
        assert!(validator.validate_all("video.txt", MP4_HEADER).is_ok());
    }

    #[test]
    fn test_validate_all_rejects_unknown_without_fallback() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_all("test.mp4", b"plain text body"),
            Err(ValidationError::UnsupportedMediaType { .. })
        ));
    }

    #[test]
    fn test_extension_fallback() {
        let validator = ContentValidator::new(
            1024,
            vec!["video/mp4".to_string(), "video/mpeg".to_string()],
            true,
        );
        assert_eq!(
            validator.detect("test.mp4", b"opaque"),
            Some(("video/mp4", DetectionSource::Extension))
        );
        assert!(validator.validate_all("test.mp4", b"opaque").is_ok());
        assert!(validator.validate_all("test.txt", b"opaque").is_err());
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("a.MP4"), Some("video/mp4"));
        assert_eq!(content_type_for_extension("a.mpg"), Some("video/mpeg"));
        assert_eq!(content_type_for_extension("noext"), None);
        assert_eq!(content_type_for_extension("a.xyz"), None);
    }

    #[test]
    fn test_validation_error_into_app_error() {
        let err: AppError = ValidationError::UnsupportedMediaType {
            content_type: "text/plain".to_string(),
            allowed: vec![],
        }
        .into();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));

        let err: AppError = ValidationError::FileTooLarge { size: 2, max: 1 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }
}
