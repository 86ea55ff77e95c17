//! Shared key helpers for storage backends.
//!
//! Canonical key: `{id}`. Staging key for an in-flight upload: `.upload-{uuid}`,
//! a fixed-length name in the same directory, so any id that fits on disk
//! also has a staging name that fits and the final rename stays atomic.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

const STAGING_MARKER: &str = ".upload-";

/// Generate a fresh staging key for an upload.
///
/// Every upload attempt gets its own key, so two concurrent uploads of the
/// same id never write to the same file.
pub fn staging_key() -> String {
    format!("{}{}", STAGING_MARKER, Uuid::new_v4().simple())
}

/// Whether `key` names a staging file left by an upload that never completed.
pub fn is_staging_key(key: &str) -> bool {
    key.strip_prefix(STAGING_MARKER)
        .map(|suffix| Uuid::try_parse(suffix).is_ok())
        .unwrap_or(false)
}

/// Reject keys that could escape the storage root or address a subdirectory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key == "." || key == ".." || key.contains('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_key_is_unique_per_call() {
        let a = staging_key();
        let b = staging_key();
        assert_ne!(a, b);
        assert!(a.starts_with(".upload-"));
        assert!(is_staging_key(&a));
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn test_staging_key_length_is_fixed() {
        // NAME_MAX is 255 on common filesystems
        assert_eq!(staging_key().len(), ".upload-".len() + 32);
        assert!(staging_key().len() < 255);
    }

    #[test]
    fn test_canonical_key_is_not_staging() {
        assert!(!is_staging_key("clip.mp4"));
        assert!(!is_staging_key(".upload-notauuid"));
        assert!(!is_staging_key("clip.mp4.upload-0123456789abcdef0123456789abcdef"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("clip.mp4").is_ok());
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("/etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("nested/clip.mp4"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(validate_key("."), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key(".."), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_validate_key_allows_inner_dots() {
        assert!(validate_key("my..clip.mp4").is_ok());
        assert!(validate_key("clip...mp4").is_ok());
    }
}
