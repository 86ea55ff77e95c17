//! Videostore Storage Library
//!
//! This crate provides the storage abstraction for uploaded videos and two
//! implementations: the local filesystem and an in-memory store used by tests.
//!
//! # Storage key format
//!
//! A key is the file id (the uploaded filename), stored flat under the
//! storage root. Uploads are first written under a staging key of the form
//! `.upload-{uuid}` and promoted to the canonical key once their metadata
//! record is committed. Keys must not be `.` or `..` and must not contain a
//! path separator.

pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use keys::{is_staging_key, staging_key};
pub use local::LocalStorage;
pub use memory::{MemoryStorage, StorageOp};
pub use traits::{Storage, StorageError, StorageResult};
