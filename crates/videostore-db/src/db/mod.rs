//! Database repositories for the data access layer
//
// File metadata repositories
pub mod files;
//
// In-memory repository for tests
pub mod memory;

pub use files::{FileRepository, PgFileRepository};
pub use memory::{InMemoryFileRepository, RepositoryOp};
