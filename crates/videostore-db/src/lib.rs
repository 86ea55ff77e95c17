//! Videostore DB Library
//!
//! Metadata persistence for stored files: the `FileRepository` capability
//! trait, its PostgreSQL implementation and an in-memory double.

pub mod db;

pub use db::{FileRepository, InMemoryFileRepository, PgFileRepository, RepositoryOp};
