//! In-memory file repository
//!
//! Mirrors the PostgreSQL semantics (unique ids, default `created_at`) and
//! lets tests force individual operations to fail.

use crate::db::files::FileRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use videostore_core::models::FileRecord;
use videostore_core::AppError;

/// Repository operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOp {
    Insert,
    Delete,
    List,
    Get,
    Ping,
}

#[derive(Clone, Default)]
pub struct InMemoryFileRepository {
    records: Arc<Mutex<BTreeMap<String, FileRecord>>>,
    failing: Arc<Mutex<HashSet<RepositoryOp>>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail with a database error until cleared.
    pub fn fail_on(&self, op: RepositoryOp) {
        lock(&self.failing).insert(op);
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    pub fn get(&self, id: &str) -> Option<FileRecord> {
        lock(&self.records).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    fn check(&self, op: RepositoryOp) -> Result<(), AppError> {
        if lock(&self.failing).contains(&op) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        self.check(RepositoryOp::Insert)?;
        let mut records = lock(&self.records);
        if records.contains_key(&record.id) {
            return Err(AppError::DuplicateKey(record.id.clone()));
        }
        let mut stored = record.clone();
        stored.created_at.get_or_insert_with(Utc::now);
        records.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<FileRecord, AppError> {
        self.check(RepositoryOp::Delete)?;
        lock(&self.records)
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("File {} does not exist", id)))
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>, AppError> {
        self.check(RepositoryOp::List)?;
        Ok(lock(&self.records).values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        self.check(RepositoryOp::Get)?;
        Ok(self.get(id))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check(RepositoryOp::Ping)
    }
}
