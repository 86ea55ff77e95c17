//! In-memory storage backend
//!
//! Keeps files in a map and lets tests force individual operations to fail.

use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Storage operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    EnsureDirectory,
    Write,
    Remove,
    Promote,
    Read,
}

/// In-memory storage for tests and local experiments
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Bytes>>>,
    failing: Arc<Mutex<HashSet<StorageOp>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail until cleared.
    pub fn fail_on(&self, op: StorageOp) {
        lock(&self.failing).insert(op);
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    pub fn set_file(&self, key: &str, data: impl Into<Bytes>) {
        lock(&self.files).insert(key.to_string(), data.into());
    }

    pub fn has_file(&self, key: &str) -> bool {
        lock(&self.files).contains_key(key)
    }

    pub fn get_file(&self, key: &str) -> Option<Bytes> {
        lock(&self.files).get(key).cloned()
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.files).keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check(&self, op: StorageOp, key: &str) -> StorageResult<()> {
        if !lock(&self.failing).contains(&op) {
            return Ok(());
        }
        let message = format!("injected {:?} failure for {}", op, key);
        Err(match op {
            StorageOp::EnsureDirectory => StorageError::ConfigError(message),
            StorageOp::Write | StorageOp::Promote => StorageError::UploadFailed(message),
            StorageOp::Remove => StorageError::DeleteFailed(message),
            StorageOp::Read => StorageError::DownloadFailed(message),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_directory(&self) -> StorageResult<()> {
        self.check(StorageOp::EnsureDirectory, "")
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        validate_key(key)?;
        self.check(StorageOp::Write, key)?;
        lock(&self.files).insert(key.to_string(), Bytes::from(data));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.check(StorageOp::Remove, key)?;
        lock(&self.files)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn promote(&self, from: &str, to: &str) -> StorageResult<()> {
        validate_key(from)?;
        validate_key(to)?;
        self.check(StorageOp::Promote, from)?;
        let mut files = lock(&self.files);
        let data = files
            .remove(from)
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        self.check(StorageOp::Read, key)?;
        lock(&self.files)
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(lock(&self.files).contains_key(key))
    }
}
