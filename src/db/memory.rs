//! In-process blob storage with switchable faults.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueBackend, StorageError};

#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a raw blob.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut backend = Self::default();
        backend
            .entries
            .get_mut()
            .insert(key.to_string(), value.to_string());
        backend
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw blob currently stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        // Suspend like real I/O so that interleavings are observable.
        tokio::task::yield_now().await;
        self.check(&self.fail_reads, "read")?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.check(&self.fail_writes, "write")?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.check(&self.fail_writes, "remove")?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
