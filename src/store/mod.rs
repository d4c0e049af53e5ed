//! Persisted transaction history.
//!
//! The whole collection lives in one JSON blob under a fixed key. Every
//! mutation is a read-modify-write of that blob, so mutations are serialized
//! through `writer`; readers are served from the last committed snapshot.

mod error;

pub use error::StoreError;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::KeyValueBackend;
use crate::models::{NewTransaction, Transaction, TransactionStatus, TransitionTarget};
use crate::validation::validate_new_transaction;

pub const DEFAULT_STORAGE_KEY: &str = "transactions";

type Snapshot = Arc<Vec<Transaction>>;

#[derive(Clone)]
pub struct TransactionStore {
    backend: Arc<dyn KeyValueBackend>,
    key: Arc<str>,
    /// `None` until the blob is first read.
    snapshot: Arc<RwLock<Option<Snapshot>>>,
    writer: Arc<Mutex<()>>,
}

impl TransactionStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: &str) -> Self {
        Self {
            backend,
            key: Arc::from(key),
            snapshot: Arc::new(RwLock::new(None)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// All records, most recent first.
    pub async fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.snapshot().await?.as_ref().clone())
    }

    pub async fn list_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, StoreError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .iter()
            .filter(|tx| tx.status == status)
            .cloned()
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Transaction, StoreError> {
        let snapshot = self.snapshot().await?;
        snapshot
            .iter()
            .find(|tx| tx.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn create(&self, fields: NewTransaction) -> Result<Transaction, StoreError> {
        self.create_at(fields, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        fields: NewTransaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction, StoreError> {
        let fields = validate_new_transaction(fields)?;

        let created = self
            .mutate(|records| {
                let mut id = Uuid::new_v4().to_string();
                while records.iter().any(|tx| tx.id == id) {
                    id = Uuid::new_v4().to_string();
                }

                let tx = Transaction {
                    id,
                    created_at: now,
                    payee_address: fields.payee_address,
                    payee_name: fields.payee_name,
                    amount: fields.amount,
                    note: fields.note,
                    status: TransactionStatus::Pending,
                    deleted_at: None,
                };
                records.insert(0, tx.clone());
                Ok(tx)
            })
            .await?;

        info!("Created transaction {} to {}", created.id, created.payee_address);
        Ok(created)
    }

    pub async fn transition(
        &self,
        id: &str,
        target: TransitionTarget,
    ) -> Result<Transaction, StoreError> {
        self.transition_at(id, target, Utc::now()).await
    }

    /// Moves a pending record to `Completed`, or collapses it to `Deleted`
    /// when it failed.
    pub async fn transition_at(
        &self,
        id: &str,
        target: TransitionTarget,
        now: DateTime<Utc>,
    ) -> Result<Transaction, StoreError> {
        let updated = self
            .mutate(|records| {
                let tx = find_mut(records, id)?;
                if tx.status != TransactionStatus::Pending {
                    return Err(StoreError::InvalidTransition {
                        id: id.to_string(),
                        from: tx.status,
                        action: format!("mark as {}", target),
                    });
                }

                match target {
                    TransitionTarget::Completed => {
                        tx.status = TransactionStatus::Completed;
                    }
                    TransitionTarget::Failed => {
                        tx.status = TransactionStatus::Deleted;
                        tx.deleted_at = Some(now);
                    }
                }
                Ok(tx.clone())
            })
            .await?;

        info!("Transaction {} marked {} (now {})", id, target, updated.status);
        Ok(updated)
    }

    pub async fn restore(&self, id: &str) -> Result<Transaction, StoreError> {
        let restored = self
            .mutate(|records| {
                let tx = find_mut(records, id)?;
                if tx.status != TransactionStatus::Deleted {
                    return Err(StoreError::InvalidTransition {
                        id: id.to_string(),
                        from: tx.status,
                        action: "restore".to_string(),
                    });
                }

                tx.status = TransactionStatus::Pending;
                tx.deleted_at = None;
                Ok(tx.clone())
            })
            .await?;

        info!("Restored transaction {}", id);
        Ok(restored)
    }

    /// Permanently removes a record whatever its status.
    pub async fn delete(&self, id: &str) -> Result<Transaction, StoreError> {
        let removed = self
            .mutate(|records| {
                let index = records
                    .iter()
                    .position(|tx| tx.id == id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                Ok(records.remove(index))
            })
            .await?;

        info!("Permanently deleted transaction {}", id);
        Ok(removed)
    }

    /// Wipes the whole history. Returns how many records were dropped.
    /// An undecodable blob is still removed; it counts as zero records.
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        let _guard = self.writer.lock().await;
        let count = match self.snapshot().await {
            Ok(snapshot) => snapshot.len(),
            Err(StoreError::Corrupted(e)) => {
                warn!("Discarding corrupted transaction blob under key {}: {}", self.key, e);
                0
            }
            Err(e) => return Err(e),
        };

        self.backend.remove(&self.key).await?;
        *self.snapshot.write().await = Some(Arc::new(Vec::new()));

        warn!("Cleared all {} transactions", count);
        Ok(count)
    }

    /// Hard-removes deleted records whose `deleted_at` is strictly before `cutoff`.
    pub async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let purged = self
            .mutate(|records| {
                let before = records.len();
                records.retain(|tx| match (tx.status, tx.deleted_at) {
                    (TransactionStatus::Deleted, Some(deleted_at)) => deleted_at >= cutoff,
                    (TransactionStatus::Deleted, None) => {
                        warn!("Deleted transaction {} has no deletion time; keeping it", tx.id);
                        true
                    }
                    _ => true,
                });
                Ok(before - records.len())
            })
            .await?;

        if purged > 0 {
            info!("Purged {} deleted transactions older than {}", purged, cutoff);
        }
        Ok(purged)
    }

    /// Runs one read-modify-write cycle while holding the writer lock.
    /// The snapshot is only replaced after the backend write succeeds.
    async fn mutate<T, F>(&self, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Transaction>) -> Result<T, StoreError>,
    {
        let _guard = self.writer.lock().await;

        let current = self.snapshot().await?;
        let mut records = current.as_ref().clone();
        let out = apply(&mut records)?;

        if records == *current {
            return Ok(out);
        }

        let blob = serde_json::to_string(&records).map_err(StoreError::Encode)?;
        self.backend.set(&self.key, &blob).await?;
        *self.snapshot.write().await = Some(Arc::new(records));

        Ok(out)
    }

    /// Last committed snapshot, reading the blob on first use.
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(snapshot.clone());
        }

        // Load under the write lock so a concurrent commit cannot be
        // overwritten with an older blob.
        let mut slot = self.snapshot.write().await;
        if let Some(snapshot) = slot.as_ref() {
            return Ok(snapshot.clone());
        }

        let mut records: Vec<Transaction> = match self.backend.get(&self.key).await? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => Vec::new(),
        };
        normalize_deletion_times(&mut records);
        debug!("Loaded {} transactions from key {}", records.len(), self.key);

        let snapshot = Arc::new(records);
        *slot = Some(snapshot.clone());
        Ok(snapshot)
    }
}

/// Only deleted records carry a deletion time.
fn normalize_deletion_times(records: &mut [Transaction]) {
    for tx in records.iter_mut() {
        match (tx.status, tx.deleted_at) {
            (TransactionStatus::Deleted, None) => {
                warn!("Deleted transaction {} was loaded without a deletion time", tx.id);
            }
            (TransactionStatus::Deleted, Some(_)) | (_, None) => {}
            (status, Some(_)) => {
                warn!("Dropping stray deletion time from {} transaction {}", status, tx.id);
                tx.deleted_at = None;
            }
        }
    }
}

fn find_mut<'a>(records: &'a mut [Transaction], id: &str) -> Result<&'a mut Transaction, StoreError> {
    records
        .iter_mut()
        .find(|tx| tx.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}
