// Key-value persistence used by the transaction store.
// The store only ever needs get/set/remove of a single blob by key.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

pub const INIT_SCHEMA: &str = r#"
-- One row per persisted blob
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
