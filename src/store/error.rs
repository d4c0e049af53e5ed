use crate::db::StorageError;
use crate::models::TransactionStatus;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Cannot {action} transaction {id} while it is {from}")]
    InvalidTransition {
        id: String,
        from: TransactionStatus,
        action: String,
    },

    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persisted transaction data is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("Failed to encode transactions for storage: {0}")]
    Encode(serde_json::Error),

    #[error("Invalid retention horizon: {0} days")]
    InvalidHorizon(i64),
}
