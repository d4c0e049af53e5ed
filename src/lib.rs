pub mod api;
pub mod config;
pub mod db;
pub mod export;
pub mod intent;
pub mod models;
pub mod retention;
pub mod state;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use db::{KeyValueBackend, MemoryBackend, SqliteBackend, StorageError};
pub use intent::{build_payment_link, parse};
pub use models::{NewTransaction, PaymentIntent, Transaction, TransactionStatus, TransitionTarget};
pub use store::{StoreError, TransactionStore};
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
