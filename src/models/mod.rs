// Transaction record persisted by the store
// Lifecycle status and the targets callers may request
// Payment intent recovered from scanned deep links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Deleted,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Completed => write!(f, "Completed"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

/// Targets accepted by `TransactionStore::transition`.
///
/// `Failed` never reaches storage: it collapses into `Deleted` with
/// `deleted_at` stamped at transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionTarget {
    Completed,
    Failed,
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub payee_address: String,
    #[serde(default)]
    pub payee_name: Option<String>,
    pub amount: String,
    #[serde(default)]
    pub note: Option<String>,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Display date, derived from `created_at`.
    pub fn date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }

    /// Display time, derived from the same `created_at` instant as `date`.
    pub fn time(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }
}

/// Confirmed form values handed to `TransactionStore::create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub payee_address: String,
    #[serde(default)]
    pub payee_name: Option<String>,
    pub amount: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub payee_address: String,
    pub payee_name: String,
    pub amount: String,
    pub currency: String,
    pub note: String,
}

impl Default for PaymentIntent {
    fn default() -> Self {
        Self {
            payee_address: String::new(),
            payee_name: String::new(),
            amount: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            note: String::new(),
        }
    }
}

impl PaymentIntent {
    /// True when nothing could be recovered from the input.
    pub fn is_degraded(&self) -> bool {
        self.payee_address.is_empty()
            && self.payee_name.is_empty()
            && self.amount.is_empty()
            && self.note.is_empty()
    }
}
