//! CSV and JSON renderings of the transaction history.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::models::Transaction;

pub const EXPORT_COLUMNS: [&str; 7] = [
    "Date",
    "Time",
    "UPI ID",
    "Payee Name",
    "Amount",
    "Description",
    "Status",
];

const NOT_AVAILABLE: &str = "N/A";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to flush export buffer")]
    Flush,

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// One export line, fields in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub time: String,
    pub upi_id: String,
    pub payee_name: String,
    pub amount: String,
    pub description: String,
    pub status: String,
}

impl ExportRow {
    pub fn fields(&self) -> [&str; 7] {
        [
            self.date.as_str(),
            self.time.as_str(),
            self.upi_id.as_str(),
            self.payee_name.as_str(),
            self.amount.as_str(),
            self.description.as_str(),
            self.status.as_str(),
        ]
    }
}

impl From<&Transaction> for ExportRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date(),
            time: tx.time(),
            upi_id: tx.payee_address.clone(),
            payee_name: tx.payee_name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            amount: tx.amount.clone(),
            description: tx.note.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            status: tx.status.to_string(),
        }
    }
}

pub async fn to_csv(records: &[Transaction]) -> Result<String, ExportError> {
    let mut writer = csv_async::AsyncWriter::from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS).await?;
    for tx in records {
        writer.write_record(ExportRow::from(tx).fields()).await?;
    }

    let buffer = match writer.into_inner().await {
        Ok(buffer) => buffer,
        Err(_) => return Err(ExportError::Flush),
    };
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn to_json(records: &[Transaction]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub async fn render(records: &[Transaction], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(records).await,
        ExportFormat::Json => to_json(records),
    }
}
