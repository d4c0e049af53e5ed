use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::export::ExportError;
use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "Transaction storage is unavailable".to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingParameter(param) =>
                ApiError::BadRequest(format!("Missing parameter: {}", param)),
            ValidationError::InvalidParameter(msg) => ApiError::InvalidParameter(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Transaction {}", id)),
            StoreError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            StoreError::Validation(err) => err.into(),
            StoreError::StorageUnavailable(_) | StoreError::Corrupted(_) => {
                error!("Store failure: {}", err);
                ApiError::Storage(err.to_string())
            }
            StoreError::Encode(_) | StoreError::InvalidHorizon(_) => {
                error!("Store failure: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(format) =>
                ApiError::InvalidParameter(format!("Unsupported export format: {}", format)),
            other => {
                error!("Export failure: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}
