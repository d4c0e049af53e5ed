use crate::models::{NewTransaction, TransitionTarget};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub fn validate_target(status: &str) -> Result<TransitionTarget, ValidationError> {
    match status.trim().to_lowercase().as_str() {
        "completed" => Ok(TransitionTarget::Completed),
        "failed" => Ok(TransitionTarget::Failed),
        _ => Err(ValidationError::InvalidParameter(format!(
            "status '{}'. Must be 'completed' or 'failed'",
            status
        ))),
    }
}

pub fn validate_required(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingParameter(name.to_string()));
    }
    Ok(())
}

/// Trims every field, drops blank optional text and checks that the
/// payee address and amount are present.
pub fn validate_new_transaction(fields: NewTransaction) -> Result<NewTransaction, ValidationError> {
    validate_required("payeeAddress", &fields.payee_address)?;
    validate_required("amount", &fields.amount)?;

    Ok(NewTransaction {
        payee_address: fields.payee_address.trim().to_string(),
        payee_name: normalize_optional(fields.payee_name),
        amount: fields.amount.trim().to_string(),
        note: normalize_optional(fields.note),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
