use crate::models::{Transaction, DEFAULT_CURRENCY};
use crate::validation::{validate_required, ValidationError};
use url::form_urlencoded;

use super::parser::PAY_PREFIX;

pub const DEFAULT_PAYEE_NAME: &str = "Recipient";

/// Builds the deep link handed to the installed payment app.
///
/// Parameters are emitted in the order `pa, pn, tn, am, cu`. `pa` and `am`
/// are required; a blank `pn` becomes [`DEFAULT_PAYEE_NAME`] and a blank `cu`
/// becomes `INR`.
pub fn build_payment_link(
    payee_address: &str,
    payee_name: Option<&str>,
    note: Option<&str>,
    amount: &str,
    currency: Option<&str>,
) -> Result<String, ValidationError> {
    validate_required("pa", payee_address)?;
    validate_required("am", amount)?;

    let payee_name = payee_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PAYEE_NAME);
    let currency = currency
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CURRENCY);

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("pa", payee_address.trim())
        .append_pair("pn", payee_name)
        .append_pair("tn", note.map(str::trim).unwrap_or_default())
        .append_pair("am", amount.trim())
        .append_pair("cu", currency)
        .finish();

    Ok(format!("{}?{}", PAY_PREFIX, query))
}

impl Transaction {
    /// Deep link for this record; `fallback_name` stands in for a missing payee name.
    pub fn payment_link(&self, fallback_name: &str) -> Result<String, ValidationError> {
        build_payment_link(
            &self.payee_address,
            self.payee_name.as_deref().or(Some(fallback_name)),
            self.note.as_deref(),
            &self.amount,
            None,
        )
    }
}
