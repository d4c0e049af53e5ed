//! Best-effort recovery of a payment intent from scanned or pasted text.
//!
//! QR codes in the wild carry anything from a clean `upi://pay?...` link to
//! prose that merely mentions a UPI ID. `parse` never fails: whatever cannot
//! be interpreted comes back as an empty (degraded) intent.

use crate::models::{PaymentIntent, DEFAULT_CURRENCY};
use fancy_regex::Regex;
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use url::Url;

pub const PAY_PREFIX: &str = "upi://pay";

/// A single `@` between a local part and a domain-like suffix, not glued to
/// neighbouring handle characters.
static HANDLE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?<![A-Za-z0-9._@-])[A-Za-z0-9._-]+@[A-Za-z][A-Za-z0-9-]*(?:\.[A-Za-z0-9-]+)*(?![A-Za-z0-9_@-])",
    )
    .ok()
});

pub fn parse(text: &str) -> PaymentIntent {
    let text = text.trim();

    if starts_with_prefix(text) {
        debug!("Parsing payment link");
        return parse_link(text).unwrap_or_else(|| fallback_to_handle(text));
    }

    if let Some(start) = find_prefix(text) {
        // Capture the whole query string, not just the first parameter.
        let embedded = text[start..]
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default();
        debug!("Parsing payment link embedded at offset {}", start);
        return parse_link(embedded).unwrap_or_else(|| fallback_to_handle(text));
    }

    if text.contains('@') {
        return fallback_to_handle(text);
    }

    debug!("No payment information recognised in input");
    PaymentIntent::default()
}

/// First handle-shaped substring of `text`, if any.
pub fn extract_handle(text: &str) -> Option<&str> {
    let re = HANDLE_RE.as_ref()?;
    match re.find(text) {
        Ok(found) => found.map(|m| m.as_str()),
        Err(e) => {
            warn!("Handle pattern failed on input: {}", e);
            None
        }
    }
}

fn starts_with_prefix(text: &str) -> bool {
    text.get(..PAY_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PAY_PREFIX))
}

fn find_prefix(text: &str) -> Option<usize> {
    text.to_ascii_lowercase().find(PAY_PREFIX)
}

fn parse_link(link: &str) -> Option<PaymentIntent> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(e) => {
            warn!("Malformed payment link ({}), falling back to handle extraction", e);
            return None;
        }
    };

    let mut intent = PaymentIntent {
        currency: String::new(),
        ..PaymentIntent::default()
    };

    for (key, value) in url.query_pairs() {
        let slot = match &*key {
            "pa" => &mut intent.payee_address,
            "pn" => &mut intent.payee_name,
            "am" => &mut intent.amount,
            "cu" => &mut intent.currency,
            "tn" => &mut intent.note,
            _ => continue,
        };
        // First occurrence wins.
        if slot.is_empty() {
            *slot = value.into_owned();
        }
    }

    if intent.currency.is_empty() {
        intent.currency = DEFAULT_CURRENCY.to_string();
    }

    Some(intent)
}

fn fallback_to_handle(text: &str) -> PaymentIntent {
    match extract_handle(text) {
        Some(handle) => {
            debug!("Recovered payee handle {} from free text", handle);
            PaymentIntent {
                payee_address: handle.to_string(),
                ..PaymentIntent::default()
            }
        }
        None => PaymentIntent::default(),
    }
}
