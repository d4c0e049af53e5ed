pub mod link;
pub mod parser;

pub use link::{build_payment_link, DEFAULT_PAYEE_NAME};
pub use parser::{extract_handle, parse, PAY_PREFIX};
