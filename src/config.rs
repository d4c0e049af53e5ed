// Configuration for:
// - SQLite database location and the key the history blob is stored under
// - Server listening address/port
// - Retention horizon and background sweep interval
// - Fallback payee name used when building payment links

use dotenv::dotenv;
use std::env;
use std::time::Duration;

use crate::intent::DEFAULT_PAYEE_NAME;
use crate::retention::{DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS};
use crate::store::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub storage_key: String,
    pub retention_days: i64,
    pub sweep_interval: Duration,
    pub default_payee_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:upi_ledger.db".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            sweep_interval: Duration::from_secs(3600),
            default_payee_name: DEFAULT_PAYEE_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = env::var("SERVER_PORT")
            .map(|v| v.parse().unwrap_or(defaults.server_port))
            .unwrap_or(defaults.server_port);
        let storage_key = env::var("STORAGE_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.storage_key);
        let retention_days = parse_retention_days(env::var("RETENTION_DAYS").ok());
        let sweep_interval = env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);
        let default_payee_name = env::var("DEFAULT_PAYEE_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_payee_name);

        Self {
            database_url,
            server_host,
            server_port,
            storage_key,
            retention_days,
            sweep_interval,
            default_payee_name,
        }
    }
}

/// Horizon in days, falling back to the default when unset, unparseable,
/// negative or beyond `MAX_RETENTION_DAYS`.
pub fn parse_retention_days(value: Option<String>) -> i64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|days: &i64| (0..=MAX_RETENTION_DAYS).contains(days))
        .unwrap_or(DEFAULT_RETENTION_DAYS)
}
