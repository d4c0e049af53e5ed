use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::store::{StoreError, TransactionStore};

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Largest horizon accepted from configuration (100 years).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Purges deleted records that have been deleted for more than
/// `horizon_days` as of `now`. Returns the number of records removed.
pub async fn sweep(
    store: &TransactionStore,
    now: DateTime<Utc>,
    horizon_days: i64,
) -> Result<usize, StoreError> {
    if horizon_days < 0 {
        return Err(StoreError::InvalidHorizon(horizon_days));
    }

    let cutoff = match chrono::Duration::try_days(horizon_days)
        .and_then(|horizon| now.checked_sub_signed(horizon))
    {
        Some(cutoff) => cutoff,
        None => {
            // Nothing can have been deleted before the start of time.
            debug!("Retention horizon of {} days reaches past the earliest time", horizon_days);
            return Ok(0);
        }
    };
    debug!("Sweeping deleted transactions older than {}", cutoff);
    store.purge_deleted_before(cutoff).await
}

/// Catches up on retention for the time the process was not running.
pub async fn run_startup_sweep(
    store: &TransactionStore,
    horizon_days: i64,
) -> Result<usize, StoreError> {
    let purged = sweep(store, Utc::now(), horizon_days).await?;
    info!("Startup retention sweep purged {} transactions", purged);
    Ok(purged)
}

pub fn spawn_periodic_sweeper(
    store: TransactionStore,
    horizon_days: i64,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting retention sweeper (every {:?}, horizon {} days)", period, horizon_days);

        // The startup sweep already covered "now".
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep(&store, Utc::now(), horizon_days).await {
                        Ok(purged) if purged > 0 => info!("Retention sweep purged {} transactions", purged),
                        Ok(_) => debug!("Retention sweep found nothing to purge"),
                        Err(e) => error!("Retention sweep failed: {}", e),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutting down retention sweeper");
                    break;
                }
            }
        }
    })
}
