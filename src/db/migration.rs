use sqlx::SqlitePool;
use tracing::info;

/// Idempotent schema setup for pools that were not opened through
/// `establish_connection` (e.g. in-memory pools in tests).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
