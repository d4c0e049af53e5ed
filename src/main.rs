// Initialize configuration
// Set up logging
// Open the SQLite-backed transaction store
// Purge expired soft-deleted records, then keep sweeping in the background
// Start HTTP server

use upi_pay_ledger::{api, config::Config, db, retention, state::AppState, store::TransactionStore};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting upi-pay-ledger");

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    // Setup database connection
    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    tracing::info!("Database connection established");

    let backend = Arc::new(db::SqliteBackend::new(db_pool));
    let store = TransactionStore::new(backend, &config.storage_key);

    // Surface unreadable history before accepting requests
    let existing = store.list().await?;
    tracing::info!("Loaded {} transactions", existing.len());

    retention::run_startup_sweep(&store, config.retention_days).await?;

    let shutdown = CancellationToken::new();
    let sweeper = retention::spawn_periodic_sweeper(
        store.clone(),
        config.retention_days,
        config.sweep_interval,
        shutdown.clone(),
    );

    // Create shared state
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
    });

    // Start HTTP server
    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper.await?;
    tracing::info!("Shutdown complete");

    Ok(())
}
