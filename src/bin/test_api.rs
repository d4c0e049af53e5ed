use upi_pay_ledger::{api, config, db, state::AppState, store::TransactionStore};
use std::sync::Arc;
use std::time::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting API integration tests...");

    // 1. Setup
    info!("Setting up test environment...");
    let config = config::Config::from_env();
    let db_pool = db::connection::establish_connection(&config.database_url).await?;

    // Use a dedicated key so a real history is never touched
    let storage_key = format!("{}_smoke_test", config.storage_key);
    sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(&storage_key)
        .execute(&db_pool)
        .await?;
    info!("✅ Test key cleaned!");

    let store = TransactionStore::new(Arc::new(db::SqliteBackend::new(db_pool)), &storage_key);
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
    });

    // 2. Start API server in a background task
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_state = app_state.clone();

    let port = 3333; // Use a different port than main app for testing
    let server_addr = format!("127.0.0.1:{}", port);
    info!("Starting test server on {}", server_addr);

    let listener = tokio::net::TcpListener::bind(&server_addr).await?;
    let server_handle = tokio::spawn(async move {
        let app = api::create_router(server_state);
        tokio::select! {
            result = axum::serve(listener, app) => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                }
            }
            _ = shutdown_rx => {
                info!("Server shutdown received");
            }
        }
    });

    // Give the server time to start
    sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let base_url = format!("http://{}", server_addr);

    // 3. Scanned text -> prefilled form
    info!("\n===== Testing /intents/parse =====");
    let response = client
        .post(format!("{}/intents/parse", base_url))
        .json(&json!({ "text": "Pay here: upi://pay?pa=chai.stall@okaxis&pn=Chai%20Stall&am=40&tn=tea" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let intent: Value = response.json().await?;
    assert_eq!(intent["data"]["payeeAddress"], "chai.stall@okaxis");
    assert_eq!(intent["data"]["amount"], "40");
    assert_eq!(intent["data"]["note"], "tea");
    info!("✅ Embedded payment link parsed with every parameter");

    // 4. Submit the form
    info!("\n===== Testing /transactions =====");
    let response = client
        .post(format!("{}/transactions", base_url))
        .json(&json!({
            "payeeAddress": intent["data"]["payeeAddress"],
            "payeeName": intent["data"]["payeeName"],
            "amount": intent["data"]["amount"],
            "note": intent["data"]["note"],
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await?;
    let id = created["data"]["transaction"]["id"]
        .as_str()
        .ok_or("created transaction has no id")?
        .to_string();
    info!("✅ Created transaction {} -> {}", id, created["data"]["paymentLink"]);

    // 5. Payment app reported failure -> soft delete
    let response = client
        .post(format!("{}/transactions/{}/status", base_url, id))
        .json(&json!({ "status": "failed" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let failed: Value = response.json().await?;
    assert_eq!(failed["data"]["status"], "Deleted");
    info!("✅ Failed payment collapsed to Deleted");

    // 6. Restore and complete
    let response = client
        .post(format!("{}/transactions/{}/restore", base_url, id))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/transactions/{}/status", base_url, id))
        .json(&json!({ "status": "completed" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    info!("✅ Restored and completed");

    // 7. Listing and export
    let response = client.get(format!("{}/transactions", base_url)).send().await?;
    let total_count = response
        .headers()
        .get("X-Total-Count")
        .ok_or("Missing X-Total-Count header")?
        .to_str()?
        .parse::<usize>()?;
    assert_eq!(total_count, 1);

    let response = client.get(format!("{}/export?format=csv", base_url)).send().await?;
    let csv = response.text().await?;
    info!("Export preview:\n{}", csv);
    assert!(csv.contains("chai.stall@okaxis"));
    info!("✅ Export rendered");

    // 8. Cleanup
    let response = client
        .delete(format!("{}/transactions?confirm=true", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    info!("✅ Test data cleared");

    let _ = shutdown_tx.send(());
    server_handle.await?;

    info!("All API integration tests passed!");
    Ok(())
}
