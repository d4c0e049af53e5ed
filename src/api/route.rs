use crate::{
    api::{
        error::ApiError,
        response::{attachment, with_total_count, ApiResponse},
    },
    export::{self, ExportFormat},
    intent,
    models::{NewTransaction, PaymentIntent, Transaction, TransactionStatus},
    retention,
    state::AppState,
    validation::validate_target,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// POST /intents/parse body
#[derive(Deserialize)]
pub struct ParseRequest {
    text: String,
}

// POST /transactions/{id}/status body
#[derive(Deserialize)]
pub struct StatusRequest {
    status: String,
}

// GET /transactions query parameters
#[derive(Deserialize)]
pub struct TransactionsQuery {
    status: Option<String>,
}

// DELETE /transactions query parameters
#[derive(Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    confirm: bool,
}

// GET /export query parameters
#[derive(Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
    status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTransaction {
    pub transaction: Transaction,
    pub payment_link: String,
}

#[derive(Serialize)]
pub struct SweepResult {
    pub purged: usize,
}

#[derive(Serialize)]
pub struct ClearResult {
    pub cleared: usize,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/intents/parse", post(parse_intent))
        .route("/transactions", get(list_transactions).post(create_transaction).delete(clear_transactions))
        .route("/transactions/{id}", get(get_transaction).delete(delete_transaction))
        .route("/transactions/{id}/status", post(transition_transaction))
        .route("/transactions/{id}/restore", post(restore_transaction))
        .route("/retention/sweep", post(sweep_retention))
        .route("/export", get(export_transactions))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn parse_status(status: &str) -> Result<TransactionStatus, ApiError> {
    match status.trim().to_lowercase().as_str() {
        "pending" => Ok(TransactionStatus::Pending),
        "completed" => Ok(TransactionStatus::Completed),
        "deleted" => Ok(TransactionStatus::Deleted),
        _ => Err(ApiError::InvalidParameter(format!(
            "status must be one of pending, completed, deleted (got '{}')",
            status
        ))),
    }
}

async fn filtered(state: &AppState, status: Option<&str>) -> Result<Vec<Transaction>, ApiError> {
    let records = match status {
        Some(status) => state.store.list_by_status(parse_status(status)?).await?,
        None => state.store.list().await?,
    };
    Ok(records)
}

// POST /intents/parse handler
async fn parse_intent(Json(request): Json<ParseRequest>) -> ApiResponse<PaymentIntent> {
    let parsed = intent::parse(&request.text);
    if parsed.is_degraded() {
        warn!("Could not interpret scanned text as a payment");
    }
    ApiResponse::new(parsed)
}

// POST /transactions handler
async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<NewTransaction>,
) -> Result<Response, ApiError> {
    let transaction = state.store.create(fields).await?;
    let payment_link = transaction.payment_link(&state.config.default_payee_name)?;

    info!("Issued payment link for transaction {}", transaction.id);
    Ok(ApiResponse::new(CreatedTransaction { transaction, payment_link })
        .with_status(StatusCode::CREATED))
}

// GET /transactions handler
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Response, ApiError> {
    let records = filtered(&state, params.status.as_deref()).await?;
    let total = records.len();
    Ok(with_total_count(records, total))
}

// GET /transactions/{id} handler
async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Transaction>, ApiError> {
    Ok(ApiResponse::new(state.store.get(&id).await?))
}

// POST /transactions/{id}/status handler
async fn transition_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<ApiResponse<Transaction>, ApiError> {
    let target = validate_target(&request.status)?;
    Ok(ApiResponse::new(state.store.transition(&id, target).await?))
}

// POST /transactions/{id}/restore handler
async fn restore_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Transaction>, ApiError> {
    Ok(ApiResponse::new(state.store.restore(&id).await?))
}

// DELETE /transactions/{id} handler
async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// DELETE /transactions handler
async fn clear_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClearQuery>,
) -> Result<ApiResponse<ClearResult>, ApiError> {
    if !params.confirm {
        return Err(ApiError::BadRequest(
            "Clearing all transactions requires confirm=true".to_string(),
        ));
    }
    let cleared = state.store.clear_all().await?;
    Ok(ApiResponse::new(ClearResult { cleared }))
}

// POST /retention/sweep handler
async fn sweep_retention(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<SweepResult>, ApiError> {
    let purged = retention::sweep(&state.store, chrono::Utc::now(), state.config.retention_days).await?;
    Ok(ApiResponse::new(SweepResult { purged }))
}

// GET /export handler
async fn export_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = params.format.as_deref().unwrap_or("csv").parse()?;
    let records = filtered(&state, params.status.as_deref()).await?;

    info!("Exporting {} transactions as {:?}", records.len(), format);
    let body = export::render(&records, format).await?;
    Ok(attachment(body, format.content_type()))
}
