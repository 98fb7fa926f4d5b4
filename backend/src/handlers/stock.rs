//! Stock ledger and projection handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppError;
use crate::middleware::CurrentActor;
use crate::services::stock::{
    LedgerEntry, ReconciliationReport, StockLevel, StockService, StockValuation,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    pub delta: i64,
    pub note: Option<String>,
}

/// POST /stock/adjustments - manual stock correction
pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), AppError> {
    let service = StockService::new(state.db.clone());
    let entry = service
        .adjust(&actor.id, payload.product_id, payload.delta, payload.note)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /stock/products/:product_id - current projection
pub async fn get_stock_level(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<StockLevel>, AppError> {
    let service = StockService::new(state.db.clone());
    let level = service.get_stock_level(product_id).await?;

    Ok(Json(level))
}

/// GET /stock/products/:product_id/movements - audit trail, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<LedgerEntry>>, AppError> {
    let service = StockService::new(state.db.clone());
    let movements = service.list_movements(product_id, pagination).await?;

    Ok(Json(movements))
}

/// GET /stock/products/:product_id/valuation - on-hand value at average receipt cost
pub async fn get_valuation(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<StockValuation>, AppError> {
    let service = StockService::new(state.db.clone());
    let valuation = service.get_valuation(product_id).await?;

    Ok(Json(valuation))
}

/// POST /stock/products/:product_id/reconcile - recompute projection from the ledger
pub async fn reconcile_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ReconciliationReport>, AppError> {
    let service = StockService::new(state.db.clone());
    let report = service.reconcile(product_id).await?;

    Ok(Json(report))
}
