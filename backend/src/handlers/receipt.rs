//! Goods receipt handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppError;
use crate::middleware::CurrentActor;
use crate::services::receipt::{
    GoodsReceipt, GoodsReceiptService, GoodsReceiptWithItems, ReceiveGoodsInput, RepairOutcome,
};
use crate::AppState;

/// POST /stock/receipts - record a goods receipt and apply its movements
pub async fn receive_goods(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<ReceiveGoodsInput>,
) -> Result<(StatusCode, Json<GoodsReceiptWithItems>), AppError> {
    let service = GoodsReceiptService::new(state.db.clone());
    let receipt = service.receive(&actor.id, payload).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /stock/receipts - paged receipt headers, newest first
pub async fn list_receipts(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<GoodsReceipt>>, AppError> {
    let service = GoodsReceiptService::new(state.db.clone());
    let receipts = service.list_receipts(pagination).await?;

    Ok(Json(receipts))
}

/// GET /stock/receipts/:receipt_id - receipt with its line items
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<Uuid>,
) -> Result<Json<GoodsReceiptWithItems>, AppError> {
    let service = GoodsReceiptService::new(state.db.clone());
    let receipt = service.get_receipt(receipt_id).await?;

    Ok(Json(receipt))
}

/// POST /stock/receipts/:receipt_id/repair - apply any missing receipt movements
pub async fn repair_receipt(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(receipt_id): Path<Uuid>,
) -> Result<Json<RepairOutcome>, AppError> {
    let service = GoodsReceiptService::new(state.db.clone());
    let outcome = service.repair(&actor.id, receipt_id).await?;

    Ok(Json(outcome))
}
