//! Product batch handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::batch::{BatchService, ProductBatch, RecordBatchInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NearExpiryQuery {
    pub within_days: Option<i64>,
}

/// POST /stock/batches - record or top up a batch
pub async fn record_batch(
    State(state): State<AppState>,
    Json(payload): Json<RecordBatchInput>,
) -> Result<(StatusCode, Json<ProductBatch>), AppError> {
    let service = BatchService::new(state.db.clone());
    let batch = service.record_batch(payload).await?;

    Ok((StatusCode::CREATED, Json(batch)))
}

/// GET /stock/batches/near-expiry - batches expiring within the window,
/// soonest first
pub async fn find_near_expiry(
    State(state): State<AppState>,
    Query(query): Query<NearExpiryQuery>,
) -> Result<Json<Vec<ProductBatch>>, AppError> {
    let within_days = query
        .within_days
        .unwrap_or(state.config.alerts.near_expiry_days);

    let service = BatchService::new(state.db.clone());
    let batches = service.find_near_expiry(within_days).await?;

    Ok(Json(batches))
}

/// GET /stock/products/:product_id/batches - all batches for a product
pub async fn list_product_batches(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ProductBatch>>, AppError> {
    let service = BatchService::new(state.db.clone());
    let batches = service.list_batches(product_id).await?;

    Ok(Json(batches))
}
