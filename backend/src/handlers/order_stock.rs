//! Order reservation and release handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentActor;
use crate::services::order_stock::{
    OrderStockService, ReleaseOutcome, ReserveItemInput, StockReservation,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReserveStockRequest {
    pub items: Vec<ReserveItemInput>,
}

/// POST /stock/orders/:order_id/reserve - deduct stock for an order,
/// all-or-nothing
pub async fn reserve_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ReserveStockRequest>,
) -> Result<(StatusCode, Json<StockReservation>), AppError> {
    let service = OrderStockService::new(state.db.clone());
    let reservation = service.reserve(&actor.id, order_id, payload.items).await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// POST /stock/orders/:order_id/release - return a cancelled order's stock
pub async fn release_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ReleaseOutcome>, AppError> {
    let service = OrderStockService::new(state.db.clone());
    let outcome = service.release(&actor.id, order_id).await?;

    Ok(Json(outcome))
}
