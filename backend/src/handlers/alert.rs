//! Stock alert handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{AlertSeverity, AlertType};
use shared::types::{PaginatedResponse, Pagination, SortOrder};

use crate::error::AppError;
use crate::middleware::CurrentActor;
use crate::services::alert::{
    AlertFilter, AlertService, CreateAlertInput, ResolveAlertInput, ScanOutcome, StockAlert,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub is_read: Option<bool>,
    pub is_resolved: Option<bool>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked: i64,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

/// GET /alerts - filtered, paged alert list
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<PaginatedResponse<StockAlert>>, AppError> {
    let service = AlertService::new(state.db.clone());
    let filter = AlertFilter {
        alert_type: query.alert_type,
        severity: query.severity,
        is_read: query.is_read,
        is_resolved: query.is_resolved,
    };
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let alerts = service
        .list_alerts(filter, query.sort.unwrap_or_default(), pagination)
        .await?;

    Ok(Json(alerts))
}

/// POST /alerts - operator-entered alert
pub async fn create_alert(
    State(state): State<AppState>,
    Json(payload): Json<CreateAlertInput>,
) -> Result<(StatusCode, Json<StockAlert>), AppError> {
    let service = AlertService::new(state.db.clone());
    let alert = service.create_manual(payload).await?;

    Ok((StatusCode::CREATED, Json(alert)))
}

/// POST /alerts/scan - evaluate stock and expiry rules across the catalog
pub async fn run_scan(State(state): State<AppState>) -> Result<Json<ScanOutcome>, AppError> {
    let service = AlertService::new(state.db.clone());
    let outcome = service
        .run_scan(
            state.config.alerts.near_expiry_days,
            state.config.alerts.scan_batch_limit,
        )
        .await?;

    Ok(Json(outcome))
}

/// GET /alerts/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let service = AlertService::new(state.db.clone());
    let unread = service.unread_count().await?;

    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /alerts/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let service = AlertService::new(state.db.clone());
    let marked = service.mark_all_read().await?;

    Ok(Json(MarkAllReadResponse { marked }))
}

/// POST /alerts/:alert_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<StockAlert>, AppError> {
    let service = AlertService::new(state.db.clone());
    let alert = service.mark_read(alert_id).await?;

    Ok(Json(alert))
}

/// POST /alerts/:alert_id/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(alert_id): Path<Uuid>,
    Json(payload): Json<ResolveAlertInput>,
) -> Result<Json<StockAlert>, AppError> {
    let service = AlertService::new(state.db.clone());
    let alert = service.resolve(alert_id, &actor.id, payload).await?;

    Ok(Json(alert))
}
