//! API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::actor_middleware;
use crate::AppState;

/// All API routes under /api/v1
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/stock", stock_routes())
        .nest("/alerts", alert_routes())
}

/// Stock ledger, receipts, reservations, and batches. Every route requires
/// a caller identity for the audit trail.
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjustments", post(handlers::stock::adjust_stock))
        .route(
            "/receipts",
            post(handlers::receipt::receive_goods).get(handlers::receipt::list_receipts),
        )
        .route("/receipts/:receipt_id", get(handlers::receipt::get_receipt))
        .route(
            "/receipts/:receipt_id/repair",
            post(handlers::receipt::repair_receipt),
        )
        .route(
            "/orders/:order_id/reserve",
            post(handlers::order_stock::reserve_stock),
        )
        .route(
            "/orders/:order_id/release",
            post(handlers::order_stock::release_stock),
        )
        .route("/products/:product_id", get(handlers::stock::get_stock_level))
        .route(
            "/products/:product_id/movements",
            get(handlers::stock::list_movements),
        )
        .route(
            "/products/:product_id/valuation",
            get(handlers::stock::get_valuation),
        )
        .route(
            "/products/:product_id/reconcile",
            post(handlers::stock::reconcile_product),
        )
        .route(
            "/products/:product_id/batches",
            get(handlers::batch::list_product_batches),
        )
        .route("/batches", post(handlers::batch::record_batch))
        .route("/batches/near-expiry", get(handlers::batch::find_near_expiry))
        .route_layer(middleware::from_fn(actor_middleware))
}

/// Alert engine routes
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::alert::list_alerts).post(handlers::alert::create_alert),
        )
        .route("/scan", post(handlers::alert::run_scan))
        .route("/unread-count", get(handlers::alert::unread_count))
        .route("/mark-all-read", post(handlers::alert::mark_all_read))
        .route("/:alert_id/read", post(handlers::alert::mark_read))
        .route("/:alert_id/resolve", post(handlers::alert::resolve_alert))
        .route_layer(middleware::from_fn(actor_middleware))
}
