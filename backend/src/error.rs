//! Error handling for the stock & alerting subsystem
//!
//! Every error is classified: validation is rejected before anything
//! persists, conflicts are distinct actionable outcomes, not-found is
//! distinct from conflict, and storage errors propagate so the caller can
//! retry the whole operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Movement delta must not be zero")]
    InvalidDelta,

    // Conflict errors
    #[error("Duplicate receipt code: {0}")]
    DuplicateCode(String),

    #[error("Order {0} has already been released")]
    AlreadyReleased(Uuid),

    #[error("Order {0} already holds a stock reservation")]
    AlreadyReserved(Uuid),

    #[error("Alert {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("Insufficient stock for {}", .products.join(", "))]
    OversellRejected { products: Vec<String> },

    // Not-found errors
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InvalidDelta => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_DELTA".to_string(),
                    message: "Movement delta must not be zero".to_string(),
                    field: Some("delta".to_string()),
                },
            ),
            AppError::DuplicateCode(code) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_CODE".to_string(),
                    message: format!("A goods receipt with code '{}' already exists", code),
                    field: Some("code".to_string()),
                },
            ),
            AppError::AlreadyReleased(order_id) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_RELEASED".to_string(),
                    message: format!("Order {} has already been released", order_id),
                    field: None,
                },
            ),
            AppError::AlreadyReserved(order_id) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_RESERVED".to_string(),
                    message: format!("Order {} already holds a stock reservation", order_id),
                    field: None,
                },
            ),
            AppError::AlreadyResolved(alert_id) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_RESOLVED".to_string(),
                    message: format!("Alert {} is already resolved", alert_id),
                    field: None,
                },
            ),
            AppError::OversellRejected { products } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: format!("Insufficient stock for {}", products.join(", ")),
                    field: None,
                },
            ),
            AppError::ProductNotFound(product_id) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "PRODUCT_NOT_FOUND".to_string(),
                    message: format!("Product {} not found", product_id),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
