//! Near-expiry batch index
//!
//! Batch tracking is advisory for expiry risk, not a stock source of truth:
//! a product's batches need not sum to its projected quantity. Re-recording
//! a batch number accumulates quantity via upsert.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::validation::{validate_batch_no, validate_line_quantity, validate_within_days};

use crate::error::{AppError, AppResult};

/// Upper bound on rows returned by a near-expiry scan
pub const NEAR_EXPIRY_SCAN_CAP: i64 = 200;

/// Batch service over the expiry index
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

/// A tracked lot of stock with its own expiry date
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductBatch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_no: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a batch
#[derive(Debug, Deserialize)]
pub struct RecordBatchInput {
    pub product_id: Uuid,
    pub batch_no: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a batch, accumulating quantity when the batch number is
    /// already known for the product
    pub async fn record_batch(&self, input: RecordBatchInput) -> AppResult<ProductBatch> {
        validate_batch_no(&input.batch_no).map_err(|msg| AppError::Validation {
            field: "batch_no".to_string(),
            message: msg.to_string(),
        })?;
        validate_line_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::ProductNotFound(input.product_id));
        }

        let batch = sqlx::query_as::<_, ProductBatch>(
            r#"
            INSERT INTO product_batches (product_id, batch_no, quantity, expiry_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, batch_no)
            DO UPDATE SET
                quantity = product_batches.quantity + $3,
                expiry_date = COALESCE($4, product_batches.expiry_date),
                updated_at = NOW()
            RETURNING id, product_id, batch_no, quantity, expiry_date,
                      received_at, created_at, updated_at
            "#,
        )
        .bind(input.product_id)
        .bind(&input.batch_no)
        .bind(input.quantity)
        .bind(input.expiry_date)
        .fetch_one(&self.db)
        .await?;

        Ok(batch)
    }

    /// Batches with an expiry date within the window, ascending by expiry.
    /// Each call is a fresh snapshot query; no cursor state is kept, and
    /// batches without an expiry date never surface.
    pub async fn find_near_expiry(&self, within_days: i64) -> AppResult<Vec<ProductBatch>> {
        validate_within_days(within_days).map_err(|msg| AppError::Validation {
            field: "within_days".to_string(),
            message: msg.to_string(),
        })?;

        let cutoff = Utc::now().date_naive() + chrono::Duration::days(within_days);

        let batches = sqlx::query_as::<_, ProductBatch>(
            r#"
            SELECT id, product_id, batch_no, quantity, expiry_date,
                   received_at, created_at, updated_at
            FROM product_batches
            WHERE expiry_date IS NOT NULL AND expiry_date <= $1
            ORDER BY expiry_date ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(NEAR_EXPIRY_SCAN_CAP)
        .fetch_all(&self.db)
        .await?;

        Ok(batches)
    }

    /// All batches of a product, soonest expiry first
    pub async fn list_batches(&self, product_id: Uuid) -> AppResult<Vec<ProductBatch>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::ProductNotFound(product_id));
        }

        let batches = sqlx::query_as::<_, ProductBatch>(
            r#"
            SELECT id, product_id, batch_no, quantity, expiry_date,
                   received_at, created_at, updated_at
            FROM product_batches
            WHERE product_id = $1
            ORDER BY expiry_date ASC NULLS LAST, batch_no ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(batches)
    }
}
