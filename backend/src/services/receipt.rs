//! Goods receipt service
//!
//! A receipt is persisted first as the durable record of intent, then one
//! receipt movement is applied per line item. If a movement fails midway
//! the earlier movements stand; `repair` re-applies only the missing ones,
//! idempotent on `(receipt, product)`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{MovementKind, StockReferenceType};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_line_quantity, validate_receipt_code, validate_unit_cost};

use crate::error::{AppError, AppResult};
use crate::services::stock::{ApplyMovementInput, StockService};

/// Goods receipt service
#[derive(Clone)]
pub struct GoodsReceiptService {
    db: PgPool,
    stock: StockService,
}

/// A supplier delivery; immutable once created
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsReceipt {
    pub id: Uuid,
    pub code: String,
    pub supplier_id: Uuid,
    pub note: Option<String>,
    pub received_by: String,
    pub received_at: DateTime<Utc>,
}

/// A line item on a goods receipt
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsReceiptItem {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// A receipt with its line items
#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceiptWithItems {
    #[serde(flatten)]
    pub receipt: GoodsReceipt,
    pub items: Vec<GoodsReceiptItem>,
}

/// Input for receiving goods
#[derive(Debug, Deserialize)]
pub struct ReceiveGoodsInput {
    pub code: String,
    pub supplier_id: Uuid,
    pub items: Vec<ReceiptItemInput>,
    pub note: Option<String>,
}

/// A line item on a goods receipt request
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptItemInput {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// Outcome of a receipt repair pass
#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub receipt_id: Uuid,
    pub applied: i64,
    pub already_applied: i64,
}

impl GoodsReceiptService {
    /// Create a new GoodsReceiptService instance
    pub fn new(db: PgPool) -> Self {
        let stock = StockService::new(db.clone());
        Self { db, stock }
    }

    /// Receive a supplier delivery: persist the receipt, then apply one
    /// receipt movement per item.
    pub async fn receive(
        &self,
        actor: &str,
        input: ReceiveGoodsInput,
    ) -> AppResult<GoodsReceiptWithItems> {
        self.validate_input(&input)?;
        self.validate_products_exist(&input.items).await?;

        // Persist the receipt and its items first; this is the durable
        // record of intent the repair path works from.
        let mut tx = self.db.begin().await?;

        let receipt = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            INSERT INTO goods_receipts (code, supplier_id, note, received_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, supplier_id, note, received_by, received_at
            "#,
        )
        .bind(&input.code)
        .bind(input.supplier_id)
        .bind(&input.note)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateCode(input.code.clone())
            }
            _ => AppError::from(e),
        })?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, GoodsReceiptItem>(
                r#"
                INSERT INTO goods_receipt_items (receipt_id, product_id, quantity, unit_cost)
                VALUES ($1, $2, $3, $4)
                RETURNING id, receipt_id, product_id, quantity, unit_cost
                "#,
            )
            .bind(receipt.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_cost)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        // Apply the stock movements. A failure here leaves the receipt and
        // any already-applied movements in place; nothing is retried or
        // rolled back automatically. The repair path covers the gap.
        for item in &items {
            self.stock
                .apply_movement(
                    actor,
                    ApplyMovementInput {
                        product_id: item.product_id,
                        delta: item.quantity,
                        kind: MovementKind::Receipt,
                        reference_type: StockReferenceType::Purchase,
                        reference_id: Some(receipt.id),
                        unit_cost: Some(item.unit_cost),
                        note: None,
                    },
                )
                .await?;
        }

        tracing::info!(
            receipt_id = %receipt.id,
            code = %receipt.code,
            items = items.len(),
            "goods receipt recorded"
        );

        Ok(GoodsReceiptWithItems { receipt, items })
    }

    /// Re-apply only the item movements missing from the ledger. At most
    /// one movement per `(receipt, product)` exists, so repair is safe to
    /// call any number of times.
    pub async fn repair(&self, actor: &str, receipt_id: Uuid) -> AppResult<RepairOutcome> {
        let with_items = self.get_receipt(receipt_id).await?;

        let mut applied = 0;
        let mut already_applied = 0;

        for item in &with_items.items {
            let exists = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM stock_ledger
                    WHERE reference_id = $1 AND product_id = $2 AND kind = 'receipt'
                )
                "#,
            )
            .bind(receipt_id)
            .bind(item.product_id)
            .fetch_one(&self.db)
            .await?;

            if exists {
                already_applied += 1;
                continue;
            }

            self.stock
                .apply_movement(
                    actor,
                    ApplyMovementInput {
                        product_id: item.product_id,
                        delta: item.quantity,
                        kind: MovementKind::Receipt,
                        reference_type: StockReferenceType::Purchase,
                        reference_id: Some(receipt_id),
                        unit_cost: Some(item.unit_cost),
                        note: None,
                    },
                )
                .await?;
            applied += 1;
        }

        if applied > 0 {
            tracing::info!(receipt_id = %receipt_id, applied, "goods receipt repaired");
        }

        Ok(RepairOutcome {
            receipt_id,
            applied,
            already_applied,
        })
    }

    /// Get a receipt with its items
    pub async fn get_receipt(&self, receipt_id: Uuid) -> AppResult<GoodsReceiptWithItems> {
        let receipt = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            SELECT id, code, supplier_id, note, received_by, received_at
            FROM goods_receipts
            WHERE id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt".to_string()))?;

        let items = sqlx::query_as::<_, GoodsReceiptItem>(
            r#"
            SELECT id, receipt_id, product_id, quantity, unit_cost
            FROM goods_receipt_items
            WHERE receipt_id = $1
            ORDER BY id
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&self.db)
        .await?;

        Ok(GoodsReceiptWithItems { receipt, items })
    }

    /// List receipts, newest first
    pub async fn list_receipts(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<GoodsReceipt>> {
        let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM goods_receipts")
            .fetch_one(&self.db)
            .await?;

        let receipts = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            SELECT id, code, supplier_id, note, received_by, received_at
            FROM goods_receipts
            ORDER BY received_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: receipts,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    fn validate_input(&self, input: &ReceiveGoodsInput) -> AppResult<()> {
        validate_receipt_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
        })?;

        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A goods receipt must have at least one item".to_string(),
            });
        }

        for (i, item) in input.items.iter().enumerate() {
            validate_line_quantity(item.quantity).map_err(|msg| AppError::Validation {
                field: format!("items[{}].quantity", i),
                message: msg.to_string(),
            })?;
            validate_unit_cost(item.unit_cost).map_err(|msg| AppError::Validation {
                field: format!("items[{}].unit_cost", i),
                message: msg.to_string(),
            })?;
        }

        Ok(())
    }

    async fn validate_products_exist(&self, items: &[ReceiptItemInput]) -> AppResult<()> {
        for item in items {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(item.product_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::ProductNotFound(item.product_id));
            }
        }
        Ok(())
    }
}
