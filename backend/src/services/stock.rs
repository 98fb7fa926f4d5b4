//! Stock ledger and projection service
//!
//! The ledger is the source of truth for how stock got to its current
//! number; `products.current_quantity` is a denormalized projection of it.
//! Every write goes through `apply_movement`: one transaction that appends
//! the ledger row and adjusts the projection with a relative UPDATE. The
//! projection is never recomputed on the hot path; `reconcile` is the
//! offline repair for drift.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{MovementKind, StockReferenceType};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_movement_delta;

use crate::error::{AppError, AppResult};

/// Stock service owning the ledger and the quantity projection
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// An append-only ledger entry; immutable once written
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub delta: i64,
    pub kind: String,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub unit_cost: Option<Decimal>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Input for applying a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyMovementInput {
    pub product_id: Uuid,
    pub delta: i64,
    pub kind: MovementKind,
    pub reference_type: StockReferenceType,
    pub reference_id: Option<Uuid>,
    pub unit_cost: Option<Decimal>,
    pub note: Option<String>,
}

/// Projection read for a product
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub name: String,
    pub current_quantity: i64,
    pub reorder_threshold: i64,
}

/// Result of an offline ledger/projection reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub product_id: Uuid,
    pub ledger_total: i64,
    pub projected_quantity: i64,
    pub drift: i64,
    pub repaired: bool,
}

/// Weighted-average-cost valuation of on-hand stock
#[derive(Debug, Clone, Serialize)]
pub struct StockValuation {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a stock movement: append a ledger entry and adjust the
    /// projection, atomically. Both succeed or both fail.
    pub async fn apply_movement(
        &self,
        actor: &str,
        input: ApplyMovementInput,
    ) -> AppResult<LedgerEntry> {
        validate_movement_delta(input.delta).map_err(|_| AppError::InvalidDelta)?;

        let mut tx = self.db.begin().await?;
        let entry = Self::apply_in_tx(&mut tx, actor, &input, false)
            .await?
            .ok_or_else(|| {
                AppError::Internal("unguarded movement reported a guard failure".to_string())
            })?;
        tx.commit().await?;

        tracing::debug!(
            product_id = %input.product_id,
            delta = input.delta,
            kind = input.kind.as_str(),
            "stock movement applied"
        );

        Ok(entry)
    }

    /// Apply a stock movement only if the projection stays non-negative.
    /// Returns `None` when the guard refuses (insufficient stock); the
    /// check and the decrement are a single conditional UPDATE, so two
    /// concurrent callers can never both pass on a stale read.
    pub async fn apply_movement_guarded(
        &self,
        actor: &str,
        input: ApplyMovementInput,
    ) -> AppResult<Option<LedgerEntry>> {
        validate_movement_delta(input.delta).map_err(|_| AppError::InvalidDelta)?;

        let mut tx = self.db.begin().await?;
        let entry = Self::apply_in_tx(&mut tx, actor, &input, true).await?;
        if entry.is_some() {
            tx.commit().await?;
        }

        Ok(entry)
    }

    /// Core of the projector: relative UPDATE on the projection plus the
    /// ledger INSERT, inside the caller's transaction.
    pub(crate) async fn apply_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        actor: &str,
        input: &ApplyMovementInput,
        guard_non_negative: bool,
    ) -> AppResult<Option<LedgerEntry>> {
        let update = if guard_non_negative {
            sqlx::query(
                r#"
                UPDATE products
                SET current_quantity = current_quantity + $1, updated_at = NOW()
                WHERE id = $2 AND current_quantity + $1 >= 0
                "#,
            )
        } else {
            sqlx::query(
                r#"
                UPDATE products
                SET current_quantity = current_quantity + $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
        };

        let updated = update
            .bind(input.delta)
            .bind(input.product_id)
            .execute(&mut **tx)
            .await?;

        if updated.rows_affected() == 0 {
            // Distinguish a missing product from a refused guard
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(input.product_id)
            .fetch_one(&mut **tx)
            .await?;

            if !exists {
                return Err(AppError::ProductNotFound(input.product_id));
            }
            return Ok(None);
        }

        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO stock_ledger (product_id, delta, kind, reference_type, reference_id,
                                      unit_cost, note, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, product_id, delta, kind, reference_type, reference_id,
                      unit_cost, note, created_by, created_at
            "#,
        )
        .bind(input.product_id)
        .bind(input.delta)
        .bind(input.kind.as_str())
        .bind(input.reference_type.as_str())
        .bind(input.reference_id)
        .bind(input.unit_cost)
        .bind(&input.note)
        .bind(actor)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Some(entry))
    }

    /// Manual stock correction by an operator
    pub async fn adjust(
        &self,
        actor: &str,
        product_id: Uuid,
        delta: i64,
        note: Option<String>,
    ) -> AppResult<LedgerEntry> {
        self.apply_movement(
            actor,
            ApplyMovementInput {
                product_id,
                delta,
                kind: MovementKind::Adjustment,
                reference_type: StockReferenceType::Manual,
                reference_id: None,
                unit_cost: None,
                note,
            },
        )
        .await
    }

    /// Read the projection for a product
    pub async fn get_stock_level(&self, product_id: Uuid) -> AppResult<StockLevel> {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT id AS product_id, name, current_quantity, reorder_threshold
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::ProductNotFound(product_id))?;

        Ok(level)
    }

    /// Paged movement audit trail for a product, newest first
    pub async fn list_movements(
        &self,
        product_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<LedgerEntry>> {
        // Validate product exists
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::ProductNotFound(product_id));
        }

        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_ledger WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, product_id, delta, kind, reference_type, reference_id,
                   unit_cost, note, created_by, created_at
            FROM stock_ledger
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: entries,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Offline reconciliation: recompute the projection from the full
    /// ledger, report drift, and rewrite the projection when it diverged.
    /// Never called on the write path.
    pub async fn reconcile(&self, product_id: Uuid) -> AppResult<ReconciliationReport> {
        let mut tx = self.db.begin().await?;

        // Lock the product row so concurrent movements wait out the repair
        let projected = sqlx::query_scalar::<_, i64>(
            "SELECT current_quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::ProductNotFound(product_id))?;

        let ledger_total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM stock_ledger WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let drift = projected - ledger_total;
        let repaired = drift != 0;

        if repaired {
            sqlx::query("UPDATE products SET current_quantity = $1, updated_at = NOW() WHERE id = $2")
                .bind(ledger_total)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

            tracing::warn!(
                product_id = %product_id,
                drift,
                "projection drift detected and repaired"
            );
        }

        tx.commit().await?;

        Ok(ReconciliationReport {
            product_id,
            ledger_total,
            projected_quantity: projected,
            drift,
            repaired,
        })
    }

    /// Weighted-average unit cost over costed receipt movements, times the
    /// on-hand quantity
    pub async fn get_valuation(&self, product_id: Uuid) -> AppResult<StockValuation> {
        let level = self.get_stock_level(product_id).await?;

        let avg_cost = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT CASE
                WHEN SUM(delta) > 0 THEN SUM(unit_cost * delta) / SUM(delta)
                ELSE 0
            END
            FROM stock_ledger
            WHERE product_id = $1 AND kind = 'receipt' AND unit_cost IS NOT NULL
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        let total_value = Decimal::from(level.current_quantity) * avg_cost;

        Ok(StockValuation {
            product_id: level.product_id,
            name: level.name,
            quantity: level.current_quantity,
            unit_cost: avg_cost,
            total_value,
        })
    }
}
