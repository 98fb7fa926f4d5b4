//! Order stock coordinator
//!
//! Reserves stock when an order is placed and releases it on cancellation.
//! The reserve path must refuse to oversell: each decrement is a single
//! atomic conditional UPDATE, never a read followed by a write, so two
//! concurrent reservations cannot both pass on a stale quantity. A rejected
//! reservation compensates everything it already applied before returning.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{MovementKind, StockReferenceType};
use shared::validation::validate_line_quantity;

use crate::error::{AppError, AppResult};
use crate::services::stock::{ApplyMovementInput, LedgerEntry, StockService};

/// Coordinates stock reservation and release for orders
#[derive(Clone)]
pub struct OrderStockService {
    db: PgPool,
    stock: StockService,
}

/// A line item to reserve
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveItemInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// A successful reservation: one sale entry per item
#[derive(Debug, Clone, Serialize)]
pub struct StockReservation {
    pub order_id: Uuid,
    pub entries: Vec<LedgerEntry>,
}

/// Outcome of releasing an order's reservation
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    pub order_id: Uuid,
    pub reversed_products: i64,
}

impl OrderStockService {
    /// Create a new OrderStockService instance
    pub fn new(db: PgPool) -> Self {
        let stock = StockService::new(db.clone());
        Self { db, stock }
    }

    /// Reserve stock for an order. Returns `OversellRejected` listing every
    /// insufficient product; a rejected order never leaves partial stock
    /// deducted.
    pub async fn reserve(
        &self,
        actor: &str,
        order_id: Uuid,
        items: Vec<ReserveItemInput>,
    ) -> AppResult<StockReservation> {
        if items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A reservation must have at least one item".to_string(),
            });
        }
        for (i, item) in items.iter().enumerate() {
            validate_line_quantity(item.quantity).map_err(|msg| AppError::Validation {
                field: format!("items[{}].quantity", i),
                message: msg.to_string(),
            })?;
        }

        // Refuse to reserve twice for the same order: a retry after an
        // ambiguous failure of a *successful* reservation must not deduct
        // again. The net over the order's ledger rows is zero for fully
        // compensated rejections, so those retry cleanly.
        let net = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(delta), 0)::BIGINT
            FROM stock_ledger
            WHERE reference_id = $1 AND reference_type = 'order'
            "#,
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        if net != 0 {
            return Err(AppError::AlreadyReserved(order_id));
        }

        let mut applied: Vec<LedgerEntry> = Vec::with_capacity(items.len());
        let mut insufficient: Vec<Uuid> = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            let outcome = self
                .stock
                .apply_movement_guarded(
                    actor,
                    ApplyMovementInput {
                        product_id: item.product_id,
                        delta: -item.quantity,
                        kind: MovementKind::Sale,
                        reference_type: StockReferenceType::Order,
                        reference_id: Some(order_id),
                        unit_cost: None,
                        note: None,
                    },
                )
                .await;

            match outcome {
                Ok(Some(entry)) => applied.push(entry),
                Ok(None) => {
                    // Guard refused. Evaluate the rest read-only so the
                    // rejection names every shortfall, then back out.
                    insufficient.push(item.product_id);
                    for rest in &items[idx + 1..] {
                        let available = sqlx::query_scalar::<_, i64>(
                            "SELECT current_quantity FROM products WHERE id = $1",
                        )
                        .bind(rest.product_id)
                        .fetch_optional(&self.db)
                        .await?
                        .unwrap_or(0);

                        if available < rest.quantity {
                            insufficient.push(rest.product_id);
                        }
                    }

                    self.compensate(actor, order_id, &applied).await?;
                    let products = self.product_names(&insufficient).await?;
                    return Err(AppError::OversellRejected { products });
                }
                Err(e) => {
                    self.compensate(actor, order_id, &applied).await?;
                    return Err(e);
                }
            }
        }

        tracing::info!(order_id = %order_id, items = applied.len(), "stock reserved");

        Ok(StockReservation {
            order_id,
            entries: applied,
        })
    }

    /// Release a cancelled order's reservation: append one opposite-sign
    /// reversal per product, once. A second release returns
    /// `AlreadyReleased` with no ledger effect.
    pub async fn release(&self, actor: &str, order_id: Uuid) -> AppResult<ReleaseOutcome> {
        let mut tx = self.db.begin().await?;

        // Idempotency marker; a conflicting insert means the order was
        // already released.
        let marked = sqlx::query(
            r#"
            INSERT INTO order_releases (order_id, released_by)
            VALUES ($1, $2)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(order_id)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            return Err(AppError::AlreadyReleased(order_id));
        }

        // Net outstanding reservation per product. Compensated rejections
        // net to zero and produce nothing to reverse.
        let outstanding = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT product_id, SUM(delta)::BIGINT AS net
            FROM stock_ledger
            WHERE reference_id = $1 AND reference_type = 'order'
            GROUP BY product_id
            HAVING SUM(delta) < 0
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        if outstanding.is_empty() {
            // Rolls back the marker too
            return Err(AppError::NotFound("Reservation".to_string()));
        }

        for (product_id, net) in &outstanding {
            let input = ApplyMovementInput {
                product_id: *product_id,
                delta: -net,
                kind: MovementKind::CancellationReversal,
                reference_type: StockReferenceType::Order,
                reference_id: Some(order_id),
                unit_cost: None,
                note: None,
            };
            StockService::apply_in_tx(&mut tx, actor, &input, false)
                .await?
                .ok_or_else(|| {
                    AppError::Internal("unguarded reversal reported a guard failure".to_string())
                })?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            products = outstanding.len(),
            "stock reservation released"
        );

        Ok(ReleaseOutcome {
            order_id,
            reversed_products: outstanding.len() as i64,
        })
    }

    /// Reverse already-applied sale entries of a rejected reservation
    async fn compensate(
        &self,
        actor: &str,
        order_id: Uuid,
        applied: &[LedgerEntry],
    ) -> AppResult<()> {
        for entry in applied {
            self.stock
                .apply_movement(
                    actor,
                    ApplyMovementInput {
                        product_id: entry.product_id,
                        delta: -entry.delta,
                        kind: MovementKind::CancellationReversal,
                        reference_type: StockReferenceType::Order,
                        reference_id: Some(order_id),
                        unit_cost: None,
                        note: Some("oversell rejection compensation".to_string()),
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Resolve product names for the oversell rejection message
    async fn product_names(&self, product_ids: &[Uuid]) -> AppResult<Vec<String>> {
        let mut names = Vec::with_capacity(product_ids.len());
        for product_id in product_ids {
            let name = sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&self.db)
                .await?
                .unwrap_or_else(|| product_id.to_string());
            names.push(name);
        }
        Ok(names)
    }
}
