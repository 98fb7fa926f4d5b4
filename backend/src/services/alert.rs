//! Stock alert engine
//!
//! Scans product and batch state, classifies risk, and upserts deduplicated
//! alert records. At most one unresolved alert exists per
//! `(product_id, variant_id, alert_type)`: every insert goes through a
//! single atomic insert-or-update against a partial unique index, so two
//! concurrent scans (or a scan racing a manual create) cannot both insert.
//! Batch-sourced alerts carry the batch id in the variant slot, keying the
//! dedup on product+batch.
//!
//! The scan never auto-resolves anything: clearing a condition leaves the
//! open alert for an operator to resolve, and resolving while the condition
//! persists means the next scan opens a fresh alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{classify_expiry, classify_stock_level, AlertSeverity, AlertType, SuggestedAction};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta, SortOrder};

use crate::error::{AppError, AppResult};
use crate::services::batch::NEAR_EXPIRY_SCAN_CAP;

/// Alert engine service
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// A stock alert record with its read/resolve lifecycle
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockAlert {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub alert_type: String,
    pub severity: String,
    pub current_stock: i64,
    pub threshold_value: Option<i64>,
    pub message: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_note: Option<String>,
    pub suggested_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counters from an alert scan
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScanOutcome {
    pub created: i64,
    pub updated: i64,
}

/// Filters for listing alerts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub is_read: Option<bool>,
    pub is_resolved: Option<bool>,
}

/// Input for an operator-entered alert
#[derive(Debug, Deserialize)]
pub struct CreateAlertInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub current_stock: i64,
    pub threshold_value: Option<i64>,
    pub message: String,
    pub suggested_action: Option<SuggestedAction>,
}

/// Input for resolving an alert
#[derive(Debug, Deserialize)]
pub struct ResolveAlertInput {
    pub note: Option<String>,
    pub suggested_action: Option<SuggestedAction>,
}

/// Row shape for the atomic upsert; `inserted` distinguishes a fresh row
/// from an in-place refresh
#[derive(Debug, FromRow)]
struct UpsertedAlertRow {
    #[sqlx(flatten)]
    alert: StockAlert,
    inserted: bool,
}

/// Row shape for the product scan pass
#[derive(Debug, FromRow)]
struct ProductScanRow {
    id: Uuid,
    name: String,
    current_quantity: i64,
    reorder_threshold: i64,
}

/// Row shape for the batch scan pass
#[derive(Debug, FromRow)]
struct BatchScanRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    batch_no: String,
    quantity: i64,
    expiry_date: Option<chrono::NaiveDate>,
}

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Scan product and batch state and upsert one alert per triggered
    /// condition. Rescanning with no state change refreshes open alerts in
    /// place and creates nothing.
    pub async fn run_scan(&self, near_expiry_days: i64, scan_limit: i64) -> AppResult<ScanOutcome> {
        let mut outcome = ScanOutcome::default();

        // Stock-level pass: at most one of out_of_stock / low_stock fires
        // per product.
        let products = sqlx::query_as::<_, ProductScanRow>(
            r#"
            SELECT id, name, current_quantity, reorder_threshold
            FROM products
            WHERE current_quantity <= reorder_threshold
            ORDER BY current_quantity ASC
            LIMIT $1
            "#,
        )
        .bind(scan_limit)
        .fetch_all(&self.db)
        .await?;

        for product in &products {
            let Some(condition) =
                classify_stock_level(product.current_quantity, product.reorder_threshold)
            else {
                continue;
            };

            let message = match condition.alert_type {
                AlertType::OutOfStock => format!("Product '{}' is out of stock", product.name),
                _ => format!(
                    "Product '{}' stock {} is at or below reorder threshold {}",
                    product.name, product.current_quantity, product.reorder_threshold
                ),
            };

            let inserted = self
                .upsert_alert(
                    product.id,
                    None,
                    condition.alert_type,
                    condition.severity,
                    product.current_quantity,
                    Some(product.reorder_threshold),
                    &message,
                    condition.suggested_action,
                )
                .await?;

            if inserted {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
        }

        // Expiry pass, keyed product+batch via the variant slot.
        let today = Utc::now().date_naive();
        let cutoff = today + chrono::Duration::days(near_expiry_days);

        let batches = sqlx::query_as::<_, BatchScanRow>(
            r#"
            SELECT b.id, b.product_id, p.name AS product_name, b.batch_no,
                   b.quantity, b.expiry_date
            FROM product_batches b
            JOIN products p ON p.id = b.product_id
            WHERE b.expiry_date IS NOT NULL AND b.expiry_date <= $1
            ORDER BY b.expiry_date ASC
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(NEAR_EXPIRY_SCAN_CAP)
        .fetch_all(&self.db)
        .await?;

        for batch in &batches {
            let Some(condition) = classify_expiry(batch.expiry_date, today, near_expiry_days)
            else {
                continue;
            };
            // The SQL window guarantees an expiry date here
            let Some(expiry) = batch.expiry_date else {
                continue;
            };

            let message = match condition.alert_type {
                AlertType::Expired => format!(
                    "Batch '{}' of product '{}' expired on {}",
                    batch.batch_no, batch.product_name, expiry
                ),
                _ => format!(
                    "Batch '{}' of product '{}' expires on {}",
                    batch.batch_no, batch.product_name, expiry
                ),
            };

            let inserted = self
                .upsert_alert(
                    batch.product_id,
                    Some(batch.id),
                    condition.alert_type,
                    condition.severity,
                    batch.quantity,
                    Some(near_expiry_days),
                    &message,
                    condition.suggested_action,
                )
                .await?;

            if inserted {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
        }

        tracing::info!(
            created = outcome.created,
            updated = outcome.updated,
            "alert scan completed"
        );

        Ok(outcome)
    }

    /// Operator-entered alert; bypasses the scan rules but participates in
    /// the same dedup key, so a later scan refreshes it instead of
    /// duplicating it
    pub async fn create_manual(&self, input: CreateAlertInput) -> AppResult<StockAlert> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::ProductNotFound(input.product_id));
        }

        if input.message.trim().is_empty() {
            return Err(AppError::Validation {
                field: "message".to_string(),
                message: "Alert message must not be empty".to_string(),
            });
        }

        let row = self
            .upsert_row(
                input.product_id,
                input.variant_id,
                input.alert_type,
                input.severity,
                input.current_stock,
                input.threshold_value,
                &input.message,
                input.suggested_action.unwrap_or(SuggestedAction::NoAction),
            )
            .await?;

        Ok(row.alert)
    }

    /// List alerts with optional filters, paged
    pub async fn list_alerts(
        &self,
        filter: AlertFilter,
        sort: SortOrder,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockAlert>> {
        let alert_type = filter.alert_type.map(|t| t.as_str().to_string());
        let severity = filter.severity.map(|s| s.as_str().to_string());

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_alerts
            WHERE ($1::text IS NULL OR alert_type = $1)
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::bool IS NULL OR is_read = $3)
              AND ($4::bool IS NULL OR is_resolved = $4)
            "#,
        )
        .bind(&alert_type)
        .bind(&severity)
        .bind(filter.is_read)
        .bind(filter.is_resolved)
        .fetch_one(&self.db)
        .await?;

        let query = format!(
            r#"
            SELECT id, product_id, variant_id, alert_type, severity, current_stock,
                   threshold_value, message, is_read, is_resolved, resolved_by,
                   resolved_at, resolved_note, suggested_action, created_at, updated_at
            FROM stock_alerts
            WHERE ($1::text IS NULL OR alert_type = $1)
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::bool IS NULL OR is_read = $3)
              AND ($4::bool IS NULL OR is_resolved = $4)
            ORDER BY created_at {}, id {}
            LIMIT $5 OFFSET $6
            "#,
            sort.as_sql(),
            sort.as_sql()
        );

        let alerts = sqlx::query_as::<_, StockAlert>(&query)
            .bind(&alert_type)
            .bind(&severity)
            .bind(filter.is_read)
            .bind(filter.is_resolved)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            data: alerts,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Mark an alert as read; a no-op if it already is
    pub async fn mark_read(&self, alert_id: Uuid) -> AppResult<StockAlert> {
        let alert = sqlx::query_as::<_, StockAlert>(
            r#"
            UPDATE stock_alerts
            SET is_read = true, updated_at = NOW()
            WHERE id = $1
            RETURNING id, product_id, variant_id, alert_type, severity, current_stock,
                      threshold_value, message, is_read, is_resolved, resolved_by,
                      resolved_at, resolved_note, suggested_action, created_at, updated_at
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        Ok(alert)
    }

    /// Mark every unread alert as read; returns how many changed
    pub async fn mark_all_read(&self) -> AppResult<i64> {
        let result =
            sqlx::query("UPDATE stock_alerts SET is_read = true, updated_at = NOW() WHERE is_read = false")
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() as i64)
    }

    /// Count of unread, unresolved alerts
    pub async fn unread_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_alerts WHERE is_read = false AND is_resolved = false",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Resolve an alert. Terminal: a persisting condition opens a fresh
    /// alert on the next scan.
    pub async fn resolve(
        &self,
        alert_id: Uuid,
        resolved_by: &str,
        input: ResolveAlertInput,
    ) -> AppResult<StockAlert> {
        let suggested_action = input.suggested_action.map(|a| a.as_str().to_string());

        let alert = sqlx::query_as::<_, StockAlert>(
            r#"
            UPDATE stock_alerts
            SET is_resolved = true,
                resolved_by = $2,
                resolved_at = NOW(),
                resolved_note = $3,
                suggested_action = COALESCE($4, suggested_action),
                updated_at = NOW()
            WHERE id = $1 AND is_resolved = false
            RETURNING id, product_id, variant_id, alert_type, severity, current_stock,
                      threshold_value, message, is_read, is_resolved, resolved_by,
                      resolved_at, resolved_note, suggested_action, created_at, updated_at
            "#,
        )
        .bind(alert_id)
        .bind(resolved_by)
        .bind(&input.note)
        .bind(&suggested_action)
        .fetch_optional(&self.db)
        .await?;

        match alert {
            Some(alert) => Ok(alert),
            None => {
                // Distinguish already-resolved from missing
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM stock_alerts WHERE id = $1)",
                )
                .bind(alert_id)
                .fetch_one(&self.db)
                .await?;

                if exists {
                    Err(AppError::AlreadyResolved(alert_id))
                } else {
                    Err(AppError::NotFound("Alert".to_string()))
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn upsert_alert(
        &self,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        alert_type: AlertType,
        severity: AlertSeverity,
        current_stock: i64,
        threshold_value: Option<i64>,
        message: &str,
        suggested_action: SuggestedAction,
    ) -> AppResult<bool> {
        let row = self
            .upsert_row(
                product_id,
                variant_id,
                alert_type,
                severity,
                current_stock,
                threshold_value,
                message,
                suggested_action,
            )
            .await?;

        Ok(row.inserted)
    }

    /// Single-statement insert-or-update against the partial unique index
    /// on `(product_id, alert_type, COALESCE(variant_id, zero)) WHERE NOT
    /// is_resolved`. Resolved rows are outside the index and are never
    /// reopened.
    #[allow(clippy::too_many_arguments)]
    async fn upsert_row(
        &self,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        alert_type: AlertType,
        severity: AlertSeverity,
        current_stock: i64,
        threshold_value: Option<i64>,
        message: &str,
        suggested_action: SuggestedAction,
    ) -> AppResult<UpsertedAlertRow> {
        let row = sqlx::query_as::<_, UpsertedAlertRow>(
            r#"
            INSERT INTO stock_alerts (product_id, variant_id, alert_type, severity,
                                      current_stock, threshold_value, message, suggested_action)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (product_id, alert_type,
                         (COALESCE(variant_id, '00000000-0000-0000-0000-000000000000'::uuid)))
            WHERE is_resolved = false
            DO UPDATE SET
                severity = EXCLUDED.severity,
                current_stock = EXCLUDED.current_stock,
                threshold_value = EXCLUDED.threshold_value,
                message = EXCLUDED.message,
                suggested_action = EXCLUDED.suggested_action,
                updated_at = NOW()
            RETURNING id, product_id, variant_id, alert_type, severity, current_stock,
                      threshold_value, message, is_read, is_resolved, resolved_by,
                      resolved_at, resolved_note, suggested_action, created_at, updated_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(product_id)
        .bind(variant_id)
        .bind(alert_type.as_str())
        .bind(severity.as_str())
        .bind(current_stock)
        .bind(threshold_value)
        .bind(message)
        .bind(suggested_action.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }
}
