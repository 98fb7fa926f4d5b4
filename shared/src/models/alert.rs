//! Stock alert models and risk classification
//!
//! Classification is pure so the scan rules can be tested without storage.
//! Stock-level rules key on the product's projected quantity; expiry rules
//! key on individual batches.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    ExpiringSoon,
    Expired,
    Overstock,
    SlowMoving,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::OutOfStock => "out_of_stock",
            AlertType::ExpiringSoon => "expiring_soon",
            AlertType::Expired => "expired",
            AlertType::Overstock => "overstock",
            AlertType::SlowMoving => "slow_moving",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low_stock" => Some(AlertType::LowStock),
            "out_of_stock" => Some(AlertType::OutOfStock),
            "expiring_soon" => Some(AlertType::ExpiringSoon),
            "expired" => Some(AlertType::Expired),
            "overstock" => Some(AlertType::Overstock),
            "slow_moving" => Some(AlertType::SlowMoving),
            _ => None,
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

/// Action suggested to the operator when an alert fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Reorder,
    Discount,
    ReturnToSupplier,
    Dispose,
    Transfer,
    #[serde(rename = "none")]
    NoAction,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::Reorder => "reorder",
            SuggestedAction::Discount => "discount",
            SuggestedAction::ReturnToSupplier => "return_to_supplier",
            SuggestedAction::Dispose => "dispose",
            SuggestedAction::Transfer => "transfer",
            SuggestedAction::NoAction => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reorder" => Some(SuggestedAction::Reorder),
            "discount" => Some(SuggestedAction::Discount),
            "return_to_supplier" => Some(SuggestedAction::ReturnToSupplier),
            "dispose" => Some(SuggestedAction::Dispose),
            "transfer" => Some(SuggestedAction::Transfer),
            "none" => Some(SuggestedAction::NoAction),
            _ => None,
        }
    }
}

/// A triggered risk condition, before it becomes (or refreshes) an alert row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCondition {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub suggested_action: SuggestedAction,
}

/// Classify a product's stock level against its reorder threshold.
///
/// At most one stock-level condition fires per product: out-of-stock wins
/// over low-stock. A negative projection (ledger drift) is treated as out
/// of stock.
pub fn classify_stock_level(current_quantity: i64, reorder_threshold: i64) -> Option<StockCondition> {
    if current_quantity <= 0 {
        return Some(StockCondition {
            alert_type: AlertType::OutOfStock,
            severity: AlertSeverity::Critical,
            suggested_action: SuggestedAction::Reorder,
        });
    }
    if current_quantity <= reorder_threshold {
        return Some(StockCondition {
            alert_type: AlertType::LowStock,
            severity: AlertSeverity::High,
            suggested_action: SuggestedAction::Reorder,
        });
    }
    None
}

/// Classify a batch's expiry risk.
///
/// Batches without an expiry date never surface. Expired wins over
/// expiring-soon.
pub fn classify_expiry(
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
    near_expiry_days: i64,
) -> Option<StockCondition> {
    let expiry = expiry_date?;
    if expiry < today {
        return Some(StockCondition {
            alert_type: AlertType::Expired,
            severity: AlertSeverity::Critical,
            suggested_action: SuggestedAction::Dispose,
        });
    }
    if expiry <= today + chrono::Duration::days(near_expiry_days) {
        return Some(StockCondition {
            alert_type: AlertType::ExpiringSoon,
            severity: AlertSeverity::Medium,
            suggested_action: SuggestedAction::Discount,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_out_of_stock_wins_over_low_stock() {
        let condition = classify_stock_level(0, 10).unwrap();
        assert_eq!(condition.alert_type, AlertType::OutOfStock);
        assert_eq!(condition.severity, AlertSeverity::Critical);
        assert_eq!(condition.suggested_action, SuggestedAction::Reorder);
    }

    #[test]
    fn test_negative_projection_is_out_of_stock() {
        let condition = classify_stock_level(-3, 10).unwrap();
        assert_eq!(condition.alert_type, AlertType::OutOfStock);
    }

    #[test]
    fn test_low_stock_at_threshold() {
        let condition = classify_stock_level(10, 10).unwrap();
        assert_eq!(condition.alert_type, AlertType::LowStock);
        assert_eq!(condition.severity, AlertSeverity::High);
    }

    #[test]
    fn test_healthy_stock_produces_nothing() {
        assert!(classify_stock_level(11, 10).is_none());
        assert!(classify_stock_level(1, 0).is_none());
    }

    #[test]
    fn test_expired_batch() {
        let condition = classify_expiry(Some(date(2025, 1, 1)), date(2025, 6, 1), 30).unwrap();
        assert_eq!(condition.alert_type, AlertType::Expired);
        assert_eq!(condition.suggested_action, SuggestedAction::Dispose);
    }

    #[test]
    fn test_expiring_soon_batch() {
        let condition = classify_expiry(Some(date(2025, 6, 20)), date(2025, 6, 1), 30).unwrap();
        assert_eq!(condition.alert_type, AlertType::ExpiringSoon);
        assert_eq!(condition.severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_expiry_window_boundary_inclusive() {
        let condition = classify_expiry(Some(date(2025, 7, 1)), date(2025, 6, 1), 30).unwrap();
        assert_eq!(condition.alert_type, AlertType::ExpiringSoon);
        assert!(classify_expiry(Some(date(2025, 7, 2)), date(2025, 6, 1), 30).is_none());
    }

    #[test]
    fn test_no_expiry_date_never_surfaces() {
        assert!(classify_expiry(None, date(2025, 6, 1), 30).is_none());
    }

    #[test]
    fn test_alert_type_round_trip() {
        for t in [
            AlertType::LowStock,
            AlertType::OutOfStock,
            AlertType::ExpiringSoon,
            AlertType::Expired,
            AlertType::Overstock,
            AlertType::SlowMoving,
        ] {
            assert_eq!(AlertType::from_str(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_suggested_action_round_trip() {
        for a in [
            SuggestedAction::Reorder,
            SuggestedAction::Discount,
            SuggestedAction::ReturnToSupplier,
            SuggestedAction::Dispose,
            SuggestedAction::Transfer,
            SuggestedAction::NoAction,
        ] {
            assert_eq!(SuggestedAction::from_str(a.as_str()), Some(a));
        }
    }
}
