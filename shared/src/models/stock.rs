//! Stock movement models
//!
//! The ledger is append-only: every quantity change is a signed delta row,
//! and corrections are compensating rows with the opposite sign rather than
//! edits to history.

use serde::{Deserialize, Serialize};

/// Kind of stock movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received from a supplier (stock in)
    Receipt,
    /// Stock reserved against a placed order (stock out)
    Sale,
    /// Manual correction by an operator
    Adjustment,
    /// Reversal of a sale when an order is cancelled or rejected
    CancellationReversal,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Receipt => "receipt",
            MovementKind::Sale => "sale",
            MovementKind::Adjustment => "adjustment",
            MovementKind::CancellationReversal => "cancellation_reversal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "receipt" => Some(MovementKind::Receipt),
            "sale" => Some(MovementKind::Sale),
            "adjustment" => Some(MovementKind::Adjustment),
            "cancellation_reversal" => Some(MovementKind::CancellationReversal),
            _ => None,
        }
    }
}

/// What a ledger entry references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockReferenceType {
    /// A goods receipt from a supplier
    Purchase,
    /// A storefront order
    Order,
    /// An operator-entered adjustment
    Manual,
    /// A customer return
    Return,
}

impl StockReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockReferenceType::Purchase => "purchase",
            StockReferenceType::Order => "order",
            StockReferenceType::Manual => "manual",
            StockReferenceType::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(StockReferenceType::Purchase),
            "order" => Some(StockReferenceType::Order),
            "manual" => Some(StockReferenceType::Manual),
            "return" => Some(StockReferenceType::Return),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_round_trip() {
        for kind in [
            MovementKind::Receipt,
            MovementKind::Sale,
            MovementKind::Adjustment,
            MovementKind::CancellationReversal,
        ] {
            assert_eq!(MovementKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(MovementKind::from_str("transfer"), None);
    }

    #[test]
    fn test_reference_type_round_trip() {
        for rt in [
            StockReferenceType::Purchase,
            StockReferenceType::Order,
            StockReferenceType::Manual,
            StockReferenceType::Return,
        ] {
            assert_eq!(StockReferenceType::from_str(rt.as_str()), Some(rt));
        }
        assert_eq!(StockReferenceType::from_str("invoice"), None);
    }
}
