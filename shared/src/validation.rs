//! Validation utilities for the Pharmacy Retail Platform
//!
//! Small, pure checks used by the backend before touching storage.

use rust_decimal::Decimal;

// ============================================================================
// Stock Movement Validations
// ============================================================================

/// Validate a ledger movement delta (zero changes nothing and is rejected)
pub fn validate_movement_delta(delta: i64) -> Result<(), &'static str> {
    if delta == 0 {
        return Err("Movement delta must not be zero");
    }
    Ok(())
}

/// Validate a receipt or reservation line quantity
pub fn validate_line_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a unit cost on a goods receipt item
pub fn validate_unit_cost(unit_cost: Decimal) -> Result<(), &'static str> {
    if unit_cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

/// Validate a reorder threshold on a product
pub fn validate_reorder_threshold(threshold: i64) -> Result<(), &'static str> {
    if threshold < 0 {
        return Err("Reorder threshold cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Goods Receipt Validations
// ============================================================================

/// Validate a goods receipt code (3-32 chars, uppercase alphanumeric with dashes)
pub fn validate_receipt_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Receipt code must be at least 3 characters");
    }
    if code.len() > 32 {
        return Err("Receipt code must be at most 32 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Receipt code must be uppercase alphanumeric with dashes");
    }
    Ok(())
}

// ============================================================================
// Batch / Expiry Validations
// ============================================================================

/// Validate the lookahead window for near-expiry queries
pub fn validate_within_days(within_days: i64) -> Result<(), &'static str> {
    if within_days < 0 {
        return Err("Lookahead window cannot be negative");
    }
    if within_days > 3650 {
        return Err("Lookahead window exceeds maximum of 3650 days");
    }
    Ok(())
}

/// Validate a batch number (non-empty, bounded)
pub fn validate_batch_no(batch_no: &str) -> Result<(), &'static str> {
    if batch_no.trim().is_empty() {
        return Err("Batch number must not be empty");
    }
    if batch_no.len() > 64 {
        return Err("Batch number must be at most 64 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_movement_delta() {
        assert!(validate_movement_delta(1).is_ok());
        assert!(validate_movement_delta(-250).is_ok());
        assert!(validate_movement_delta(0).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(10_000).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(Decimal::ZERO).is_ok());
        assert!(validate_unit_cost(Decimal::new(1999, 2)).is_ok());
        assert!(validate_unit_cost(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_validate_reorder_threshold() {
        assert!(validate_reorder_threshold(0).is_ok());
        assert!(validate_reorder_threshold(100).is_ok());
        assert!(validate_reorder_threshold(-1).is_err());
    }

    #[test]
    fn test_validate_receipt_code_valid() {
        assert!(validate_receipt_code("GRN-2025-00042").is_ok());
        assert!(validate_receipt_code("PO1").is_ok());
    }

    #[test]
    fn test_validate_receipt_code_invalid() {
        assert!(validate_receipt_code("AB").is_err()); // Too short
        assert!(validate_receipt_code(&"X".repeat(33)).is_err()); // Too long
        assert!(validate_receipt_code("grn-1").is_err()); // Lowercase
        assert!(validate_receipt_code("GRN 1").is_err()); // Space
    }

    #[test]
    fn test_validate_within_days() {
        assert!(validate_within_days(0).is_ok());
        assert!(validate_within_days(30).is_ok());
        assert!(validate_within_days(3650).is_ok());
        assert!(validate_within_days(-1).is_err());
        assert!(validate_within_days(3651).is_err());
    }

    #[test]
    fn test_validate_batch_no() {
        assert!(validate_batch_no("LOT-7A").is_ok());
        assert!(validate_batch_no("").is_err());
        assert!(validate_batch_no("   ").is_err());
        assert!(validate_batch_no(&"B".repeat(65)).is_err());
    }
}
