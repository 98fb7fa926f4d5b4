//! Order stock reservation tests
//!
//! Tests for reserve/release including:
//! - Oversell guard: stock never deducted below zero
//! - All-or-nothing reservations with full compensation
//! - Idempotent release and double-release rejection

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Guarded relative update: deduct only when the result stays non-negative,
/// the same compare-and-set the database enforces in one statement.
fn try_deduct(quantity: &AtomicI64, amount: i64) -> bool {
    let mut current = quantity.load(Ordering::SeqCst);
    loop {
        if current - amount < 0 {
            return false;
        }
        match quantity.compare_exchange(
            current,
            current - amount,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
}

/// Multi-line reservation against per-product quantities: deduct line by
/// line, compensating everything already deducted on the first refusal.
fn reserve(quantities: &[AtomicI64], lines: &[(usize, i64)]) -> bool {
    let mut applied: Vec<(usize, i64)> = Vec::new();
    for (product, qty) in lines {
        if try_deduct(&quantities[*product], *qty) {
            applied.push((*product, *qty));
        } else {
            for (p, q) in applied {
                quantities[p].fetch_add(q, Ordering::SeqCst);
            }
            return false;
        }
    }
    true
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use shared::validation::validate_line_quantity;

    /// Test line quantity validation
    #[test]
    fn test_line_quantity_must_be_positive() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(-5).is_err());
    }

    /// Test a reservation within stock succeeds
    #[test]
    fn test_reserve_within_stock() {
        let stock = AtomicI64::new(10);
        assert!(try_deduct(&stock, 4));
        assert_eq!(stock.load(Ordering::SeqCst), 6);
    }

    /// Test a reservation exceeding stock is refused without deducting
    #[test]
    fn test_oversell_refused() {
        let stock = AtomicI64::new(3);
        assert!(!try_deduct(&stock, 5));
        assert_eq!(stock.load(Ordering::SeqCst), 3);
    }

    /// Test deducting to exactly zero is allowed
    #[test]
    fn test_deduct_to_zero_allowed() {
        let stock = AtomicI64::new(5);
        assert!(try_deduct(&stock, 5));
        assert_eq!(stock.load(Ordering::SeqCst), 0);
    }

    /// Test multi-line rejection compensates earlier lines
    #[test]
    fn test_rejected_reservation_leaves_no_partial_deduction() {
        let quantities = [AtomicI64::new(10), AtomicI64::new(2)];

        // First line fits, second does not
        let ok = reserve(&quantities, &[(0, 5), (1, 4)]);
        assert!(!ok);

        // Both products back at their starting quantity
        assert_eq!(quantities[0].load(Ordering::SeqCst), 10);
        assert_eq!(quantities[1].load(Ordering::SeqCst), 2);
    }

    /// Test a compensated rejection can be retried once stock arrives
    #[test]
    fn test_rejected_reservation_retries_cleanly() {
        let quantities = [AtomicI64::new(1)];
        assert!(!reserve(&quantities, &[(0, 3)]));

        // Goods arrive
        quantities[0].fetch_add(5, Ordering::SeqCst);
        assert!(reserve(&quantities, &[(0, 3)]));
        assert_eq!(quantities[0].load(Ordering::SeqCst), 3);
    }

    /// Test release is idempotent via a one-shot marker
    #[test]
    fn test_release_idempotent() {
        let stock = AtomicI64::new(10);
        let mut released: HashSet<u64> = HashSet::new();
        let order_id = 42u64;

        assert!(try_deduct(&stock, 4));

        // First release inserts the marker and returns the stock
        assert!(released.insert(order_id));
        stock.fetch_add(4, Ordering::SeqCst);
        assert_eq!(stock.load(Ordering::SeqCst), 10);

        // Second release hits the marker and must not credit again
        assert!(!released.insert(order_id));
        assert_eq!(stock.load(Ordering::SeqCst), 10);
    }

    /// Test two workers racing for the last units: exactly one wins
    #[test]
    fn test_concurrent_reserve_single_winner() {
        let stock = Arc::new(AtomicI64::new(5));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let stock = Arc::clone(&stock);
                std::thread::spawn(move || try_deduct(&stock, 5))
            })
            .collect();

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(wins, 1);
        assert_eq!(stock.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock never goes negative no matter what sequence of
        /// reservations arrives
        #[test]
        fn prop_stock_never_negative(
            initial in 0i64..=100,
            requests in prop::collection::vec(1i64..=50, 1..30)
        ) {
            let stock = AtomicI64::new(initial);
            for qty in &requests {
                try_deduct(&stock, *qty);
                prop_assert!(stock.load(Ordering::SeqCst) >= 0);
            }
        }

        /// Accepted reservations deduct exactly their total; refused ones
        /// deduct nothing
        #[test]
        fn prop_deductions_account_exactly(
            initial in 0i64..=200,
            requests in prop::collection::vec(1i64..=50, 1..30)
        ) {
            let stock = AtomicI64::new(initial);
            let mut accepted_total = 0i64;

            for qty in &requests {
                if try_deduct(&stock, *qty) {
                    accepted_total += qty;
                }
            }

            prop_assert_eq!(stock.load(Ordering::SeqCst), initial - accepted_total);
        }

        /// Concurrent single-unit reservations never oversell: the number
        /// of winners is exactly min(initial stock, contenders)
        #[test]
        fn prop_concurrent_reservations_bounded_by_stock(
            initial in 0i64..=8,
            contenders in 1usize..=8
        ) {
            let stock = Arc::new(AtomicI64::new(initial));

            let handles: Vec<_> = (0..contenders)
                .map(|_| {
                    let stock = Arc::clone(&stock);
                    std::thread::spawn(move || try_deduct(&stock, 1))
                })
                .collect();

            let wins: i64 = handles
                .into_iter()
                .map(|h| h.join().unwrap() as i64)
                .sum();

            prop_assert_eq!(wins, initial.min(contenders as i64));
            prop_assert_eq!(stock.load(Ordering::SeqCst), (initial - contenders as i64).max(0));
        }

        /// A rejected multi-line reservation always leaves every product
        /// at its starting quantity
        #[test]
        fn prop_rejection_fully_compensates(
            stocks in prop::collection::vec(0i64..=20, 2..5),
            lines in prop::collection::vec((0usize..2, 1i64..=30), 1..5)
        ) {
            let quantities: Vec<AtomicI64> =
                stocks.iter().map(|q| AtomicI64::new(*q)).collect();

            let accepted = reserve(&quantities, &lines);

            if !accepted {
                for (i, q) in stocks.iter().enumerate() {
                    prop_assert_eq!(quantities[i].load(Ordering::SeqCst), *q);
                }
            } else {
                for (i, q) in stocks.iter().enumerate() {
                    let deducted: i64 = lines
                        .iter()
                        .filter(|(p, _)| *p == i)
                        .map(|(_, qty)| qty)
                        .sum();
                    prop_assert_eq!(quantities[i].load(Ordering::SeqCst), q - deducted);
                }
            }
        }
    }
}
