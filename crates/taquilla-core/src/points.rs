//! # Points Ledger
//!
//! Loyalty points arithmetic. Points are computed on whole currency units of
//! an order subtotal; the minor part never earns or costs points.
//!
//! ```text
//! standard confirmation:  earn  floor(subtotal / 20)   (5%)
//! presale confirmation:   spend floor(subtotal / 10)   (10%)
//! ```

use crate::money::Money;

/// Currency units per point earned.
pub const EARN_DIVISOR: i64 = 20;

/// Currency units per point spent.
pub const SPEND_DIVISOR: i64 = 10;

/// Points credited for a standard purchase. Zero for non-positive subtotals.
#[inline]
pub fn points_earned(subtotal: Money) -> i64 {
    if !subtotal.is_positive() {
        return 0;
    }
    subtotal.major_units() / EARN_DIVISOR
}

/// Points debited for a presale purchase. Zero for non-positive subtotals.
#[inline]
pub fn points_spent(subtotal: Money) -> i64 {
    if !subtotal.is_positive() {
        return 0;
    }
    subtotal.major_units() / SPEND_DIVISOR
}

/// A presale debit is allowed only when the balance covers it.
#[inline]
pub fn can_spend(balance: i64, required: i64) -> bool {
    balance >= required
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: i64) -> Money {
        Money::from_major_minor(n, 0)
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(points_earned(units(0)), 0);
        assert_eq!(points_earned(units(100)), 5);
        assert_eq!(points_spent(units(100)), 10);
    }

    #[test]
    fn test_floors() {
        assert_eq!(points_earned(units(39)), 1);
        assert_eq!(points_spent(units(19)), 1);
        // 99.99 is 99 whole units
        assert_eq!(points_spent(Money::from_cents(9999)), 9);
    }

    #[test]
    fn test_non_positive_subtotals() {
        assert_eq!(points_earned(Money::from_cents(-5000)), 0);
        assert_eq!(points_spent(Money::from_cents(-5000)), 0);
    }

    #[test]
    fn test_can_spend() {
        assert!(can_spend(10, 10));
        assert!(!can_spend(5, 10));
    }
}
