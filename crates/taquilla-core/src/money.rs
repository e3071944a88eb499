//! # Money Module
//!
//! Provides the `Money` type for ticket prices and order totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Prices, subtotals and order totals are integer minor units (cents).   │
//! │                                                                         │
//! │  Tariff price 4550 cents × 3 tickets = 13650 cents, exactly.           │
//! │  Points are derived from WHOLE currency units: 13650 cents → 136.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taquilla_core::money::Money;
//!
//! let price = Money::from_cents(4550);
//! let subtotal = price.multiply_quantity(3);
//! assert_eq!(subtotal.cents(), 13650);
//! assert_eq!(subtotal.major_units(), 136);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: matches SQLite INTEGER; order totals are never negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use taquilla_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use taquilla_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns whole currency units, truncating the minor part.
    ///
    /// ## Example
    /// ```rust
    /// use taquilla_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).major_units(), 10);
    /// assert_eq!(Money::from_cents(-550).major_units(), -5);
    /// ```
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / 100
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit price by a ticket quantity.
    ///
    /// ## Example
    /// ```rust
    /// use taquilla_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2500);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 5000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering; clients format currency themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.major_units().abs(),
            (self.0 % 100).abs()
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Order totals are the sum of line subtotals.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money(0), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major_units(), 10);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
    }

    #[test]
    fn test_sum_of_line_subtotals() {
        let lines = [
            Money::from_cents(2500).multiply_quantity(2),
            Money::from_cents(9000).multiply_quantity(1),
        ];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.cents(), 14000);

        let empty: Money = std::iter::empty().sum();
        assert_eq!(empty.cents(), 0);
    }

    #[test]
    fn test_is_positive() {
        assert!(!Money::from_cents(0).is_positive());
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::from_cents(-1).is_positive());
    }
}
