//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A nightly rate of $99.99 over 30 nights must sum to exactly           │
//! │  $2,999.70 on the folio - "close enough" is an accounting incident.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every rate, fee, tax, and penalty in the engine is an i64 of cents. │
//! │    Percentage math widens to i128 and rounds exactly once.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atrium_core::money::Money;
//!
//! // Create from cents (preferred)
//! let rate = Money::from_cents(9999); // $99.99
//!
//! // Arithmetic operations
//! let two_nights = rate * 2;                       // $199.98
//! let total = two_nights + Money::from_cents(500); // $204.98
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::RateBps;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage rate, rounding half away from zero.
    ///
    /// Used for tax and service-charge add-ons and for percentage
    /// cancellation penalties.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * bps + 5000) / 10000`, widened to i128
    /// to prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use atrium_core::money::Money;
    /// use atrium_core::types::RateBps;
    ///
    /// let subtotal = Money::from_cents(20000); // $200.00
    /// let tax = subtotal.apply_rate(RateBps::from_bps(1250)); // 12.5%
    /// assert_eq!(tax.cents(), 2500); // $25.00
    /// ```
    pub fn apply_rate(&self, rate: RateBps) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Presentation-layer formatting handles
/// localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (night counts, room counts).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Money(self.0 * count)
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
        let money = Money::from_cents(9999);
        assert_eq!(money.cents(), 9999);
        assert_eq!(money.dollars(), 99);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(9999)), "$99.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(10000);
        let b = Money::from_cents(2500);

        assert_eq!((a + b).cents(), 12500);
        assert_eq!((a - b).cents(), 7500);
        assert_eq!((a * 3).cents(), 30000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // $200.00 at 10% = $20.00
        let amount = Money::from_cents(20000);
        let tax = amount.apply_rate(RateBps::from_bps(1000));
        assert_eq!(tax.cents(), 2000);
    }

    #[test]
    fn test_apply_rate_with_rounding() {
        // $10.00 at 8.25% = $0.825 -> $0.83
        let amount = Money::from_cents(1000);
        let tax = amount.apply_rate(RateBps::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_apply_zero_rate() {
        let amount = Money::from_cents(12345);
        assert!(amount.apply_rate(RateBps::zero()).is_zero());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
    }
}
