//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  A vehicle at ₹84,999.50 with 28% GST summed over fifty invoices in    │
//! │  floating point drifts by paise, and GST returns must reconcile to     │
//! │  the paisa.                                                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹84,999.50 = 8_499_950 paise, every sum is exact                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dealer_core::money::Money;
//!
//! let price = Money::from_paise(8_499_950); // ₹84,999.50
//! let two = price * 2;
//! assert_eq!(two.paise(), 16_999_900);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Where Money is Used
/// ```text
/// StockUnit.price_paise ──► InvoiceItem.sale_price_paise ──► taxable value
///                                                               │
///                                        calculate_tax(GST) ◄───┘
///                                               │
///                              CGST + SGST  or  IGST ──► Invoice.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::money::Money;
    ///
    /// let price = Money::from_paise(1099);
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(85_000).paise(), 8_500_000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1099).rupees(), 10);
    /// assert_eq!(Money::from_paise(-550).rupees(), -5);
    /// ```
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Calculates tax on this amount, rounding half away from zero to the
    /// nearest paisa.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::money::Money;
    /// use dealer_core::types::TaxRate;
    ///
    /// let taxable = Money::from_rupees(80_000);
    /// let gst = taxable.calculate_tax(TaxRate::from_bps(2800)); // 28%
    /// assert_eq!(gst.paise(), 2_240_000);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_paise = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(tax_paise as i64)
    }

    /// Splits an amount into two halves that add back up exactly.
    ///
    /// Used for CGST/SGST: the odd paisa, if any, goes to the first half.
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::money::Money;
    ///
    /// let (cgst, sgst) = Money::from_paise(1001).split_in_half();
    /// assert_eq!((cgst.paise(), sgst.paise()), (501, 500));
    /// ```
    pub const fn split_in_half(&self) -> (Money, Money) {
        let second = self.0 / 2;
        (Money(self.0 - second), Money(second))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for logs and debugging; the frontend does locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            self.rupees().abs(),
            self.paise_part()
        )
    }
}

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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(1099)), "₹10.99");
        assert_eq!(format!("{}", Money::from_rupees(85_000)), "₹85000.00");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-₹5.50");
        assert_eq!(format!("{}", Money::zero()), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_gst_on_vehicle_price() {
        // ₹72,500.00 at 28% = ₹20,300.00
        let taxable = Money::from_rupees(72_500);
        let gst = taxable.calculate_tax(TaxRate::from_bps(2800));
        assert_eq!(gst.paise(), 2_030_000);
    }

    #[test]
    fn test_tax_rounds_to_nearest_paisa() {
        // ₹10.05 at 5% = 50.25 paise → 50
        assert_eq!(Money::from_paise(1005).calculate_tax(TaxRate::from_bps(500)).paise(), 50);
        // ₹10.10 at 5% = 50.5 paise → 51
        assert_eq!(Money::from_paise(1010).calculate_tax(TaxRate::from_bps(500)).paise(), 51);
    }

    #[test]
    fn test_split_in_half_is_exact() {
        for paise in [0, 1, 2, 999, 1_000_001] {
            let (a, b) = Money::from_paise(paise).split_in_half();
            assert_eq!(a.paise() + b.paise(), paise);
            assert!(a.paise() - b.paise() <= 1);
        }
    }

    #[test]
    fn test_zero_is_empty_sum() {
        let none: Vec<Money> = Vec::new();
        assert_eq!(none.into_iter().sum::<Money>(), Money::zero());
        assert_eq!(Money::from_paise(250) + Money::zero(), Money::from_paise(250));
    }
}
