//! # GST Billing
//!
//! Totals for invoices and purchases. Prices are taxable values (GST is
//! charged on top), and tax is computed per line then summed.
//!
//! ```text
//!   line: taxable × rate ──► line tax (rounded to the paisa)
//!
//!   IntraState:  line tax ──split_in_half──► CGST + SGST
//!   InterState:  line tax ─────────────────► IGST
//!
//!   total = taxable + CGST + SGST + IGST
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{SupplyKind, TaxRate};

/// GST on a single line.
#[inline]
pub fn line_tax(taxable: Money, rate: TaxRate) -> Money {
    taxable.calculate_tax(rate)
}

/// Document totals, all in paise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTotals {
    pub taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total: Money,
}

impl DocumentTotals {
    /// Sums `(taxable value, GST rate)` lines.
    ///
    /// ## Example
    /// ```rust
    /// use dealer_core::billing::DocumentTotals;
    /// use dealer_core::money::Money;
    /// use dealer_core::types::{SupplyKind, TaxRate};
    ///
    /// let lines = [(Money::from_rupees(100), TaxRate::from_bps(2800))];
    /// let totals = DocumentTotals::compute(lines, SupplyKind::IntraState);
    /// assert_eq!(totals.cgst.paise(), 1400);
    /// assert_eq!(totals.sgst.paise(), 1400);
    /// assert_eq!(totals.total.paise(), 12_800);
    /// ```
    pub fn compute<I>(lines: I, supply: SupplyKind) -> Self
    where
        I: IntoIterator<Item = (Money, TaxRate)>,
    {
        let mut totals = DocumentTotals::default();

        for (taxable, rate) in lines {
            let tax = line_tax(taxable, rate);
            totals.taxable += taxable;
            match supply {
                SupplyKind::IntraState => {
                    let (cgst, sgst) = tax.split_in_half();
                    totals.cgst += cgst;
                    totals.sgst += sgst;
                }
                SupplyKind::InterState => totals.igst += tax,
            }
        }

        totals.total = totals.taxable + totals.tax();
        totals
    }

    /// Total GST across all components.
    pub fn tax(&self) -> Money {
        self.cgst + self.sgst + self.igst
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
