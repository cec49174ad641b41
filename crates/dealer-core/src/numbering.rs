//! # Document Numbering
//!
//! Formats sequential document numbers. The counters themselves live in the
//! database (`dealer-db::repository::counter`); this module only decides what
//! a number looks like.
//!
//! ```text
//!   prefix   financial year   sequence
//!   ┌──┐     ┌─────┐          ┌──┐
//!   INV/     2024-25    /     0007
//!
//!   preview(date) ──► FY ──► last_sequence + 1 ──► "INV/2024-25/0008"  (read only)
//!   commit(FY)    ──► last_sequence += 1       ──► stored on the document
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fiscal::FinancialYear;
use crate::types::{DocumentType, NumberPreview};
use crate::{DEFAULT_FY_START_MONTH, DEFAULT_SEQUENCE_PADDING};

/// Widest padding accepted from configuration.
pub const MAX_SEQUENCE_PADDING: usize = 10;

/// Formats a document number.
///
/// Sequences wider than `padding` are printed in full, never truncated.
///
/// ## Example
/// ```rust
/// use dealer_core::numbering::format_document_number;
/// use dealer_core::DocumentType;
///
/// assert_eq!(
///     format_document_number(DocumentType::Purchase, "2024-25", 12, 4),
///     "PUR/2024-25/0012"
/// );
/// ```
pub fn format_document_number(
    doc_type: DocumentType,
    fy_label: &str,
    sequence: i64,
    padding: usize,
) -> String {
    format!(
        "{}{}/{:0>width$}",
        doc_type.prefix(),
        fy_label,
        sequence,
        width = padding
    )
}

/// How a dealer numbers documents: where the financial year starts and how
/// wide the sequence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingPolicy {
    pub fy_start_month: u32,
    pub padding: usize,
}

impl Default for NumberingPolicy {
    fn default() -> Self {
        NumberingPolicy {
            fy_start_month: DEFAULT_FY_START_MONTH,
            padding: DEFAULT_SEQUENCE_PADDING,
        }
    }
}

impl NumberingPolicy {
    /// Creates a policy, rejecting a start month outside 1-12 or an
    /// unreasonable padding.
    pub fn new(fy_start_month: u32, padding: usize) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&fy_start_month) {
            return Err(ValidationError::OutOfRange {
                field: "financial year start month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(1..=MAX_SEQUENCE_PADDING).contains(&padding) {
            return Err(ValidationError::OutOfRange {
                field: "number padding".to_string(),
                min: 1,
                max: MAX_SEQUENCE_PADDING as i64,
            });
        }
        Ok(NumberingPolicy {
            fy_start_month,
            padding,
        })
    }

    /// Financial year a document dated `date` belongs to.
    pub fn financial_year(&self, date: NaiveDate) -> Result<FinancialYear, ValidationError> {
        FinancialYear::containing(date, self.fy_start_month)
    }

    /// Parses a financial year label under this policy's start month.
    pub fn parse_financial_year(&self, label: &str) -> Result<FinancialYear, ValidationError> {
        FinancialYear::parse(label, self.fy_start_month)
    }

    pub fn format(&self, doc_type: DocumentType, fy_label: &str, sequence: i64) -> String {
        format_document_number(doc_type, fy_label, sequence, self.padding)
    }

    /// Builds the preview shown for the next document after `last_sequence`.
    pub fn preview(
        &self,
        doc_type: DocumentType,
        fy_label: &str,
        last_sequence: i64,
    ) -> NumberPreview {
        let sequence = last_sequence + 1;
        NumberPreview {
            doc_type,
            financial_year: fy_label.to_string(),
            sequence,
            number: self.format(doc_type, fy_label, sequence),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
