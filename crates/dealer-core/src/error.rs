//! # Error Types
//!
//! Domain-specific error types for dealer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dealer-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dealer-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  dealer-api errors (app)                                               │
//! │  └── ApiError         - What the frontend sees (JSON)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while moving vehicles between stock and
/// documents.
///
/// Every variant is user-visible: the frontend shows the message inline next
/// to the offending field or as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The chassis number is neither in stock nor on any invoice.
    #[error("Vehicle {chassis_no} is not in stock")]
    UnitNotInStock { chassis_no: String },

    /// The chassis number is already attached to a sales invoice.
    ///
    /// ## When This Occurs
    /// ```text
    /// Invoice INV/2024-25/0003 sells MA3ERLF1S00123456
    ///      │
    ///      ▼
    /// New invoice lists MA3ERLF1S00123456 again
    ///      │
    ///      ▼
    /// UnitAlreadySold { chassis_no, invoice_number: "INV/2024-25/0003" }
    /// ```
    #[error("Vehicle {chassis_no} is already sold on invoice {invoice_number}")]
    UnitAlreadySold {
        chassis_no: String,
        invoice_number: String,
    },

    /// A chassis or engine number that must be new already exists.
    #[error("{field} '{value}' already exists")]
    DuplicateUnit { field: String, value: String },

    /// Sales invoice does not exist for this user.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Purchase does not exist for this user.
    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),

    /// Stock unit does not exist for this user.
    #[error("Stock unit not found: {0}")]
    StockUnitNotFound(String),

    /// A purchase cannot give back vehicles that were already sold.
    #[error("Purchase {purchase_number} has sold vehicles: {}", chassis_numbers.join(", "))]
    PurchaseHasSoldUnits {
        purchase_number: String,
        chassis_numbers: Vec<String>,
    },

    /// Editing moved a document into another financial year.
    ///
    /// The document number embeds the financial year, so the date may only
    /// move inside the year it was numbered in.
    #[error("Document {number} belongs to financial year {current}, cannot move it to {requested}")]
    FinancialYearChanged {
        number: String,
        current: String,
        requested: String,
    },

    /// Invoice or purchase without any vehicle.
    #[error("{document} must contain at least one vehicle")]
    EmptyDocument { document: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for rejections that point at a specific vehicle.
    pub fn is_stock_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::UnitNotInStock { .. }
                | CoreError::UnitAlreadySold { .. }
                | CoreError::DuplicateUnit { .. }
                | CoreError::PurchaseHasSoldUnits { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any stock movement happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid GSTIN, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value inside a single request (e.g., a chassis listed twice).
    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnitAlreadySold {
            chassis_no: "MA3ERLF1S00123456".to_string(),
            invoice_number: "INV/2024-25/0003".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Vehicle MA3ERLF1S00123456 is already sold on invoice INV/2024-25/0003"
        );

        let err = CoreError::PurchaseHasSoldUnits {
            purchase_number: "PUR/2024-25/0001".to_string(),
            chassis_numbers: vec!["CH1".to_string(), "CH2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Purchase PUR/2024-25/0001 has sold vehicles: CH1, CH2"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "chassis_no".to_string(),
        };
        assert_eq!(err.to_string(), "chassis_no is required");

        let err = ValidationError::Duplicate {
            field: "chassis_no".to_string(),
            value: "CH1".to_string(),
        };
        assert_eq!(err.to_string(), "chassis_no 'CH1' is listed more than once");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_stock_conflict());
    }

    #[test]
    fn test_stock_conflicts() {
        let err = CoreError::UnitNotInStock {
            chassis_no: "CH9".to_string(),
        };
        assert!(err.is_stock_conflict());
        assert!(!CoreError::InvoiceNotFound("x".to_string()).is_stock_conflict());
    }
}
