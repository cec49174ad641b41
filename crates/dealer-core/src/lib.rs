//! # dealer-core: Pure Business Logic for Dealer Books
//!
//! This crate holds the rules that keep vehicle stock, purchases and sales
//! invoices consistent, expressed as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dealer Books Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend (SPA)                           │   │
//! │  │   Purchase form ──► Stock list ──► Invoice form ──► Print view │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    dealer-api (axum)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dealer-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types    money    fiscal    numbering   reconcile   billing  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            dealer-db (SQLite, stock ledger, coordinator)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockUnit, Invoice, Purchase, DocumentType, ...)
//! - [`money`] - Money in paise with integer arithmetic
//! - [`fiscal`] - Financial year derivation and labels
//! - [`numbering`] - Sequential document number formatting
//! - [`reconcile`] - Diffing of chassis lists on document edits
//! - [`billing`] - GST totals for invoices and purchases
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use dealer_core::fiscal::FinancialYear;
//! use dealer_core::numbering::format_document_number;
//! use dealer_core::DocumentType;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
//! let fy = FinancialYear::containing(date, 4).unwrap();
//! assert_eq!(fy.label(), "2024-25");
//!
//! let number = format_document_number(DocumentType::SalesInvoice, &fy.label(), 7, 4);
//! assert_eq!(number, "INV/2024-25/0007");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod fiscal;
pub mod money;
pub mod numbering;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use fiscal::FinancialYear;
pub use money::Money;
pub use numbering::NumberingPolicy;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First month of the financial year when nothing else is configured.
///
/// April, the Indian accounting year (1 April to 31 March).
pub const DEFAULT_FY_START_MONTH: u32 = 4;

/// Zero-padding width of the sequence part of a document number.
pub const DEFAULT_SEQUENCE_PADDING: usize = 4;

/// Maximum vehicles on a single invoice or purchase.
pub const MAX_DOCUMENT_ITEMS: usize = 50;
