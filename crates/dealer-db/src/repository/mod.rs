//! # Repository Module
//!
//! Database repository implementations for Dealer Books.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Kinds of Methods                                 │
//! │                                                                         │
//! │  Reads: &self, run on the pool                                         │
//! │       db.stock().list(user_id, "activa", 50)                           │
//! │                                                                         │
//! │  Writes: associated fns taking &mut SqliteConnection                   │
//! │       StockRepository::reserve(&mut tx, user_id, chassis)              │
//! │       InvoiceRepository::insert_item(&mut tx, &item)                   │
//! │                                                                         │
//! │  Writes never open their own transaction. The coordinator opens one,   │
//! │  calls several writes, and commits once.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockRepository`](stock::StockRepository) - Stock ledger
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Sales invoices
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchases
//! - [`CounterRepository`](counter::CounterRepository) - Document counters
//! - [`ReportRepository`](report::ReportRepository) - Dashboard aggregates

pub mod counter;
pub mod invoice;
pub mod purchase;
pub mod report;
pub mod stock;
