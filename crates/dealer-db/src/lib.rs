//! # dealer-db: Database Layer for Dealer Books
//!
//! SQLite storage for the dealership's stock ledger, invoices, purchases and
//! document counters, plus the coordinator that keeps them consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Dealer Books Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/invoices)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dealer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Coordinator  │───►│  Repositories │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ save/edit/    │    │ StockRepo     │    │              │  │   │
//! │  │   │ delete in one │    │ InvoiceRepo   │    │ 001_init.sql │  │   │
//! │  │   │ transaction   │    │ PurchaseRepo  │    │              │  │   │
//! │  │   │               │    │ CounterRepo   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ Database (pool.rs): SqlitePool, WAL                │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite database file (DEALER_DB_PATH)                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table reads and single-statement writes
//! - [`coordinator`] - Multi-step writes: invoices, purchases, manual stock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dealer_db::{Database, DbConfig};
//! use dealer_core::NumberingPolicy;
//!
//! let db = Database::new(DbConfig::new("./data/dealer.db")).await?;
//!
//! let saved = db
//!     .coordinator(NumberingPolicy::default())
//!     .save_invoice("user-1", &draft)
//!     .await?;
//! println!("{}", saved.invoice.invoice_number); // INV/2024-25/0001
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::Coordinator;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::counter::CounterRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::report::ReportRepository;
pub use repository::stock::StockRepository;
