//! # Database Migrations
//!
//! Embedded SQL migrations for Dealer Books.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::new                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  _sqlx_migrations  ── compare ──  embedded migrations/sqlite/*.sql     │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql   ✓ applied                           │
//! │       └── 002_...                  ⬜ pending → run in a transaction    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Server starts accepting requests                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding a Migration
//!
//! Add `migrations/sqlite/NNN_description.sql` with the next number. Applied
//! files are checksummed, so never edit one after it has shipped.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// Migrations embedded at compile time from the workspace `migrations/sqlite`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration, in filename order.
///
/// Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
///
/// `/health` reports the schema as behind when `applied < embedded`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
