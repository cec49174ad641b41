//! # Database Handle
//!
//! Opens the dealership's SQLite file, brings the schema up to date and hands
//! out repositories and the [`Coordinator`].
//!
//! ## Readers and Writers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One SQLite file, WAL journal                     │
//! │                                                                         │
//! │  GET /api/stock ────────► pool conn ── snapshot read, never waits      │
//! │  GET /api/invoices ─────► pool conn ── snapshot read, never waits      │
//! │                                                                         │
//! │  POST /api/invoices ──► begin_write ── BEGIN IMMEDIATE ─┐              │
//! │  PUT  /api/purchases ─► begin_write ── BEGIN IMMEDIATE ─┤ one holds    │
//! │  DELETE /api/... ─────► begin_write ── BEGIN IMMEDIATE ─┘ the lock,    │
//! │                                                           the rest     │
//! │                                                           wait up to   │
//! │                                                           busy_timeout │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Transactions
//! A deferred `BEGIN` that reads before it writes cannot be upgraded once
//! another connection has committed: SQLite answers `SQLITE_BUSY` at once and
//! the busy timeout is not consulted. Coordinator transactions always check
//! stock before moving it, so they all start through [`begin_write`], which
//! takes the write lock with the first statement.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::coordinator::Coordinator;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::counter::CounterRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::report::ReportRepository;
use crate::repository::stock::StockRepository;
use dealer_core::NumberingPolicy;

const IN_MEMORY: &str = ":memory:";

/// Longest a request waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// File connections are recycled after these; in-memory ones never are.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how many requests may use it at once.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/dealer.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first start.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,

    /// How long a writer queues behind another writer before giving up.
    /// Default: 5 seconds
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A private database that disappears with the [`Database`]. Tests only.
    pub fn in_memory() -> Self {
        DbConfig {
            // Each connection to :memory: opens its own empty database
            max_connections: 1,
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT);

        if self.is_in_memory() {
            options.idle_timeout(None).max_lifetime(None)
        } else {
            options
                .idle_timeout(Some(IDLE_TIMEOUT))
                .max_lifetime(Some(MAX_LIFETIME))
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the dealership database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database and applies pending migrations.
    ///
    /// Every connection runs with WAL, `synchronous = NORMAL`, foreign keys on
    /// (items cascade with their document) and the configured busy timeout.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening dealer database"
        );

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", config.database_path.display()))
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .busy_timeout(config.busy_timeout);

        let pool = config
            .pool_options()
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(busy_timeout_ms = config.busy_timeout.as_millis() as u64, "Pool connected");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// The underlying pool, for tests and ad-hoc queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    pub fn counters(&self) -> CounterRepository {
        CounterRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Coordinator numbering documents with `policy`.
    pub fn coordinator(&self, policy: NumberingPolicy) -> Coordinator {
        Coordinator::new(self.pool.clone(), policy)
    }

    /// `(embedded, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the pool. Later calls on any clone fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing dealer database");
        self.pool.close().await;
    }
}

/// Starts a transaction holding the write lock from its first statement.
///
/// Concurrent writers queue on the connection's busy timeout instead of
/// failing with `database is locked`.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(DbError::transaction)
}

// =============================================================================
// Unit Tests
// =============================================================================
