//! # Counter Repository
//!
//! Sequential document numbers per (user, financial year, document type).
//!
//! ## Preview vs Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form opens                                                             │
//! │     └── last_sequence() → 6 → shows "INV/2024-25/0007"  (no write)     │
//! │                                                                         │
//! │  Save pressed (inside the save transaction)                            │
//! │     └── commit() → UPSERT last_sequence + 1 → 7                        │
//! │         └── document stored as INV/2024-25/0007                        │
//! │                                                                         │
//! │  Save fails → transaction rolls back → counter stays at 6              │
//! │  Document deleted later → counter stays at 7 (gap, never reused)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dealer_core::DocumentType;

/// Repository for document counters.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    /// Creates a new CounterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Last committed sequence, 0 when nothing has been numbered yet.
    pub async fn last_sequence(
        &self,
        user_id: &str,
        doc_type: DocumentType,
        financial_year: &str,
    ) -> DbResult<i64> {
        let last: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT last_sequence FROM document_counters
            WHERE user_id = ?1 AND financial_year = ?2 AND doc_type = ?3
            "#,
        )
        .bind(user_id)
        .bind(financial_year)
        .bind(doc_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last.unwrap_or(0))
    }

    /// Increments the counter and returns the new sequence.
    ///
    /// Creates the counter at 1 the first time a (user, FY, type) is used.
    /// Must run inside the transaction that stores the document.
    pub async fn commit(
        conn: &mut SqliteConnection,
        user_id: &str,
        doc_type: DocumentType,
        financial_year: &str,
    ) -> DbResult<i64> {
        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_counters (user_id, financial_year, doc_type, last_sequence, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            ON CONFLICT (user_id, financial_year, doc_type) DO UPDATE SET
                last_sequence = last_sequence + 1,
                updated_at = excluded.updated_at
            RETURNING last_sequence
            "#,
        )
        .bind(user_id)
        .bind(financial_year)
        .bind(doc_type)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        debug!(
            user_id = %user_id,
            doc_type = %doc_type,
            financial_year = %financial_year,
            sequence = sequence,
            "Committed document counter"
        );

        Ok(sequence)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_commit_increments_per_scope() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let inv = DocumentType::SalesInvoice;
        assert_eq!(CounterRepository::commit(&mut conn, "u1", inv, "2024-25").await.unwrap(), 1);
        assert_eq!(CounterRepository::commit(&mut conn, "u1", inv, "2024-25").await.unwrap(), 2);
        // Other year, other type, other user all start fresh
        assert_eq!(CounterRepository::commit(&mut conn, "u1", inv, "2025-26").await.unwrap(), 1);
        assert_eq!(
            CounterRepository::commit(&mut conn, "u1", DocumentType::Purchase, "2024-25")
                .await
                .unwrap(),
            1
        );
        assert_eq!(CounterRepository::commit(&mut conn, "u2", inv, "2024-25").await.unwrap(), 1);
        drop(conn);

        assert_eq!(db.counters().last_sequence("u1", inv, "2024-25").await.unwrap(), 2);
        assert_eq!(db.counters().last_sequence("u1", inv, "2025-26").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_sequence_does_not_write() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let counters = db.counters();

        for _ in 0..3 {
            assert_eq!(
                counters
                    .last_sequence("u1", DocumentType::SalesInvoice, "2024-25")
                    .await
                    .unwrap(),
                0
            );
        }
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_counters")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_rolled_back_commit_is_not_kept() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = crate::pool::begin_write(db.pool()).await.unwrap();
        CounterRepository::commit(&mut tx, "u1", DocumentType::SalesInvoice, "2024-25")
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(
            db.counters()
                .last_sequence("u1", DocumentType::SalesInvoice, "2024-25")
                .await
                .unwrap(),
            0
        );
    }
}
