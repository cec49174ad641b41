//! # Invoice Repository
//!
//! Sales invoice headers and their items.
//!
//! Stock is never touched here: taking units out of stock and putting them
//! back is the coordinator's job, which calls these writes and the stock
//! ledger inside one transaction.
//!
//! ## Snapshot Pattern
//! Every attribute of the sold stock unit is copied to `invoice_items`, so the
//! unit can be restored exactly even if the purchase is edited later.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dealer_core::{Invoice, InvoiceItem, InvoiceWithItems};

const INVOICE_COLUMNS: &str = r#"
    id, user_id, invoice_number, sequence, financial_year, invoice_date,
    customer_name, customer_address, customer_phone, customer_gstin,
    supply_kind, taxable_paise, cgst_paise, sgst_paise, igst_paise,
    total_paise, notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, invoice_id, user_id, stock_unit_id, chassis_no, engine_no, model,
    colour, price_paise, hsn_code, gst_rate_bps, purchase_date, category,
    purchase_id, stocked_at, sale_price_paise, tax_paise, created_at
"#;

/// Repository for sales invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an invoice header by ID.
    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, user_id, id).await
    }

    /// Gets an invoice together with its items.
    pub async fn get_with_items(
        &self,
        user_id: &str,
        id: &str,
    ) -> DbResult<Option<InvoiceWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let Some(invoice) = Self::find(&mut conn, user_id, id).await? else {
            return Ok(None);
        };
        let items = Self::items(&mut conn, &invoice.id).await?;

        Ok(Some(InvoiceWithItems { invoice, items }))
    }

    /// Lists invoices, newest first, optionally for one financial year.
    pub async fn list(&self, user_id: &str, financial_year: Option<&str>) -> DbResult<Vec<Invoice>> {
        debug!(user_id = %user_id, financial_year = ?financial_year, "Listing invoices");

        let sql = format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE user_id = ?1 AND (?2 IS NULL OR financial_year = ?2)
            ORDER BY invoice_date DESC, sequence DESC
            "#
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(user_id)
            .bind(financial_year)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    // =========================================================================
    // Transactional reads and writes
    // =========================================================================

    /// Finds an invoice header on the given connection.
    pub async fn find(
        conn: &mut SqliteConnection,
        user_id: &str,
        id: &str,
    ) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?1 AND id = ?2");

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(invoice)
    }

    /// Items of an invoice in the order they were added.
    pub async fn items(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY created_at, chassis_no"
        );

        let items = sqlx::query_as::<_, InvoiceItem>(&sql)
            .bind(invoice_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(items)
    }

    /// Inserts an invoice header.
    pub async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, invoice_number = %invoice.invoice_number, "Inserting invoice");

        let sql = format!(
            r#"
            INSERT INTO invoices ({INVOICE_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#
        );

        sqlx::query(&sql)
            .bind(&invoice.id)
            .bind(&invoice.user_id)
            .bind(&invoice.invoice_number)
            .bind(invoice.sequence)
            .bind(&invoice.financial_year)
            .bind(invoice.invoice_date)
            .bind(&invoice.customer_name)
            .bind(&invoice.customer_address)
            .bind(&invoice.customer_phone)
            .bind(&invoice.customer_gstin)
            .bind(invoice.supply_kind)
            .bind(invoice.taxable_paise)
            .bind(invoice.cgst_paise)
            .bind(invoice.sgst_paise)
            .bind(invoice.igst_paise)
            .bind(invoice.total_paise)
            .bind(&invoice.notes)
            .bind(invoice.created_at)
            .bind(invoice.updated_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Rewrites the editable header fields and totals. Number, sequence and
    /// financial year never change.
    pub async fn update_header(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, "Updating invoice header");

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                invoice_date = ?3,
                customer_name = ?4,
                customer_address = ?5,
                customer_phone = ?6,
                customer_gstin = ?7,
                supply_kind = ?8,
                taxable_paise = ?9,
                cgst_paise = ?10,
                sgst_paise = ?11,
                igst_paise = ?12,
                total_paise = ?13,
                notes = ?14,
                updated_at = ?15
            WHERE user_id = ?1 AND id = ?2
            "#,
        )
        .bind(&invoice.user_id)
        .bind(&invoice.id)
        .bind(invoice.invoice_date)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_address)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_gstin)
        .bind(invoice.supply_kind)
        .bind(invoice.taxable_paise)
        .bind(invoice.cgst_paise)
        .bind(invoice.sgst_paise)
        .bind(invoice.igst_paise)
        .bind(invoice.total_paise)
        .bind(&invoice.notes)
        .bind(invoice.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }

        Ok(())
    }

    /// Deletes an invoice header and its items.
    pub async fn delete(conn: &mut SqliteConnection, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    /// Inserts an invoice item.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &InvoiceItem) -> DbResult<()> {
        debug!(invoice_id = %item.invoice_id, chassis_no = %item.chassis_no, "Adding invoice item");

        let sql = format!(
            r#"
            INSERT INTO invoice_items ({ITEM_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                    ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#
        );

        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(&item.user_id)
            .bind(&item.stock_unit_id)
            .bind(&item.chassis_no)
            .bind(&item.engine_no)
            .bind(&item.model)
            .bind(&item.colour)
            .bind(item.price_paise)
            .bind(&item.hsn_code)
            .bind(item.gst_rate_bps)
            .bind(item.purchase_date)
            .bind(&item.category)
            .bind(&item.purchase_id)
            .bind(item.stocked_at)
            .bind(item.sale_price_paise)
            .bind(item.tax_paise)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Changes the selling price (and its tax) of a kept item.
    pub async fn update_item_price(
        conn: &mut SqliteConnection,
        item_id: &str,
        sale_price_paise: i64,
        tax_paise: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE invoice_items SET sale_price_paise = ?2, tax_paise = ?3 WHERE id = ?1",
        )
        .bind(item_id)
        .bind(sale_price_paise)
        .bind(tax_paise)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice item", item_id));
        }

        Ok(())
    }

    /// Removes one item from an invoice.
    pub async fn delete_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM invoice_items WHERE id = ?1")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};
    use dealer_core::SupplyKind;

    fn header(id: &str, number: &str, sequence: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            invoice_number: number.to_string(),
            sequence,
            financial_year: "2024-25".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            customer_name: "Anita Desai".to_string(),
            customer_address: None,
            customer_phone: None,
            customer_gstin: None,
            supply_kind: SupplyKind::IntraState,
            taxable_paise: 0,
            cgst_paise: 0,
            sgst_paise: 0,
            igst_paise: 0,
            total_paise: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        InvoiceRepository::insert(&mut conn, &header("a", "INV/2024-25/0001", 1))
            .await
            .unwrap();
        InvoiceRepository::insert(&mut conn, &header("b", "INV/2024-25/0002", 2))
            .await
            .unwrap();
        drop(conn);

        let all = db.invoices().list("user-1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].invoice_number, "INV/2024-25/0002");

        assert!(db.invoices().list("user-1", Some("2025-26")).await.unwrap().is_empty());
        assert!(db.invoices().get_by_id("user-2", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        InvoiceRepository::insert(&mut conn, &header("a", "INV/2024-25/0001", 1))
            .await
            .unwrap();
        let err = InvoiceRepository::insert(&mut conn, &header("b", "INV/2024-25/0001", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_invoice() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = InvoiceRepository::delete(&mut conn, "user-1", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
