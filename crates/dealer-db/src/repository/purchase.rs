//! # Purchase Repository
//!
//! Purchase headers and the vehicles received on them.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dealer_core::{Purchase, PurchaseItem, PurchaseWithItems, VehicleSpec};

const PURCHASE_COLUMNS: &str = r#"
    id, user_id, purchase_number, sequence, financial_year, purchase_date,
    supplier_name, supplier_gstin, supplier_bill_no, supply_kind,
    taxable_paise, cgst_paise, sgst_paise, igst_paise, total_paise,
    notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, purchase_id, user_id, chassis_no, engine_no, model, colour,
    price_paise, hsn_code, gst_rate_bps, category, tax_paise, created_at
"#;

/// Repository for purchases.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase together with its items.
    pub async fn get_with_items(
        &self,
        user_id: &str,
        id: &str,
    ) -> DbResult<Option<PurchaseWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let Some(purchase) = Self::find(&mut conn, user_id, id).await? else {
            return Ok(None);
        };
        let items = Self::items(&mut conn, &purchase.id).await?;

        Ok(Some(PurchaseWithItems { purchase, items }))
    }

    /// Lists purchases, newest first, optionally for one financial year.
    pub async fn list(
        &self,
        user_id: &str,
        financial_year: Option<&str>,
    ) -> DbResult<Vec<Purchase>> {
        debug!(user_id = %user_id, financial_year = ?financial_year, "Listing purchases");

        let sql = format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases
            WHERE user_id = ?1 AND (?2 IS NULL OR financial_year = ?2)
            ORDER BY purchase_date DESC, sequence DESC
            "#
        );

        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(user_id)
            .bind(financial_year)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        user_id: &str,
        id: &str,
    ) -> DbResult<Option<Purchase>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = ?1 AND id = ?2");

        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(purchase)
    }

    pub async fn items(
        conn: &mut SqliteConnection,
        purchase_id: &str,
    ) -> DbResult<Vec<PurchaseItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM purchase_items WHERE purchase_id = ?1 ORDER BY created_at, chassis_no"
        );

        let items = sqlx::query_as::<_, PurchaseItem>(&sql)
            .bind(purchase_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(items)
    }

    pub async fn insert(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
        debug!(id = %purchase.id, purchase_number = %purchase.purchase_number, "Inserting purchase");

        let sql = format!(
            r#"
            INSERT INTO purchases ({PURCHASE_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                    ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#
        );

        sqlx::query(&sql)
            .bind(&purchase.id)
            .bind(&purchase.user_id)
            .bind(&purchase.purchase_number)
            .bind(purchase.sequence)
            .bind(&purchase.financial_year)
            .bind(purchase.purchase_date)
            .bind(&purchase.supplier_name)
            .bind(&purchase.supplier_gstin)
            .bind(&purchase.supplier_bill_no)
            .bind(purchase.supply_kind)
            .bind(purchase.taxable_paise)
            .bind(purchase.cgst_paise)
            .bind(purchase.sgst_paise)
            .bind(purchase.igst_paise)
            .bind(purchase.total_paise)
            .bind(&purchase.notes)
            .bind(purchase.created_at)
            .bind(purchase.updated_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Rewrites the editable header fields and totals.
    pub async fn update_header(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
        debug!(id = %purchase.id, "Updating purchase header");

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                purchase_date = ?3,
                supplier_name = ?4,
                supplier_gstin = ?5,
                supplier_bill_no = ?6,
                supply_kind = ?7,
                taxable_paise = ?8,
                cgst_paise = ?9,
                sgst_paise = ?10,
                igst_paise = ?11,
                total_paise = ?12,
                notes = ?13,
                updated_at = ?14
            WHERE user_id = ?1 AND id = ?2
            "#,
        )
        .bind(&purchase.user_id)
        .bind(&purchase.id)
        .bind(purchase.purchase_date)
        .bind(&purchase.supplier_name)
        .bind(&purchase.supplier_gstin)
        .bind(&purchase.supplier_bill_no)
        .bind(purchase.supply_kind)
        .bind(purchase.taxable_paise)
        .bind(purchase.cgst_paise)
        .bind(purchase.sgst_paise)
        .bind(purchase.igst_paise)
        .bind(purchase.total_paise)
        .bind(&purchase.notes)
        .bind(purchase.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", &purchase.id));
        }

        Ok(())
    }

    /// Deletes a purchase header and its items. Stock must already be
    /// withdrawn.
    pub async fn delete(conn: &mut SqliteConnection, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting purchase");

        sqlx::query("DELETE FROM purchase_items WHERE purchase_id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM purchases WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", id));
        }

        Ok(())
    }

    pub async fn insert_item(conn: &mut SqliteConnection, item: &PurchaseItem) -> DbResult<()> {
        debug!(purchase_id = %item.purchase_id, chassis_no = %item.chassis_no, "Adding purchase item");

        let sql = format!(
            r#"
            INSERT INTO purchase_items ({ITEM_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#
        );

        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.purchase_id)
            .bind(&item.user_id)
            .bind(&item.chassis_no)
            .bind(&item.engine_no)
            .bind(&item.model)
            .bind(&item.colour)
            .bind(item.price_paise)
            .bind(&item.hsn_code)
            .bind(item.gst_rate_bps)
            .bind(&item.category)
            .bind(item.tax_paise)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Rewrites the attributes of a kept purchase item.
    pub async fn update_item(
        conn: &mut SqliteConnection,
        item_id: &str,
        vehicle: &VehicleSpec,
        tax_paise: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_items SET
                engine_no = ?2,
                model = ?3,
                colour = ?4,
                price_paise = ?5,
                hsn_code = ?6,
                gst_rate_bps = ?7,
                category = ?8,
                tax_paise = ?9
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(&vehicle.engine_no)
        .bind(&vehicle.model)
        .bind(&vehicle.colour)
        .bind(vehicle.price_paise)
        .bind(&vehicle.hsn_code)
        .bind(vehicle.gst_rate_bps)
        .bind(&vehicle.category)
        .bind(tax_paise)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase item", item_id));
        }

        Ok(())
    }

    pub async fn delete_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM purchase_items WHERE id = ?1")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
