//! # Stock Repository
//!
//! The inventory ledger: which vehicles are on hand, and the four movements
//! that change it.
//!
//! ## Ledger Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stock Movements                                   │
//! │                                                                         │
//! │            receive (purchase save / manual entry)                      │
//! │   supplier ──────────────────────────────► stock_units                 │
//! │                                              │      ▲                   │
//! │                               reserve (sale) │      │ release (invoice  │
//! │                                              ▼      │  edit / delete)   │
//! │                                          invoice_items                  │
//! │                                                                         │
//! │   stock_units ──────────────────────────► (gone)                       │
//! │            withdraw (purchase edit / delete)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Movements take a `&mut SqliteConnection` so the coordinator can run
//! several of them inside one transaction. Reads go through the pool.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dealer_core::{CoreError, StockUnit, VehicleSpec};

const STOCK_COLUMNS: &str = r#"
    id, user_id, chassis_no, engine_no, model, colour,
    price_paise, hsn_code, gst_rate_bps, purchase_date, category,
    purchase_id, created_at, updated_at
"#;

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a stock unit by chassis number.
    pub async fn get(&self, user_id: &str, chassis_no: &str) -> DbResult<Option<StockUnit>> {
        let mut conn = self.pool.acquire().await?;
        find_in_stock(&mut conn, user_id, chassis_no).await
    }

    /// Lists stock, optionally filtered by a text query over chassis, engine,
    /// model and colour.
    ///
    /// ## Arguments
    /// * `query` - Filter text; empty lists everything
    /// * `limit` - Maximum rows returned
    pub async fn list(&self, user_id: &str, query: &str, limit: i64) -> DbResult<Vec<StockUnit>> {
        let query = query.trim();
        debug!(user_id = %user_id, query = %query, limit = limit, "Listing stock");

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock_units
            WHERE user_id = ?1
              AND (?2 = ''
                   OR chassis_no LIKE ?3 ESCAPE '\'
                   OR engine_no LIKE ?3 ESCAPE '\'
                   OR model LIKE ?3 ESCAPE '\'
                   OR colour LIKE ?3 ESCAPE '\')
            ORDER BY model, chassis_no
            LIMIT ?4
            "#
        );

        let units = sqlx::query_as::<_, StockUnit>(&sql)
            .bind(user_id)
            .bind(query)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }

    /// Counts vehicles in stock.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_units WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Movements (run inside the caller's transaction)
    // =========================================================================

    /// Takes a unit out of stock for a sale and returns its snapshot.
    ///
    /// ## Errors
    /// * `UnitAlreadySold` - chassis is on an invoice
    /// * `UnitNotInStock` - chassis is unknown
    pub async fn reserve(
        conn: &mut SqliteConnection,
        user_id: &str,
        chassis_no: &str,
    ) -> DbResult<StockUnit> {
        debug!(user_id = %user_id, chassis_no = %chassis_no, "Reserving stock unit");
        take_from_stock(conn, user_id, chassis_no).await
    }

    /// Puts a sold unit back with its original attributes.
    ///
    /// Idempotent: releasing a unit that is already in stock changes nothing.
    ///
    /// ## Returns
    /// `true` if a row was inserted.
    pub async fn release(conn: &mut SqliteConnection, unit: &StockUnit) -> DbResult<bool> {
        debug!(user_id = %unit.user_id, chassis_no = %unit.chassis_no, "Releasing stock unit");

        let sql = format!(
            r#"
            INSERT INTO stock_units ({STOCK_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT (user_id, chassis_no) DO NOTHING
            "#
        );

        let result = bind_unit(sqlx::query(&sql), unit)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Brings a new unit into stock.
    ///
    /// ## Errors
    /// * `DuplicateUnit` - chassis already in stock, or engine number already
    ///   in stock or sold
    /// * `UnitAlreadySold` - chassis is on an invoice
    pub async fn receive(conn: &mut SqliteConnection, unit: &StockUnit) -> DbResult<()> {
        debug!(user_id = %unit.user_id, chassis_no = %unit.chassis_no, "Receiving stock unit");

        if find_in_stock(conn, &unit.user_id, &unit.chassis_no)
            .await?
            .is_some()
        {
            return Err(CoreError::DuplicateUnit {
                field: "Chassis number".to_string(),
                value: unit.chassis_no.clone(),
            }
            .into());
        }
        if let Some(invoice_number) = sold_on(conn, &unit.user_id, &unit.chassis_no).await? {
            return Err(CoreError::UnitAlreadySold {
                chassis_no: unit.chassis_no.clone(),
                invoice_number,
            }
            .into());
        }
        if engine_in_use(conn, &unit.user_id, &unit.engine_no).await? {
            return Err(CoreError::DuplicateUnit {
                field: "Engine number".to_string(),
                value: unit.engine_no.clone(),
            }
            .into());
        }

        let sql = format!(
            r#"
            INSERT INTO stock_units ({STOCK_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#
        );
        bind_unit(sqlx::query(&sql), unit)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Removes a unit from stock because its purchase was edited or deleted.
    ///
    /// ## Errors
    /// * `UnitAlreadySold` - the unit has been sold and cannot be given back
    /// * `UnitNotInStock` - chassis is unknown
    pub async fn withdraw(
        conn: &mut SqliteConnection,
        user_id: &str,
        chassis_no: &str,
    ) -> DbResult<StockUnit> {
        debug!(user_id = %user_id, chassis_no = %chassis_no, "Withdrawing stock unit");
        take_from_stock(conn, user_id, chassis_no).await
    }

    /// Rewrites the attributes of a unit still in stock.
    ///
    /// Engine numbers are not checked here; callers editing several units
    /// at once check the whole set with [`StockRepository::engine_conflict`].
    ///
    /// ## Returns
    /// `false` when the unit is not in stock (sold units keep their invoice
    /// snapshot untouched).
    pub async fn update_attributes(
        conn: &mut SqliteConnection,
        user_id: &str,
        vehicle: &VehicleSpec,
        purchase_date: chrono::NaiveDate,
    ) -> DbResult<bool> {
        debug!(user_id = %user_id, chassis_no = %vehicle.chassis_no, "Updating stock unit");

        let result = sqlx::query(
            r#"
            UPDATE stock_units SET
                engine_no = ?3,
                model = ?4,
                colour = ?5,
                price_paise = ?6,
                hsn_code = ?7,
                gst_rate_bps = ?8,
                category = ?9,
                purchase_date = ?10,
                updated_at = ?11
            WHERE user_id = ?1 AND chassis_no = ?2
            "#,
        )
        .bind(user_id)
        .bind(&vehicle.chassis_no)
        .bind(&vehicle.engine_no)
        .bind(&vehicle.model)
        .bind(&vehicle.colour)
        .bind(vehicle.price_paise)
        .bind(&vehicle.hsn_code)
        .bind(vehicle.gst_rate_bps)
        .bind(&vehicle.category)
        .bind(purchase_date)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// First engine number in `vehicles` already held by a vehicle outside
    /// `vehicles`, in stock or sold.
    ///
    /// Vehicles in the set may trade engine numbers among themselves.
    pub async fn engine_conflict(
        conn: &mut SqliteConnection,
        user_id: &str,
        vehicles: &[VehicleSpec],
    ) -> DbResult<Option<String>> {
        let members: HashSet<&str> = vehicles.iter().map(|v| v.chassis_no.as_str()).collect();

        for vehicle in vehicles {
            let holders: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT chassis_no FROM stock_units WHERE user_id = ?1 AND engine_no = ?2
                UNION ALL
                SELECT chassis_no FROM invoice_items WHERE user_id = ?1 AND engine_no = ?2
                "#,
            )
            .bind(user_id)
            .bind(&vehicle.engine_no)
            .fetch_all(&mut *conn)
            .await?;

            if holders.iter().any(|c| !members.contains(c.as_str())) {
                return Ok(Some(vehicle.engine_no.clone()));
            }
        }

        Ok(None)
    }

    /// Moves a unit's engine number out of the way so another unit in the
    /// same edit can take it. The placeholder (`#` + row id) never passes
    /// engine number validation, so it cannot collide with a real one.
    pub async fn park_engine_no(
        conn: &mut SqliteConnection,
        user_id: &str,
        chassis_no: &str,
    ) -> DbResult<()> {
        sqlx::query("UPDATE stock_units SET engine_no = '#' || id WHERE user_id = ?1 AND chassis_no = ?2")
            .bind(user_id)
            .bind(chassis_no)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Invoice number a chassis is sold on, if any.
    pub async fn sold_on(
        conn: &mut SqliteConnection,
        user_id: &str,
        chassis_no: &str,
    ) -> DbResult<Option<String>> {
        sold_on(conn, user_id, chassis_no).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn find_in_stock(
    conn: &mut SqliteConnection,
    user_id: &str,
    chassis_no: &str,
) -> DbResult<Option<StockUnit>> {
    let sql = format!("SELECT {STOCK_COLUMNS} FROM stock_units WHERE user_id = ?1 AND chassis_no = ?2");

    let unit = sqlx::query_as::<_, StockUnit>(&sql)
        .bind(user_id)
        .bind(chassis_no)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(unit)
}

async fn sold_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    chassis_no: &str,
) -> DbResult<Option<String>> {
    let number: Option<String> = sqlx::query_scalar(
        r#"
        SELECT i.invoice_number
        FROM invoice_items ii
        JOIN invoices i ON i.id = ii.invoice_id
        WHERE ii.user_id = ?1 AND ii.chassis_no = ?2
        "#,
    )
    .bind(user_id)
    .bind(chassis_no)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(number)
}

/// Whether an engine number is used by any vehicle, in stock or sold.
async fn engine_in_use(conn: &mut SqliteConnection, user_id: &str, engine_no: &str) -> DbResult<bool> {
    let used: i64 = sqlx::query_scalar(
        r#"
        SELECT
            (SELECT COUNT(*) FROM stock_units WHERE user_id = ?1 AND engine_no = ?2)
          + (SELECT COUNT(*) FROM invoice_items WHERE user_id = ?1 AND engine_no = ?2)
        "#,
    )
    .bind(user_id)
    .bind(engine_no)
    .fetch_one(&mut *conn)
    .await?;

    Ok(used > 0)
}

/// Escapes LIKE wildcards so user text matches literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Deletes the stock row and returns it, or explains why it can't.
async fn take_from_stock(
    conn: &mut SqliteConnection,
    user_id: &str,
    chassis_no: &str,
) -> DbResult<StockUnit> {
    let Some(unit) = find_in_stock(conn, user_id, chassis_no).await? else {
        return Err(match sold_on(conn, user_id, chassis_no).await? {
            Some(invoice_number) => CoreError::UnitAlreadySold {
                chassis_no: chassis_no.to_string(),
                invoice_number,
            },
            None => CoreError::UnitNotInStock {
                chassis_no: chassis_no.to_string(),
            },
        }
        .into());
    };

    let result = sqlx::query("DELETE FROM stock_units WHERE id = ?1")
        .bind(&unit.id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() != 1 {
        return Err(DbError::not_found("Stock unit", chassis_no));
    }

    Ok(unit)
}

fn bind_unit<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    unit: &'q StockUnit,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&unit.id)
        .bind(&unit.user_id)
        .bind(&unit.chassis_no)
        .bind(&unit.engine_no)
        .bind(&unit.model)
        .bind(&unit.colour)
        .bind(unit.price_paise)
        .bind(&unit.hsn_code)
        .bind(unit.gst_rate_bps)
        .bind(unit.purchase_date)
        .bind(&unit.category)
        .bind(&unit.purchase_id)
        .bind(unit.created_at)
        .bind(unit.updated_at)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;

    fn vehicle(chassis: &str, engine: &str) -> VehicleSpec {
        VehicleSpec {
            chassis_no: chassis.to_string(),
            engine_no: engine.to_string(),
            model: "Jupiter ZX".to_string(),
            colour: "Starlight Blue".to_string(),
            price_paise: 7_600_000,
            hsn_code: "87112019".to_string(),
            gst_rate_bps: 2800,
            category: Some("scooter".to_string()),
        }
    }

    fn unit(chassis: &str, engine: &str) -> StockUnit {
        let date = NaiveDate::from_ymd_opt(2024, 8, 10).unwrap();
        StockUnit::from_spec("user-1", &vehicle(chassis, engine), date, None, Utc::now())
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_receive_then_reserve() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();
        drop(conn);
        assert_eq!(db.stock().count("user-1").await.unwrap(), 1);

        let mut conn = db.pool().acquire().await.unwrap();
        let taken = StockRepository::reserve(&mut conn, "user-1", "MD626AG01")
            .await
            .unwrap();
        drop(conn);

        assert_eq!(taken.model, "Jupiter ZX");
        assert_eq!(db.stock().count("user-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_receive_rejects_duplicates() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();

        let err = StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5002"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateUnit { ref field, .. }) if field == "Chassis number"
        ));

        let err = StockRepository::receive(&mut conn, &unit("MD626AG02", "AG5001"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateUnit { ref field, .. }) if field == "Engine number"
        ));
    }

    #[tokio::test]
    async fn test_reserve_unknown_chassis() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = StockRepository::reserve(&mut conn, "user-1", "NOPE123")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnitNotInStock { .. })));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let u = unit("MD626AG01", "AG5001");

        assert!(StockRepository::release(&mut conn, &u).await.unwrap());
        assert!(!StockRepository::release(&mut conn, &u).await.unwrap());
        drop(conn);

        assert_eq!(db.stock().count("user-1").await.unwrap(), 1);
        let restored = db.stock().get("user-1", "MD626AG01").await.unwrap().unwrap();
        assert_eq!(restored.id, u.id);
    }

    #[tokio::test]
    async fn test_stock_is_per_user() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut other = unit("MD626AG01", "AG5001");
        other.user_id = "user-2".to_string();

        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();
        StockRepository::receive(&mut conn, &other).await.unwrap();
        drop(conn);

        assert_eq!(db.stock().count("user-1").await.unwrap(), 1);
        assert_eq!(db.stock().count("user-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_query() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut red = unit("MD626AG02", "AG5002");
        red.colour = "Volcano Red".to_string();

        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();
        StockRepository::receive(&mut conn, &red).await.unwrap();
        drop(conn);

        let all = db.stock().list("user-1", "", 50).await.unwrap();
        assert_eq!(all.len(), 2);

        let reds = db.stock().list("user-1", "volcano", 50).await.unwrap();
        assert_eq!(reds.len(), 1);
        assert_eq!(reds[0].chassis_no, "MD626AG02");
    }

    #[tokio::test]
    async fn test_list_treats_wildcards_literally() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut promo = unit("MD626AG02", "AG5002");
        promo.model = "Jupiter 100% Electric".to_string();

        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();
        StockRepository::receive(&mut conn, &promo).await.unwrap();
        drop(conn);

        let percent = db.stock().list("user-1", "%", 50).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].chassis_no, "MD626AG02");

        assert!(db.stock().list("user-1", "_", 50).await.unwrap().is_empty());
        assert!(db.stock().list("user-1", "\\", 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_conflict_ignores_members_of_the_set() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        StockRepository::receive(&mut conn, &unit("MD626AG01", "AG5001"))
            .await
            .unwrap();
        StockRepository::receive(&mut conn, &unit("MD626AG02", "AG5002"))
            .await
            .unwrap();

        let swapped = [vehicle("MD626AG01", "AG5002"), vehicle("MD626AG02", "AG5001")];
        assert_eq!(
            StockRepository::engine_conflict(&mut conn, "user-1", &swapped).await.unwrap(),
            None
        );

        let taken = [vehicle("MD626AG01", "AG5002")];
        assert_eq!(
            StockRepository::engine_conflict(&mut conn, "user-1", &taken).await.unwrap(),
            Some("AG5002".to_string())
        );
    }
}
