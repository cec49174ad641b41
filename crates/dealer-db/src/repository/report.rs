//! # Report Repository
//!
//! Read-only aggregates for the dashboard.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use dealer_core::{SalesSummary, StockSummaryRow};

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Units on hand and their purchase value, per model.
    pub async fn stock_summary(&self, user_id: &str) -> DbResult<Vec<StockSummaryRow>> {
        debug!(user_id = %user_id, "Building stock summary");

        let rows = sqlx::query_as::<_, StockSummaryRow>(
            r#"
            SELECT
                model,
                COUNT(*) AS units,
                COALESCE(SUM(price_paise), 0) AS value_paise
            FROM stock_units
            WHERE user_id = ?1
            GROUP BY model
            ORDER BY model
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sales totals for one financial year.
    pub async fn sales_summary(&self, user_id: &str, financial_year: &str) -> DbResult<SalesSummary> {
        debug!(user_id = %user_id, financial_year = %financial_year, "Building sales summary");

        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                ?2 AS financial_year,
                COUNT(*) AS invoices,
                (SELECT COUNT(*)
                 FROM invoice_items ii
                 JOIN invoices i2 ON i2.id = ii.invoice_id
                 WHERE i2.user_id = ?1 AND i2.financial_year = ?2) AS vehicles,
                COALESCE(SUM(taxable_paise), 0) AS taxable_paise,
                COALESCE(SUM(cgst_paise + sgst_paise + igst_paise), 0) AS tax_paise,
                COALESCE(SUM(total_paise), 0) AS total_paise
            FROM invoices
            WHERE user_id = ?1 AND financial_year = ?2
            "#,
        )
        .bind(user_id)
        .bind(financial_year)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use dealer_core::{
        InvoiceDraft, InvoiceLine, NumberingPolicy, PurchaseDraft, SupplyKind, VehicleSpec,
    };

    fn vehicle(chassis: &str, model: &str, price_paise: i64) -> VehicleSpec {
        VehicleSpec {
            chassis_no: chassis.to_string(),
            engine_no: format!("E{chassis}"),
            model: model.to_string(),
            colour: "Black".to_string(),
            price_paise,
            hsn_code: "87112019".to_string(),
            gst_rate_bps: 2800,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_summaries() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = db.coordinator(NumberingPolicy::default());
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

        coordinator
            .save_purchase(
                "user-1",
                &PurchaseDraft {
                    purchase_date: day,
                    supplier_name: "HMSI".to_string(),
                    supplier_gstin: None,
                    supplier_bill_no: None,
                    supply_kind: SupplyKind::IntraState,
                    notes: None,
                    items: vec![
                        vehicle("SHINE00001", "Shine", 6_500_000),
                        vehicle("SHINE00002", "Shine", 6_500_000),
                        vehicle("DIO0000001", "Dio", 7_100_000),
                    ],
                },
            )
            .await
            .unwrap();

        coordinator
            .save_invoice(
                "user-1",
                &InvoiceDraft {
                    invoice_date: day,
                    customer_name: "Priya Nair".to_string(),
                    customer_address: None,
                    customer_phone: None,
                    customer_gstin: None,
                    supply_kind: SupplyKind::InterState,
                    notes: None,
                    items: vec![InvoiceLine {
                        chassis_no: "DIO0000001".to_string(),
                        sale_price_paise: Some(7_500_000),
                    }],
                },
            )
            .await
            .unwrap();

        let stock = db.reports().stock_summary("user-1").await.unwrap();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].model, "Shine");
        assert_eq!(stock[0].units, 2);
        assert_eq!(stock[0].value_paise, 13_000_000);

        let sales = db.reports().sales_summary("user-1", "2024-25").await.unwrap();
        assert_eq!(sales.invoices, 1);
        assert_eq!(sales.vehicles, 1);
        assert_eq!(sales.taxable_paise, 7_500_000);
        assert_eq!(sales.tax_paise, 2_100_000);
        assert_eq!(sales.total_paise, 9_600_000);

        let empty = db.reports().sales_summary("user-1", "2023-24").await.unwrap();
        assert_eq!(empty.invoices, 0);
        assert_eq!(empty.total_paise, 0);
    }
}
