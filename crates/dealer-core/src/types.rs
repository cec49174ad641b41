//! # Domain Types
//!
//! Core domain types used throughout Dealer Books.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockUnit     │   │    Invoice      │   │    Purchase     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  chassis_no ◄───┼───┼─ InvoiceItem    │   │  PurchaseItem ──┼──►    │
//! │  │  engine_no      │   │  invoice_number │   │  purchase_number│ stock │
//! │  │  model, colour  │   │  financial_year │   │  supplier       │       │
//! │  │  price_paise    │   │  GST totals     │   │  GST totals     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  DocumentType   │   │   SupplyKind    │       │
//! │  │  bps (u32)      │   │  SalesInvoice   │   │  IntraState     │       │
//! │  │  2800 = 28%     │   │  Purchase       │   │  InterState     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Residency Invariant
//! A chassis number lives in exactly one place per user: a `StockUnit` row
//! or an `InvoiceItem` row. Invoice items keep a full snapshot of the stock
//! unit so the unit can be put back unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 2800 bps = 28% (two-wheelers, cars) and
/// 500 bps = 5% (electric vehicles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Document Type
// =============================================================================

/// The kind of numbered document. Each kind has its own counter per user
/// and financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Sales tax invoice; takes vehicles out of stock.
    SalesInvoice,
    /// Purchase entry; brings vehicles into stock.
    Purchase,
}

impl DocumentType {
    /// Prefix printed in front of the financial year in document numbers.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentType::SalesInvoice => "INV/",
            DocumentType::Purchase => "PUR/",
        }
    }

    /// Storage / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentType::SalesInvoice => "sales_invoice",
            DocumentType::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Supply Kind
// =============================================================================

/// Place of supply relative to the dealer's state, which decides the GST split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SupplyKind {
    /// Same state: tax is split into CGST + SGST.
    #[default]
    IntraState,
    /// Other state: tax is charged as IGST.
    InterState,
}

// =============================================================================
// Vehicle Spec
// =============================================================================

/// Attributes of a vehicle as entered on a purchase or a manual stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VehicleSpec {
    /// Chassis number, the business key.
    pub chassis_no: String,
    pub engine_no: String,
    pub model: String,
    pub colour: String,
    /// Purchase price in paise (taxable value).
    pub price_paise: i64,
    /// HSN code for GST (e.g. "87112019").
    pub hsn_code: String,
    /// GST rate in basis points.
    pub gst_rate_bps: u32,
    /// Free-form grouping such as "scooter" or "motorcycle".
    pub category: Option<String>,
}

impl VehicleSpec {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.gst_rate_bps)
    }
}

/// Manual stock entry: a vehicle that arrives without a purchase document.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockEntry {
    #[serde(flatten)]
    pub vehicle: VehicleSpec,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
}

// =============================================================================
// Stock Unit
// =============================================================================

/// A vehicle currently in stock (not attached to a sales invoice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockUnit {
    /// Unique identifier (UUID v4), kept across sell/restore cycles.
    pub id: String,
    pub user_id: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub model: String,
    pub colour: String,
    pub price_paise: i64,
    pub hsn_code: String,
    pub gst_rate_bps: u32,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub category: Option<String>,
    /// Purchase that brought the unit in; `None` for manual entries.
    pub purchase_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockUnit {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Returns the GST rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.gst_rate_bps)
    }

    /// Builds a new stock unit for `user_id` from a vehicle spec.
    pub fn from_spec(
        user_id: &str,
        vehicle: &VehicleSpec,
        purchase_date: NaiveDate,
        purchase_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        StockUnit {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            chassis_no: vehicle.chassis_no.clone(),
            engine_no: vehicle.engine_no.clone(),
            model: vehicle.model.clone(),
            colour: vehicle.colour.clone(),
            price_paise: vehicle.price_paise,
            hsn_code: vehicle.hsn_code.clone(),
            gst_rate_bps: vehicle.gst_rate_bps,
            purchase_date,
            category: vehicle.category.clone(),
            purchase_id,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Sales Invoice
// =============================================================================

/// A sales tax invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    /// Formatted number, e.g. "INV/2024-25/0007".
    pub invoice_number: String,
    /// Sequence part of the number.
    pub sequence: i64,
    /// Financial year label, e.g. "2024-25".
    pub financial_year: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_gstin: Option<String>,
    pub supply_kind: SupplyKind,
    pub taxable_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub igst_paise: i64,
    pub total_paise: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

/// A vehicle sold on an invoice.
///
/// Snapshot pattern: every stock attribute is frozen here, so deleting or
/// editing the invoice restores the unit exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub user_id: String,
    /// Id the unit had in stock; reused on restore.
    pub stock_unit_id: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub model: String,
    pub colour: String,
    /// Stock (purchase) price, frozen.
    pub price_paise: i64,
    pub hsn_code: String,
    pub gst_rate_bps: u32,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub category: Option<String>,
    pub purchase_id: Option<String>,
    /// When the unit first entered stock.
    #[ts(as = "String")]
    pub stocked_at: DateTime<Utc>,
    /// Taxable selling price in paise.
    pub sale_price_paise: i64,
    pub tax_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Captures a stock unit onto an invoice.
    pub fn from_stock(
        invoice_id: &str,
        unit: &StockUnit,
        sale_price: Money,
        tax: Money,
        now: DateTime<Utc>,
    ) -> Self {
        InvoiceItem {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            user_id: unit.user_id.clone(),
            stock_unit_id: unit.id.clone(),
            chassis_no: unit.chassis_no.clone(),
            engine_no: unit.engine_no.clone(),
            model: unit.model.clone(),
            colour: unit.colour.clone(),
            price_paise: unit.price_paise,
            hsn_code: unit.hsn_code.clone(),
            gst_rate_bps: unit.gst_rate_bps,
            purchase_date: unit.purchase_date,
            category: unit.category.clone(),
            purchase_id: unit.purchase_id.clone(),
            stocked_at: unit.created_at,
            sale_price_paise: sale_price.paise(),
            tax_paise: tax.paise(),
            created_at: now,
        }
    }

    /// Rebuilds the stock unit this item was taken from.
    pub fn to_stock_unit(&self, now: DateTime<Utc>) -> StockUnit {
        StockUnit {
            id: self.stock_unit_id.clone(),
            user_id: self.user_id.clone(),
            chassis_no: self.chassis_no.clone(),
            engine_no: self.engine_no.clone(),
            model: self.model.clone(),
            colour: self.colour.clone(),
            price_paise: self.price_paise,
            hsn_code: self.hsn_code.clone(),
            gst_rate_bps: self.gst_rate_bps,
            purchase_date: self.purchase_date,
            category: self.category.clone(),
            purchase_id: self.purchase_id.clone(),
            created_at: self.stocked_at,
            updated_at: now,
        }
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_paise(self.sale_price_paise)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.gst_rate_bps)
    }
}

/// One line of an invoice request: which vehicle, and optionally at what
/// price. Without a price the stock price is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLine {
    pub chassis_no: String,
    pub sale_price_paise: Option<i64>,
}

/// Invoice as submitted by the frontend for create or update.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceDraft {
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_gstin: Option<String>,
    #[serde(default)]
    pub supply_kind: SupplyKind,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<InvoiceLine>,
}

/// Invoice header together with its vehicles.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceWithItems {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase entry header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    /// Formatted number, e.g. "PUR/2024-25/0002".
    pub purchase_number: String,
    pub sequence: i64,
    pub financial_year: String,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub supplier_name: String,
    pub supplier_gstin: Option<String>,
    /// The supplier's own bill number.
    pub supplier_bill_no: Option<String>,
    pub supply_kind: SupplyKind,
    pub taxable_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub igst_paise: i64,
    pub total_paise: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A vehicle received on a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub user_id: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub model: String,
    pub colour: String,
    pub price_paise: i64,
    pub hsn_code: String,
    pub gst_rate_bps: u32,
    pub category: Option<String>,
    pub tax_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseItem {
    pub fn from_spec(
        purchase_id: &str,
        user_id: &str,
        vehicle: &VehicleSpec,
        tax: Money,
        now: DateTime<Utc>,
    ) -> Self {
        PurchaseItem {
            id: uuid::Uuid::new_v4().to_string(),
            purchase_id: purchase_id.to_string(),
            user_id: user_id.to_string(),
            chassis_no: vehicle.chassis_no.clone(),
            engine_no: vehicle.engine_no.clone(),
            model: vehicle.model.clone(),
            colour: vehicle.colour.clone(),
            price_paise: vehicle.price_paise,
            hsn_code: vehicle.hsn_code.clone(),
            gst_rate_bps: vehicle.gst_rate_bps,
            category: vehicle.category.clone(),
            tax_paise: tax.paise(),
            created_at: now,
        }
    }
}

/// Purchase as submitted by the frontend for create or update.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseDraft {
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub supplier_name: String,
    #[serde(default)]
    pub supplier_gstin: Option<String>,
    #[serde(default)]
    pub supplier_bill_no: Option<String>,
    #[serde(default)]
    pub supply_kind: SupplyKind,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<VehicleSpec>,
}

/// Purchase header together with its vehicles.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseWithItems {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

// =============================================================================
// Numbering
// =============================================================================

/// A number shown on a form before the document is saved.
///
/// Advisory only: the saved document gets whatever number is committed at
/// save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NumberPreview {
    pub doc_type: DocumentType,
    pub financial_year: String,
    pub sequence: i64,
    pub number: String,
}

// =============================================================================
// Reports
// =============================================================================

/// Stock on hand for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockSummaryRow {
    pub model: String,
    pub units: i64,
    pub value_paise: i64,
}

/// Sales totals for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesSummary {
    pub financial_year: String,
    pub invoices: i64,
    pub vehicles: i64,
    pub taxable_paise: i64,
    pub tax_paise: i64,
    pub total_paise: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unit() -> StockUnit {
        let vehicle = VehicleSpec {
            chassis_no: "MA3ERLF1S00123456".to_string(),
            engine_no: "K12MN1234567".to_string(),
            model: "Swift VXI".to_string(),
            colour: "Pearl White".to_string(),
            price_paise: 6_250_000_00,
            hsn_code: "87032291".to_string(),
            gst_rate_bps: 2800,
            category: Some("car".to_string()),
        };
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        StockUnit::from_spec("user-1", &vehicle, date, Some("p-1".to_string()), Utc::now())
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(2800);
        assert_eq!(rate.bps(), 2800);
        assert!((rate.percentage() - 28.0).abs() < 0.001);
        assert_eq!(TaxRate::from_percentage(5.0).bps(), 500);
    }

    #[test]
    fn test_document_type_prefix_and_wire_name() {
        assert_eq!(DocumentType::SalesInvoice.prefix(), "INV/");
        assert_eq!(DocumentType::Purchase.prefix(), "PUR/");
        assert_eq!(
            serde_json::to_string(&DocumentType::SalesInvoice).unwrap(),
            "\"sales_invoice\""
        );
        assert_eq!(DocumentType::Purchase.to_string(), "purchase");
    }

    #[test]
    fn test_supply_kind_default() {
        assert_eq!(SupplyKind::default(), SupplyKind::IntraState);
    }

    #[test]
    fn test_invoice_item_restores_original_unit() {
        let unit = sample_unit();
        let item = InvoiceItem::from_stock(
            "inv-1",
            &unit,
            Money::from_rupees(6_400_000),
            Money::zero(),
            Utc::now(),
        );

        let restored = item.to_stock_unit(Utc::now());
        assert_eq!(restored.id, unit.id);
        assert_eq!(restored.chassis_no, unit.chassis_no);
        assert_eq!(restored.model, unit.model);
        assert_eq!(restored.colour, unit.colour);
        assert_eq!(restored.price_paise, unit.price_paise);
        assert_eq!(restored.purchase_id, unit.purchase_id);
        assert_eq!(restored.created_at, unit.created_at);
    }

    #[test]
    fn test_stock_entry_flattens_vehicle() {
        let json = r#"{
            "chassis_no": "CH1", "engine_no": "EN1", "model": "Activa",
            "colour": "Red", "price_paise": 7500000, "hsn_code": "87112019",
            "gst_rate_bps": 2800, "category": null, "purchase_date": "2024-06-01"
        }"#;
        let entry: StockEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.vehicle.chassis_no, "CH1");
        assert_eq!(entry.purchase_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }
}
