//! # Transaction Coordinator
//!
//! Saves, edits and deletes invoices and purchases together with the stock
//! movements and counter increments they imply, each as one SQLite
//! transaction.
//!
//! ## Invoice Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceDraft                                                           │
//! │     │ validate_invoice_draft (non-empty, no duplicate chassis)         │
//! │     ▼                                                                   │
//! │  FinancialYear::containing(invoice_date)                               │
//! │     │                                                                   │
//! │     ▼            ┌──────────────── one transaction ────────────────┐   │
//! │  BEGIN IMMEDIATE►│ reserve each chassis (stock → snapshot)         │   │
//! │                  │ commit counter (last_sequence + 1)              │   │
//! │                  │ insert invoice header + items                   │   │
//! │                  └──────────────────────────────┬──────────────────┘   │
//! │                                                 ▼                       │
//! │                               COMMIT, or ROLLBACK on any error         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edits
//! ```text
//!   saved {A, B}  ──diff──  edited {A, C}
//!
//!   invoice:   B released to stock, C reserved, A keeps its snapshot
//!   purchase:  B withdrawn (refused if sold), C received, A updated
//! ```
//!
//! A rejected step returns early; dropping the transaction rolls back every
//! stock movement and the counter increment made before it.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::counter::CounterRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::stock::StockRepository;
use dealer_core::billing::{line_tax, DocumentTotals};
use dealer_core::reconcile::diff_chassis;
use dealer_core::validation::{validate_invoice_draft, validate_purchase_draft, validate_stock_entry};
use dealer_core::{
    CoreError, DocumentType, Invoice, InvoiceDraft, InvoiceItem, InvoiceLine, InvoiceWithItems,
    Money, NumberPreview, NumberingPolicy, Purchase, PurchaseDraft, PurchaseItem,
    PurchaseWithItems, StockEntry, StockUnit, SupplyKind, TaxRate,
};

/// Runs every multi-step write of the application.
#[derive(Debug, Clone)]
pub struct Coordinator {
    pool: SqlitePool,
    policy: NumberingPolicy,
}

impl Coordinator {
    pub fn new(pool: SqlitePool, policy: NumberingPolicy) -> Self {
        Coordinator { pool, policy }
    }

    pub fn policy(&self) -> NumberingPolicy {
        self.policy
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Number the next document of `doc_type` dated `date` would get.
    ///
    /// Read only. The number is advisory: the saved document gets whatever
    /// sequence is committed at save time.
    pub async fn preview_number(
        &self,
        user_id: &str,
        doc_type: DocumentType,
        date: NaiveDate,
    ) -> DbResult<NumberPreview> {
        let fy = self.policy.financial_year(date)?.label();
        let last = CounterRepository::new(self.pool.clone())
            .last_sequence(user_id, doc_type, &fy)
            .await?;

        Ok(self.policy.preview(doc_type, &fy, last))
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Enters a vehicle into stock without a purchase document.
    pub async fn add_stock_unit(&self, user_id: &str, entry: &StockEntry) -> DbResult<StockUnit> {
        let result = self.add_stock_unit_tx(user_id, entry).await;
        log_outcome("add_stock_unit", user_id, result)
    }

    async fn add_stock_unit_tx(&self, user_id: &str, entry: &StockEntry) -> DbResult<StockUnit> {
        let entry = validate_stock_entry(entry)?;
        let unit = StockUnit::from_spec(user_id, &entry.vehicle, entry.purchase_date, None, Utc::now());

        let mut tx = begin_write(&self.pool).await?;
        StockRepository::receive(&mut *tx, &unit).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(user_id = %user_id, chassis_no = %unit.chassis_no, "Stock unit added");
        Ok(unit)
    }

    // =========================================================================
    // Sales Invoices
    // =========================================================================

    /// Saves a new invoice, taking its vehicles out of stock.
    pub async fn save_invoice(
        &self,
        user_id: &str,
        draft: &InvoiceDraft,
    ) -> DbResult<InvoiceWithItems> {
        let result = self.save_invoice_tx(user_id, draft).await;
        log_outcome("save_invoice", user_id, result)
    }

    async fn save_invoice_tx(
        &self,
        user_id: &str,
        draft: &InvoiceDraft,
    ) -> DbResult<InvoiceWithItems> {
        let draft = validate_invoice_draft(draft)?;
        let fy = self.policy.financial_year(draft.invoice_date)?.label();
        let now = Utc::now();
        let invoice_id = Uuid::new_v4().to_string();

        let mut tx = begin_write(&self.pool).await?;

        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let unit = StockRepository::reserve(&mut *tx, user_id, &line.chassis_no).await?;
            items.push(sell(&invoice_id, &unit, line, now));
        }

        let sequence =
            CounterRepository::commit(&mut *tx, user_id, DocumentType::SalesInvoice, &fy).await?;
        let totals = invoice_totals(&items, draft.supply_kind);

        let invoice = Invoice {
            id: invoice_id,
            user_id: user_id.to_string(),
            invoice_number: self.policy.format(DocumentType::SalesInvoice, &fy, sequence),
            sequence,
            financial_year: fy,
            invoice_date: draft.invoice_date,
            customer_name: draft.customer_name,
            customer_address: draft.customer_address,
            customer_phone: draft.customer_phone,
            customer_gstin: draft.customer_gstin,
            supply_kind: draft.supply_kind,
            taxable_paise: totals.taxable.paise(),
            cgst_paise: totals.cgst.paise(),
            sgst_paise: totals.sgst.paise(),
            igst_paise: totals.igst.paise(),
            total_paise: totals.total.paise(),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        InvoiceRepository::insert(&mut *tx, &invoice).await?;
        for item in &items {
            InvoiceRepository::insert_item(&mut *tx, item).await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            invoice_number = %invoice.invoice_number,
            vehicles = items.len(),
            total = %totals.total,
            "Invoice saved"
        );

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Edits an invoice: vehicles dropped from it go back to stock, new
    /// vehicles come out of stock, kept vehicles only change price.
    pub async fn update_invoice(
        &self,
        user_id: &str,
        invoice_id: &str,
        draft: &InvoiceDraft,
    ) -> DbResult<InvoiceWithItems> {
        let result = self.update_invoice_tx(user_id, invoice_id, draft).await;
        log_outcome("update_invoice", user_id, result)
    }

    async fn update_invoice_tx(
        &self,
        user_id: &str,
        invoice_id: &str,
        draft: &InvoiceDraft,
    ) -> DbResult<InvoiceWithItems> {
        let draft = validate_invoice_draft(draft)?;
        let fy = self.policy.financial_year(draft.invoice_date)?.label();
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        let mut invoice = InvoiceRepository::find(&mut *tx, user_id, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

        if fy != invoice.financial_year {
            return Err(CoreError::FinancialYearChanged {
                number: invoice.invoice_number,
                current: invoice.financial_year,
                requested: fy,
            }
            .into());
        }

        let existing = InvoiceRepository::items(&mut *tx, &invoice.id).await?;
        let diff = diff_chassis(
            existing.iter().map(|i| i.chassis_no.as_str()),
            draft.items.iter().map(|l| l.chassis_no.as_str()),
        );

        let existing_by_chassis: HashMap<&str, &InvoiceItem> =
            existing.iter().map(|i| (i.chassis_no.as_str(), i)).collect();
        let lines_by_chassis: HashMap<&str, &InvoiceLine> =
            draft.items.iter().map(|l| (l.chassis_no.as_str(), l)).collect();

        for chassis in &diff.removed {
            if let Some(item) = existing_by_chassis.get(chassis.as_str()) {
                InvoiceRepository::delete_item(&mut *tx, &item.id).await?;
                StockRepository::release(&mut *tx, &item.to_stock_unit(now)).await?;
            }
        }

        for chassis in &diff.kept {
            let (Some(item), Some(line)) = (
                existing_by_chassis.get(chassis.as_str()),
                lines_by_chassis.get(chassis.as_str()),
            ) else {
                continue;
            };
            let sale_price = line
                .sale_price_paise
                .map(Money::from_paise)
                .unwrap_or_else(|| Money::from_paise(item.price_paise));
            let tax = line_tax(sale_price, item.tax_rate());
            if sale_price.paise() != item.sale_price_paise || tax.paise() != item.tax_paise {
                InvoiceRepository::update_item_price(&mut *tx, &item.id, sale_price.paise(), tax.paise())
                    .await?;
            }
        }

        for chassis in &diff.added {
            let Some(line) = lines_by_chassis.get(chassis.as_str()) else {
                continue;
            };
            let unit = StockRepository::reserve(&mut *tx, user_id, chassis).await?;
            InvoiceRepository::insert_item(&mut *tx, &sell(&invoice.id, &unit, line, now)).await?;
        }

        let items = InvoiceRepository::items(&mut *tx, &invoice.id).await?;
        let totals = invoice_totals(&items, draft.supply_kind);

        invoice.invoice_date = draft.invoice_date;
        invoice.customer_name = draft.customer_name;
        invoice.customer_address = draft.customer_address;
        invoice.customer_phone = draft.customer_phone;
        invoice.customer_gstin = draft.customer_gstin;
        invoice.supply_kind = draft.supply_kind;
        invoice.notes = draft.notes;
        invoice.taxable_paise = totals.taxable.paise();
        invoice.cgst_paise = totals.cgst.paise();
        invoice.sgst_paise = totals.sgst.paise();
        invoice.igst_paise = totals.igst.paise();
        invoice.total_paise = totals.total.paise();
        invoice.updated_at = now;

        InvoiceRepository::update_header(&mut *tx, &invoice).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            invoice_number = %invoice.invoice_number,
            released = diff.removed.len(),
            reserved = diff.added.len(),
            kept = diff.kept.len(),
            "Invoice updated"
        );

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Deletes an invoice and puts all its vehicles back in stock.
    ///
    /// The counter is left alone, so the number is never issued again.
    pub async fn delete_invoice(&self, user_id: &str, invoice_id: &str) -> DbResult<()> {
        let result = self.delete_invoice_tx(user_id, invoice_id).await;
        log_outcome("delete_invoice", user_id, result)
    }

    async fn delete_invoice_tx(&self, user_id: &str, invoice_id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        let invoice = InvoiceRepository::find(&mut *tx, user_id, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;
        let items = InvoiceRepository::items(&mut *tx, &invoice.id).await?;

        InvoiceRepository::delete(&mut *tx, user_id, &invoice.id).await?;
        for item in &items {
            StockRepository::release(&mut *tx, &item.to_stock_unit(now)).await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            invoice_number = %invoice.invoice_number,
            released = items.len(),
            "Invoice deleted"
        );
        Ok(())
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Saves a new purchase, bringing its vehicles into stock.
    pub async fn save_purchase(
        &self,
        user_id: &str,
        draft: &PurchaseDraft,
    ) -> DbResult<PurchaseWithItems> {
        let result = self.save_purchase_tx(user_id, draft).await;
        log_outcome("save_purchase", user_id, result)
    }

    async fn save_purchase_tx(
        &self,
        user_id: &str,
        draft: &PurchaseDraft,
    ) -> DbResult<PurchaseWithItems> {
        let draft = validate_purchase_draft(draft)?;
        let fy = self.policy.financial_year(draft.purchase_date)?.label();
        let now = Utc::now();
        let purchase_id = Uuid::new_v4().to_string();

        let items: Vec<PurchaseItem> = draft
            .items
            .iter()
            .map(|v| PurchaseItem::from_spec(&purchase_id, user_id, v, line_tax(v.price(), v.tax_rate()), now))
            .collect();
        let totals = purchase_totals(&items, draft.supply_kind);

        let mut tx = begin_write(&self.pool).await?;

        let sequence =
            CounterRepository::commit(&mut *tx, user_id, DocumentType::Purchase, &fy).await?;

        let purchase = Purchase {
            id: purchase_id.clone(),
            user_id: user_id.to_string(),
            purchase_number: self.policy.format(DocumentType::Purchase, &fy, sequence),
            sequence,
            financial_year: fy,
            purchase_date: draft.purchase_date,
            supplier_name: draft.supplier_name,
            supplier_gstin: draft.supplier_gstin,
            supplier_bill_no: draft.supplier_bill_no,
            supply_kind: draft.supply_kind,
            taxable_paise: totals.taxable.paise(),
            cgst_paise: totals.cgst.paise(),
            sgst_paise: totals.sgst.paise(),
            igst_paise: totals.igst.paise(),
            total_paise: totals.total.paise(),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        PurchaseRepository::insert(&mut *tx, &purchase).await?;
        for (vehicle, item) in draft.items.iter().zip(&items) {
            let unit = StockUnit::from_spec(
                user_id,
                vehicle,
                draft.purchase_date,
                Some(purchase_id.clone()),
                now,
            );
            StockRepository::receive(&mut *tx, &unit).await?;
            PurchaseRepository::insert_item(&mut *tx, item).await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            purchase_number = %purchase.purchase_number,
            vehicles = items.len(),
            "Purchase saved"
        );

        Ok(PurchaseWithItems { purchase, items })
    }

    /// Edits a purchase: dropped vehicles leave stock (refused if sold), new
    /// vehicles enter stock, kept vehicles get their attributes rewritten.
    pub async fn update_purchase(
        &self,
        user_id: &str,
        purchase_id: &str,
        draft: &PurchaseDraft,
    ) -> DbResult<PurchaseWithItems> {
        let result = self.update_purchase_tx(user_id, purchase_id, draft).await;
        log_outcome("update_purchase", user_id, result)
    }

    async fn update_purchase_tx(
        &self,
        user_id: &str,
        purchase_id: &str,
        draft: &PurchaseDraft,
    ) -> DbResult<PurchaseWithItems> {
        let draft = validate_purchase_draft(draft)?;
        let fy = self.policy.financial_year(draft.purchase_date)?.label();
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        let mut purchase = PurchaseRepository::find(&mut *tx, user_id, purchase_id)
            .await?
            .ok_or_else(|| CoreError::PurchaseNotFound(purchase_id.to_string()))?;

        if fy != purchase.financial_year {
            return Err(CoreError::FinancialYearChanged {
                number: purchase.purchase_number,
                current: purchase.financial_year,
                requested: fy,
            }
            .into());
        }

        let existing = PurchaseRepository::items(&mut *tx, &purchase.id).await?;
        let diff = diff_chassis(
            existing.iter().map(|i| i.chassis_no.as_str()),
            draft.items.iter().map(|v| v.chassis_no.as_str()),
        );

        let mut sold = Vec::new();
        for chassis in &diff.removed {
            if StockRepository::sold_on(&mut *tx, user_id, chassis).await?.is_some() {
                sold.push(chassis.clone());
            }
        }
        if !sold.is_empty() {
            return Err(CoreError::PurchaseHasSoldUnits {
                purchase_number: purchase.purchase_number,
                chassis_numbers: sold,
            }
            .into());
        }

        let existing_by_chassis: HashMap<&str, &PurchaseItem> =
            existing.iter().map(|i| (i.chassis_no.as_str(), i)).collect();

        for chassis in &diff.removed {
            StockRepository::withdraw(&mut *tx, user_id, chassis).await?;
            if let Some(item) = existing_by_chassis.get(chassis.as_str()) {
                PurchaseRepository::delete_item(&mut *tx, &item.id).await?;
            }
        }

        // A sold vehicle's engine number is fixed by its invoice snapshot
        let mut renumbered = Vec::new();
        for vehicle in &draft.items {
            let Some(item) = existing_by_chassis.get(vehicle.chassis_no.as_str()) else {
                continue;
            };
            if item.engine_no == vehicle.engine_no {
                continue;
            }
            if let Some(invoice_number) = StockRepository::sold_on(&mut *tx, user_id, &vehicle.chassis_no).await? {
                return Err(CoreError::UnitAlreadySold {
                    chassis_no: vehicle.chassis_no.clone(),
                    invoice_number,
                }
                .into());
            }
            renumbered.push(vehicle.chassis_no.as_str());
        }

        if let Some(engine_no) = StockRepository::engine_conflict(&mut *tx, user_id, &draft.items).await? {
            return Err(CoreError::DuplicateUnit {
                field: "Engine number".to_string(),
                value: engine_no,
            }
            .into());
        }
        for chassis in &renumbered {
            StockRepository::park_engine_no(&mut *tx, user_id, chassis).await?;
        }

        for vehicle in &draft.items {
            let tax = line_tax(vehicle.price(), vehicle.tax_rate());
            match existing_by_chassis.get(vehicle.chassis_no.as_str()) {
                Some(item) => {
                    PurchaseRepository::update_item(&mut *tx, &item.id, vehicle, tax.paise()).await?;
                    StockRepository::update_attributes(&mut *tx, user_id, vehicle, draft.purchase_date)
                        .await?;
                }
                None => {
                    let unit = StockUnit::from_spec(
                        user_id,
                        vehicle,
                        draft.purchase_date,
                        Some(purchase.id.clone()),
                        now,
                    );
                    StockRepository::receive(&mut *tx, &unit).await?;
                    let item = PurchaseItem::from_spec(&purchase.id, user_id, vehicle, tax, now);
                    PurchaseRepository::insert_item(&mut *tx, &item).await?;
                }
            }
        }

        let items = PurchaseRepository::items(&mut *tx, &purchase.id).await?;
        let totals = purchase_totals(&items, draft.supply_kind);

        purchase.purchase_date = draft.purchase_date;
        purchase.supplier_name = draft.supplier_name;
        purchase.supplier_gstin = draft.supplier_gstin;
        purchase.supplier_bill_no = draft.supplier_bill_no;
        purchase.supply_kind = draft.supply_kind;
        purchase.notes = draft.notes;
        purchase.taxable_paise = totals.taxable.paise();
        purchase.cgst_paise = totals.cgst.paise();
        purchase.sgst_paise = totals.sgst.paise();
        purchase.igst_paise = totals.igst.paise();
        purchase.total_paise = totals.total.paise();
        purchase.updated_at = now;

        PurchaseRepository::update_header(&mut *tx, &purchase).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            purchase_number = %purchase.purchase_number,
            withdrawn = diff.removed.len(),
            received = diff.added.len(),
            kept = diff.kept.len(),
            "Purchase updated"
        );

        Ok(PurchaseWithItems { purchase, items })
    }

    /// Deletes a purchase and withdraws its vehicles from stock.
    ///
    /// Refused with `PurchaseHasSoldUnits` when any of them has been sold.
    pub async fn delete_purchase(&self, user_id: &str, purchase_id: &str) -> DbResult<()> {
        let result = self.delete_purchase_tx(user_id, purchase_id).await;
        log_outcome("delete_purchase", user_id, result)
    }

    async fn delete_purchase_tx(&self, user_id: &str, purchase_id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let purchase = PurchaseRepository::find(&mut *tx, user_id, purchase_id)
            .await?
            .ok_or_else(|| CoreError::PurchaseNotFound(purchase_id.to_string()))?;
        let items = PurchaseRepository::items(&mut *tx, &purchase.id).await?;

        let mut sold = Vec::new();
        for item in &items {
            if StockRepository::sold_on(&mut *tx, user_id, &item.chassis_no)
                .await?
                .is_some()
            {
                sold.push(item.chassis_no.clone());
            }
        }
        if !sold.is_empty() {
            return Err(CoreError::PurchaseHasSoldUnits {
                purchase_number: purchase.purchase_number,
                chassis_numbers: sold,
            }
            .into());
        }

        for item in &items {
            StockRepository::withdraw(&mut *tx, user_id, &item.chassis_no).await?;
        }
        PurchaseRepository::delete(&mut *tx, user_id, &purchase.id).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            user_id = %user_id,
            purchase_number = %purchase.purchase_number,
            withdrawn = items.len(),
            "Purchase deleted"
        );
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Builds the invoice line for a reserved unit. Without a price on the line
/// the unit's stock price is used.
fn sell(
    invoice_id: &str,
    unit: &StockUnit,
    line: &InvoiceLine,
    now: chrono::DateTime<Utc>,
) -> InvoiceItem {
    let sale_price = line
        .sale_price_paise
        .map(Money::from_paise)
        .unwrap_or_else(|| unit.price());
    let tax = line_tax(sale_price, unit.tax_rate());
    InvoiceItem::from_stock(invoice_id, unit, sale_price, tax, now)
}

fn invoice_totals(items: &[InvoiceItem], supply: SupplyKind) -> DocumentTotals {
    DocumentTotals::compute(items.iter().map(|i| (i.sale_price(), i.tax_rate())), supply)
}

fn purchase_totals(items: &[PurchaseItem], supply: SupplyKind) -> DocumentTotals {
    DocumentTotals::compute(
        items
            .iter()
            .map(|i| (Money::from_paise(i.price_paise), TaxRate::from_bps(i.gst_rate_bps))),
        supply,
    )
}

/// Business rejections log at warn, infrastructure failures at error.
fn log_outcome<T>(operation: &'static str, user_id: &str, result: DbResult<T>) -> DbResult<T> {
    if let Err(err) = &result {
        match err.as_domain() {
            Some(rejection) => {
                warn!(operation, user_id = %user_id, error = %rejection, "Operation rejected");
            }
            None => {
                error!(operation, user_id = %user_id, error = %err, "Operation failed");
            }
        }
    }
    result
}

// =============================================================================
// Unit Tests
// =============================================================================
