//! # Validation Module
//!
//! Input validation for Dealer Books.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Required fields, input masks                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler → Coordinator (Rust)                             │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules + normalization of drafts                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(user_id, chassis_no) on stock and invoice items            │
//! │  └── UNIQUE(user_id, financial_year, number) on documents              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Draft validators return a normalized copy: text trimmed, blank optional
//! fields turned into `None`, chassis/engine/GSTIN upper-cased. Everything
//! downstream works on the normalized copy only.
//!
//! ## Usage
//! ```rust
//! use dealer_core::validation::{validate_chassis_no, validate_hsn_code};
//!
//! assert_eq!(validate_chassis_no(" ma3erlf1s00123456 ").unwrap(), "MA3ERLF1S00123456");
//! assert!(validate_hsn_code("8711").is_ok());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::reconcile::{find_duplicate, normalize_identifier};
use crate::types::{InvoiceDraft, InvoiceLine, PurchaseDraft, StockEntry, VehicleSpec};
use crate::MAX_DOCUMENT_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a chassis number and returns it normalized.
///
/// ## Rules
/// - Must not be empty
/// - 5 to 25 characters (a VIN is 17, older frames are shorter)
/// - Letters, digits and hyphens only
pub fn validate_chassis_no(raw: &str) -> ValidationResult<String> {
    validate_identifier("chassis_no", raw, 5, 25)
}

/// Validates an engine number and returns it normalized.
pub fn validate_engine_no(raw: &str) -> ValidationResult<String> {
    validate_identifier("engine_no", raw, 3, 25)
}

fn validate_identifier(field: &str, raw: &str, min: usize, max: usize) -> ValidationResult<String> {
    let value = normalize_identifier(raw);

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.len() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(value)
}

/// Validates a GSTIN and returns it upper-cased.
///
/// ## Rules
/// - Exactly 15 characters
/// - Two digit state code, then the 10 character PAN, entity code, `Z`,
///   check character
///
/// ## Example
/// ```rust
/// use dealer_core::validation::validate_gstin;
///
/// assert!(validate_gstin("27aapfu0939f1zv").is_ok());
/// assert!(validate_gstin("27AAPFU0939F1Z").is_err());
/// ```
pub fn validate_gstin(raw: &str) -> ValidationResult<String> {
    let gstin = raw.trim().to_uppercase();
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "gstin".to_string(),
        reason: reason.to_string(),
    };

    if gstin.len() != 15 || !gstin.is_ascii() {
        return Err(invalid("must be 15 characters"));
    }

    let bytes = gstin.as_bytes();
    let state_ok = bytes[..2].iter().all(u8::is_ascii_digit);
    let pan_ok = bytes[2..7].iter().all(u8::is_ascii_uppercase)
        && bytes[7..11].iter().all(u8::is_ascii_digit)
        && bytes[11].is_ascii_uppercase();
    let tail_ok = bytes[12].is_ascii_alphanumeric()
        && bytes[13] == b'Z'
        && bytes[14].is_ascii_alphanumeric();

    if !state_ok {
        return Err(invalid("must start with a two digit state code"));
    }
    if !(pan_ok && tail_ok) {
        return Err(invalid("does not follow the GSTIN layout"));
    }

    Ok(gstin)
}

/// Validates an HSN code: 4, 6 or 8 digits.
pub fn validate_hsn_code(raw: &str) -> ValidationResult<String> {
    let hsn = raw.trim();

    if hsn.is_empty() {
        return Err(ValidationError::Required {
            field: "hsn_code".to_string(),
        });
    }
    if !matches!(hsn.len(), 4 | 6 | 8) || !hsn.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "hsn_code".to_string(),
            reason: "must be 4, 6 or 8 digits".to_string(),
        });
    }

    Ok(hsn.to_string())
}

/// Validates a phone number and returns it without separators.
///
/// Spaces and hyphens are dropped, a leading `+` is kept, 10 to 15 digits.
pub fn validate_phone(raw: &str) -> ValidationResult<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }
    if !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 10,
            max: 15,
        });
    }

    Ok(compact)
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use dealer_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates a required free-text field (model, colour, party names).
pub fn validate_text(field: &str, raw: &str, max: usize) -> ValidationResult<String> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional free-text field. Blank becomes `None`.
pub fn validate_optional_text(
    field: &str,
    raw: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => validate_text(field, value, max).map(Some),
    }
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in paise. Vehicles are never free.
pub fn validate_price_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a GST rate in basis points (0% to 100%).
pub fn validate_gst_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Validates the number of vehicles on a document.
///
/// ## Rules
/// - At least one vehicle (`EmptyDocument`)
/// - At most MAX_DOCUMENT_ITEMS
pub fn validate_item_count(document: &str, count: usize) -> CoreResult<()> {
    if count == 0 {
        return Err(CoreError::EmptyDocument {
            document: document.to_string(),
        });
    }
    if count > MAX_DOCUMENT_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: format!("{document} items"),
            min: 1,
            max: MAX_DOCUMENT_ITEMS as i64,
        }
        .into());
    }

    Ok(())
}

/// Validates a vehicle as entered on a purchase or manual stock entry.
pub fn validate_vehicle(vehicle: &VehicleSpec) -> ValidationResult<VehicleSpec> {
    validate_price_paise("price", vehicle.price_paise)?;
    validate_gst_rate_bps(vehicle.gst_rate_bps)?;

    Ok(VehicleSpec {
        chassis_no: validate_chassis_no(&vehicle.chassis_no)?,
        engine_no: validate_engine_no(&vehicle.engine_no)?,
        model: validate_text("model", &vehicle.model, 100)?,
        colour: validate_text("colour", &vehicle.colour, 50)?,
        price_paise: vehicle.price_paise,
        hsn_code: validate_hsn_code(&vehicle.hsn_code)?,
        gst_rate_bps: vehicle.gst_rate_bps,
        category: validate_optional_text("category", vehicle.category.as_deref(), 50)?,
    })
}

/// Validates a manual stock entry.
pub fn validate_stock_entry(entry: &StockEntry) -> ValidationResult<StockEntry> {
    Ok(StockEntry {
        vehicle: validate_vehicle(&entry.vehicle)?,
        purchase_date: entry.purchase_date,
    })
}

/// Validates an invoice draft and returns the normalized copy.
///
/// ## Flow
/// ```text
/// InvoiceDraft ──► item count (1..=50) ──► each line: chassis, price
///                                               │
///                  customer, GSTIN, phone ◄─────┘
///                          │
///                          ▼
///                  duplicate chassis? ──► ValidationError::Duplicate
/// ```
pub fn validate_invoice_draft(draft: &InvoiceDraft) -> CoreResult<InvoiceDraft> {
    validate_item_count("Invoice", draft.items.len())?;

    let items = draft
        .items
        .iter()
        .map(|line| -> ValidationResult<InvoiceLine> {
            if let Some(price) = line.sale_price_paise {
                validate_price_paise("sale_price", price)?;
            }
            Ok(InvoiceLine {
                chassis_no: validate_chassis_no(&line.chassis_no)?,
                sale_price_paise: line.sale_price_paise,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    if let Some(dup) = find_duplicate(items.iter().map(|l| l.chassis_no.as_str())) {
        return Err(ValidationError::Duplicate {
            field: "chassis_no".to_string(),
            value: dup,
        }
        .into());
    }

    Ok(InvoiceDraft {
        invoice_date: draft.invoice_date,
        customer_name: validate_text("customer_name", &draft.customer_name, 200)?,
        customer_address: validate_optional_text(
            "customer_address",
            draft.customer_address.as_deref(),
            500,
        )?,
        customer_phone: optional(draft.customer_phone.as_deref(), validate_phone)?,
        customer_gstin: optional(draft.customer_gstin.as_deref(), validate_gstin)?,
        supply_kind: draft.supply_kind,
        notes: validate_optional_text("notes", draft.notes.as_deref(), 1000)?,
        items,
    })
}

/// Validates a purchase draft and returns the normalized copy.
///
/// Chassis and engine numbers must each be unique within the purchase.
pub fn validate_purchase_draft(draft: &PurchaseDraft) -> CoreResult<PurchaseDraft> {
    validate_item_count("Purchase", draft.items.len())?;

    let items = draft
        .items
        .iter()
        .map(validate_vehicle)
        .collect::<ValidationResult<Vec<_>>>()?;

    if let Some(dup) = find_duplicate(items.iter().map(|v| v.chassis_no.as_str())) {
        return Err(ValidationError::Duplicate {
            field: "chassis_no".to_string(),
            value: dup,
        }
        .into());
    }
    if let Some(dup) = find_duplicate(items.iter().map(|v| v.engine_no.as_str())) {
        return Err(ValidationError::Duplicate {
            field: "engine_no".to_string(),
            value: dup,
        }
        .into());
    }

    Ok(PurchaseDraft {
        purchase_date: draft.purchase_date,
        supplier_name: validate_text("supplier_name", &draft.supplier_name, 200)?,
        supplier_gstin: optional(draft.supplier_gstin.as_deref(), validate_gstin)?,
        supplier_bill_no: validate_optional_text(
            "supplier_bill_no",
            draft.supplier_bill_no.as_deref(),
            50,
        )?,
        supply_kind: draft.supply_kind,
        notes: validate_optional_text("notes", draft.notes.as_deref(), 1000)?,
        items,
    })
}

/// Applies `validate` to a non-blank optional value.
fn optional<F>(raw: Option<&str>, validate: F) -> ValidationResult<Option<String>>
where
    F: Fn(&str) -> ValidationResult<String>,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => validate(value).map(Some),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SupplyKind;
    use chrono::NaiveDate;

    fn vehicle(chassis: &str, engine: &str) -> VehicleSpec {
        VehicleSpec {
            chassis_no: chassis.to_string(),
            engine_no: engine.to_string(),
            model: " Activa 6G ".to_string(),
            colour: "Matte Grey".to_string(),
            price_paise: 7_200_000,
            hsn_code: "87112019".to_string(),
            gst_rate_bps: 2800,
            category: Some("   ".to_string()),
        }
    }

    fn invoice_draft(chassis: &[&str]) -> InvoiceDraft {
        InvoiceDraft {
            invoice_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            customer_name: "  Ravi Kumar ".to_string(),
            customer_address: None,
            customer_phone: Some("98450 12345".to_string()),
            customer_gstin: Some("".to_string()),
            supply_kind: SupplyKind::IntraState,
            notes: None,
            items: chassis
                .iter()
                .map(|c| InvoiceLine {
                    chassis_no: c.to_string(),
                    sale_price_paise: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_chassis_no() {
        assert_eq!(validate_chassis_no("me4jf504").unwrap(), "ME4JF504");
        assert!(validate_chassis_no("").is_err());
        assert!(validate_chassis_no("AB1").is_err());
        assert!(validate_chassis_no("ME4 JF504").is_err());
        assert!(validate_chassis_no(&"A".repeat(26)).is_err());
    }

    #[test]
    fn test_validate_gstin() {
        assert_eq!(validate_gstin("29abcde1234f1z5").unwrap(), "29ABCDE1234F1Z5");
        assert!(validate_gstin("XXABCDE1234F1Z5").is_err());
        assert!(validate_gstin("29ABCDE1234F1Y5").is_err());
        assert!(validate_gstin("29ABCDE1234F1Z").is_err());
    }

    #[test]
    fn test_validate_hsn_code() {
        assert!(validate_hsn_code("8711").is_ok());
        assert!(validate_hsn_code("871120").is_ok());
        assert!(validate_hsn_code("87112019").is_ok());
        assert!(validate_hsn_code("87112").is_err());
        assert!(validate_hsn_code("87AB").is_err());
        assert!(validate_hsn_code("").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("98450-12345").unwrap(), "9845012345");
        assert_eq!(validate_phone("+91 98450 12345").unwrap(), "+919845012345");
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98450abcde").is_err());
    }

    #[test]
    fn test_validate_price_and_rate() {
        assert!(validate_price_paise("price", 1).is_ok());
        assert!(validate_price_paise("price", 0).is_err());
        assert!(validate_gst_rate_bps(2800).is_ok());
        assert!(validate_gst_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_vehicle_is_normalized() {
        let v = validate_vehicle(&vehicle(" ma3erl01 ", "k12mn01")).unwrap();
        assert_eq!(v.chassis_no, "MA3ERL01");
        assert_eq!(v.engine_no, "K12MN01");
        assert_eq!(v.model, "Activa 6G");
        assert_eq!(v.category, None);
    }

    #[test]
    fn test_invoice_draft_normalized() {
        let draft = validate_invoice_draft(&invoice_draft(&["ma3erl01", "MA3ERL02"])).unwrap();
        assert_eq!(draft.customer_name, "Ravi Kumar");
        assert_eq!(draft.customer_phone.as_deref(), Some("9845012345"));
        assert_eq!(draft.customer_gstin, None);
        assert_eq!(draft.items[0].chassis_no, "MA3ERL01");
    }

    #[test]
    fn test_invoice_draft_rejects_empty() {
        let err = validate_invoice_draft(&invoice_draft(&[])).unwrap_err();
        assert!(matches!(err, CoreError::EmptyDocument { .. }));
    }

    #[test]
    fn test_invoice_draft_rejects_duplicate_chassis() {
        let err = validate_invoice_draft(&invoice_draft(&["MA3ERL01", "ma3erl01"])).unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::Duplicate {
                field: "chassis_no".to_string(),
                value: "MA3ERL01".to_string(),
            })
        );
    }

    #[test]
    fn test_invoice_draft_rejects_zero_sale_price() {
        let mut draft = invoice_draft(&["MA3ERL01"]);
        draft.items[0].sale_price_paise = Some(0);
        assert!(validate_invoice_draft(&draft).is_err());
    }

    #[test]
    fn test_purchase_draft_rejects_duplicate_engine() {
        let draft = PurchaseDraft {
            purchase_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            supplier_name: "Honda Motorcycle & Scooter India".to_string(),
            supplier_gstin: None,
            supplier_bill_no: Some("HM/778".to_string()),
            supply_kind: SupplyKind::InterState,
            notes: None,
            items: vec![vehicle("MA3ERL01", "ENG01"), vehicle("MA3ERL02", "eng01")],
        };
        let err = validate_purchase_draft(&draft).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { ref field, .. }) if field == "engine_no"
        ));
    }

    #[test]
    fn test_item_count_limit() {
        assert!(validate_item_count("Invoice", 1).is_ok());
        assert!(validate_item_count("Invoice", MAX_DOCUMENT_ITEMS).is_ok());
        assert!(validate_item_count("Invoice", MAX_DOCUMENT_ITEMS + 1).is_err());
    }
}
