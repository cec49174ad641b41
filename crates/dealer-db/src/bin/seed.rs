//! # Seed Data Generator
//!
//! Fills a development database with purchases and a few sales so the
//! stock and invoice screens have something to show.
//!
//! ## Usage
//! ```bash
//! # 40 purchases for user "demo" (default)
//! cargo run -p dealer-db --bin seed
//!
//! # More purchases, another user
//! cargo run -p dealer-db --bin seed -- --purchases 200 --user dealer-2
//!
//! # Specify database path
//! cargo run -p dealer-db --bin seed -- --db ./data/dealer.db
//! ```
//!
//! Every document goes through the [`Coordinator`], so counters, stock and
//! totals come out exactly as they would from the app. Roughly one vehicle
//! in four is sold again on an invoice dated a few days after its purchase.

use std::env;

use chrono::{Duration, NaiveDate};
use dealer_core::{
    InvoiceDraft, InvoiceLine, NumberingPolicy, PurchaseDraft, SupplyKind, VehicleSpec,
};
use dealer_db::{Coordinator, Database, DbConfig};

/// (model, category, ex-showroom price in rupees)
const MODELS: &[(&str, &str, i64)] = &[
    ("Activa 6G", "scooter", 76_000),
    ("Activa 125", "scooter", 82_000),
    ("Dio", "scooter", 71_000),
    ("Shine 100", "motorcycle", 65_000),
    ("Shine 125", "motorcycle", 80_000),
    ("SP 125", "motorcycle", 87_000),
    ("Unicorn", "motorcycle", 1_10_000),
    ("Hornet 2.0", "motorcycle", 1_39_000),
];

const COLOURS: &[&str] = &["Pearl White", "Matte Grey", "Rebel Red", "Black", "Sports Blue"];

const SUPPLIERS: &[&str] = &["Honda Motorcycle & Scooter India", "Regional Distributor Pvt Ltd"];

const CUSTOMERS: &[&str] = &[
    "Ravi Kumar",
    "Anita Sharma",
    "Mohammed Irfan",
    "Priya Nair",
    "Suresh Patil",
    "Deepa Reddy",
];

/// Two-wheelers up to 350cc: HSN 8711, GST 28%.
const HSN_CODE: &str = "87112019";
const GST_RATE_BPS: u32 = 2800;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut purchases: usize = 40;
    let mut user_id = String::from("demo");
    let mut db_path = String::from("./data/dealer_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--purchases" | "-p" => {
                if i + 1 < args.len() {
                    purchases = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dealer Books Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --purchases <N>  Number of purchases to create (default: 40)");
                println!("  -u, --user <ID>      Owning user id (default: demo)");
                println!("  -d, --db <PATH>      Database file path (default: ./data/dealer_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Dealer Books Seed Data Generator");
    println!("================================");
    println!("Database:  {}", db_path);
    println!("User:      {}", user_id);
    println!("Purchases: {}", purchases);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.stock().count(&user_id).await?;
    if existing > 0 {
        println!("⚠ User {} already has {} vehicles in stock", user_id, existing);
        println!("  Skipping seed to avoid duplicate chassis numbers.");
        return Ok(());
    }

    let coordinator = db.coordinator(NumberingPolicy::default());
    let start = std::time::Instant::now();
    let first_day = NaiveDate::from_ymd_opt(2024, 4, 1).ok_or("invalid start date")?;

    let mut vehicles = 0;
    let mut sold = 0;

    for n in 0..purchases {
        let date = first_day + Duration::days((n * 3) as i64);
        let draft = purchase_draft(n, date);

        let saved = match coordinator.save_purchase(&user_id, &draft).await {
            Ok(saved) => saved,
            Err(e) => {
                eprintln!("Failed to save purchase {}: {}", n, e);
                continue;
            }
        };
        vehicles += saved.items.len();

        for (k, item) in saved.items.iter().enumerate() {
            if (n + k) % 4 != 0 {
                continue;
            }
            let invoice = invoice_draft(n + k, date + Duration::days(5), &item.chassis_no);
            match sell(&coordinator, &user_id, &invoice).await {
                Ok(number) => {
                    sold += 1;
                    if sold % 10 == 0 {
                        println!("  ... {} invoices (last {})", sold, number);
                    }
                }
                Err(e) => eprintln!("Failed to invoice {}: {}", item.chassis_no, e),
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Received {} vehicles, sold {} in {:?}", vehicles, sold, elapsed);

    let summary = db.reports().stock_summary(&user_id).await?;
    println!();
    println!("Stock on hand:");
    for row in summary {
        println!("  {:<12} {:>3} units", row.model, row.units);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn sell(
    coordinator: &Coordinator,
    user_id: &str,
    draft: &InvoiceDraft,
) -> Result<String, dealer_db::DbError> {
    let saved = coordinator.save_invoice(user_id, draft).await?;
    Ok(saved.invoice.invoice_number)
}

/// One to three vehicles per purchase, chassis numbers derived from `seed`.
fn purchase_draft(seed: usize, date: NaiveDate) -> PurchaseDraft {
    let count = 1 + seed % 3;
    let items = (0..count).map(|k| vehicle(seed * 3 + k)).collect();

    PurchaseDraft {
        purchase_date: date,
        supplier_name: SUPPLIERS[seed % SUPPLIERS.len()].to_string(),
        supplier_gstin: Some("29AAACH0000A1Z5".to_string()),
        supplier_bill_no: Some(format!("HMSI/{:05}", 10_000 + seed)),
        supply_kind: SupplyKind::IntraState,
        notes: None,
        items,
    }
}

fn vehicle(seed: usize) -> VehicleSpec {
    let (model, category, rupees) = MODELS[seed % MODELS.len()];

    VehicleSpec {
        chassis_no: format!("ME4JF50{:010}", seed),
        engine_no: format!("JF50E{:07}", seed),
        model: model.to_string(),
        colour: COLOURS[seed % COLOURS.len()].to_string(),
        price_paise: rupees * 100,
        hsn_code: HSN_CODE.to_string(),
        gst_rate_bps: GST_RATE_BPS,
        category: Some(category.to_string()),
    }
}

fn invoice_draft(seed: usize, date: NaiveDate, chassis_no: &str) -> InvoiceDraft {
    InvoiceDraft {
        invoice_date: date,
        customer_name: CUSTOMERS[seed % CUSTOMERS.len()].to_string(),
        customer_address: Some("Bengaluru".to_string()),
        customer_phone: Some(format!("98450{:05}", seed % 100_000)),
        customer_gstin: None,
        supply_kind: SupplyKind::IntraState,
        notes: None,
        items: vec![InvoiceLine {
            chassis_no: chassis_no.to_string(),
            sale_price_paise: None,
        }],
    }
}
