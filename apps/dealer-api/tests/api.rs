use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use dealer_api::{build_router, ApiConfig, AppState, Environment};
use dealer_db::{Database, DbConfig};

const USER: &str = "dealer-1";

async fn setup(environment: Environment) -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        environment,
        ..ApiConfig::default()
    };
    let policy = config.numbering_policy().unwrap();
    let app = build_router(AppState::new(db.clone(), config, policy));
    (app, db)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", USER);

    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn vehicle(chassis: &str) -> Value {
    json!({
        "chassis_no": chassis,
        "engine_no": format!("E{chassis}"),
        "model": "Activa 6G",
        "colour": "Pearl White",
        "price_paise": 7_600_000,
        "hsn_code": "87112019",
        "gst_rate_bps": 2800,
        "category": "scooter"
    })
}

fn purchase(date: &str, chassis: &[&str]) -> Value {
    json!({
        "purchase_date": date,
        "supplier_name": "Honda Motorcycle & Scooter India",
        "supplier_bill_no": "HMSI/1001",
        "items": chassis.iter().map(|c| vehicle(c)).collect::<Vec<_>>()
    })
}

fn invoice(date: &str, chassis: &[&str]) -> Value {
    json!({
        "invoice_date": date,
        "customer_name": "Ravi Kumar",
        "customer_phone": "9845012345",
        "items": chassis
            .iter()
            .map(|c| json!({ "chassis_no": c }))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn health_reports_database_state() {
    let (app, db) = setup(Environment::Production).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);
    assert_eq!(body["schema_current"], true);

    db.close().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn api_requires_user_header() {
    let (app, _db) = setup(Environment::Production).await;

    let response = app
        .oneshot(Request::builder().uri("/api/stock").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn sell_and_restore_through_the_api() {
    let (app, _db) = setup(Environment::Production).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/purchases",
        Some(purchase("2024-05-02", &["CHASSISA1", "CHASSISB1"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["purchase"]["purchase_number"], "PUR/2024-25/0001");

    let (_, stock) = send(&app, Method::GET, "/api/stock?q=chassis", None).await;
    assert_eq!(stock.as_array().unwrap().len(), 2);

    let (_, preview) = send(&app, Method::GET, "/api/invoices/next-number?date=2024-06-01", None).await;
    assert_eq!(preview["number"], "INV/2024-25/0001");

    let (status, saved) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(invoice("2024-06-01", &["CHASSISA1"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["invoice"]["invoice_number"], "INV/2024-25/0001");
    let invoice_id = saved["invoice"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/stock/CHASSISA1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, conflict) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(invoice("2024-06-02", &["CHASSISA1"])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "STOCK_CONFLICT");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, unit) = send(&app, Method::GET, "/api/stock/chassisa1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unit["model"], "Activa 6G");

    let (_, preview) = send(&app, Method::GET, "/api/invoices/next-number?date=2024-06-01", None).await;
    assert_eq!(preview["number"], "INV/2024-25/0002");
}

#[tokio::test]
async fn update_invoice_through_the_api() {
    let (app, _db) = setup(Environment::Production).await;
    send(
        &app,
        Method::POST,
        "/api/purchases",
        Some(purchase("2024-05-02", &["CHASSISA1", "CHASSISB1", "CHASSISC1"])),
    )
    .await;
    let (_, saved) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(invoice("2024-06-01", &["CHASSISA1", "CHASSISB1"])),
    )
    .await;
    let id = saved["invoice"]["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/invoices/{id}"),
        Some(invoice("2024-06-01", &["CHASSISA1", "CHASSISC1"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["items"].as_array().unwrap().len(), 2);

    let (_, stock) = send(&app, Method::GET, "/api/stock", None).await;
    let chassis: Vec<&str> = stock
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["chassis_no"].as_str())
        .collect();
    assert_eq!(chassis, vec!["CHASSISB1"]);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/invoices/{id}"),
        Some(invoice("2025-04-01", &["CHASSISA1"])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_LOGIC");
}

#[tokio::test]
async fn purchase_with_sold_vehicle_cannot_be_deleted() {
    let (app, _db) = setup(Environment::Production).await;
    let (_, bought) = send(
        &app,
        Method::POST,
        "/api/purchases",
        Some(purchase("2024-05-02", &["CHASSISX1", "CHASSISY1"])),
    )
    .await;
    let purchase_id = bought["purchase"]["id"].as_str().unwrap().to_string();
    send(&app, Method::POST, "/api/invoices", Some(invoice("2024-06-01", &["CHASSISX1"]))).await;

    let (status, body) =
        send(&app, Method::DELETE, &format!("/api/purchases/{purchase_id}"), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("CHASSISX1"));

    let (status, _) = send(&app, Method::GET, &format!("/api/purchases/{purchase_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rejects_bad_input() {
    let (app, _db) = setup(Environment::Production).await;

    let (status, body) = send(&app, Method::POST, "/api/invoices", Some(invoice("2024-06-01", &[]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(json!({ "invoice_date": "not-a-date", "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, Method::GET, "/api/invoices/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/invoices/7d3f1e0c-3b5a-4c1e-9a57-0d6c2b1f4e8a",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/api/invoices?fy=24-25", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reports_summarize_stock_and_sales() {
    let (app, _db) = setup(Environment::Production).await;
    send(
        &app,
        Method::POST,
        "/api/purchases",
        Some(purchase("2024-05-02", &["CHASSISA1", "CHASSISB1"])),
    )
    .await;
    send(&app, Method::POST, "/api/invoices", Some(invoice("2024-06-01", &["CHASSISA1"]))).await;

    let (status, stock) = send(&app, Method::GET, "/api/reports/stock-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock[0]["units"], 1);

    let (status, sales) = send(&app, Method::GET, "/api/reports/sales?fy=2024-25", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales["invoices"], 1);
    assert_eq!(sales["taxable_paise"], 7_600_000);
}

#[tokio::test]
async fn internal_detail_only_in_development() {
    for (environment, expect_detail) in [
        (Environment::Development, true),
        (Environment::Production, false),
    ] {
        let (app, db) = setup(environment).await;
        db.close().await;

        let (status, body) = send(&app, Method::GET, "/api/stock", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert_eq!(body.get("detail").is_some(), expect_detail);
    }
}
