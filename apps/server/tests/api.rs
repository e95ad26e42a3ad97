//! HTTP round trips through the full router on an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use kasir_core::{
    CategoryInput, FixedClock, Money, Product, ProductInput, StoreSettingInput, TaxRate, User,
    UserInput, UserRole,
};
use kasir_db::{Database, DbConfig};
use kasir_server::{router, AppState, ServerConfig};

struct TestApp {
    app: Router,
    db: Database,
    cashier: User,
    category_id: String,
}

async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.settings()
        .upsert(StoreSettingInput {
            store_name: "Toko Maju".to_string(),
            store_address: Some("Jl. Merdeka 1".to_string()),
            store_phone: None,
            store_email: None,
            tax_rate: TaxRate::from_bps(1100),
            receipt_header: None,
            receipt_footer: Some("Terima kasih".to_string()),
            currency: "IDR".to_string(),
            printer_name: None,
            printer_settings: Some(json!({ "paper_width": 58 })),
        })
        .await
        .unwrap();

    let category = db
        .categories()
        .create(CategoryInput {
            name: "Food".to_string(),
            slug: None,
            description: None,
            is_active: true,
        })
        .await
        .unwrap();

    let cashier = db
        .users()
        .create(UserInput {
            name: "Kasir Satu".to_string(),
            email: "kasir1@toko.test".to_string(),
            role: UserRole::Cashier,
        })
        .await
        .unwrap();

    let clock = Arc::new(FixedClock::new("2024-01-15T09:30:00Z".parse().unwrap()));
    let state = AppState::new(db.clone(), clock, ServerConfig::default());

    TestApp {
        app: router(state),
        db,
        cashier,
        category_id: category.id,
    }
}

impl TestApp {
    async fn add_product(&self, sku: &str, name: &str, retail: i64, stock: i64) -> Product {
        self.db
            .products()
            .create(ProductInput {
                name: name.to_string(),
                description: None,
                sku: sku.to_string(),
                barcode: None,
                category_id: self.category_id.clone(),
                wholesale_price: Money::from_units(retail / 2),
                retail_price: Money::from_units(retail),
                reseller_price: Money::from_units(retail),
                stock_quantity: stock,
                min_stock_level: 5,
                unit: "pcs".to_string(),
                is_active: true,
            })
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn checkout(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/pos")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Cashier-Id", &self.cashier.id)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn stock_of(&self, product: &Product) -> i64 {
        self.db
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }
}

fn cash_sale(product: &Product, quantity: i64, unit_price: &str, paid: &str) -> Value {
    json!({
        "items": [{ "product_id": product.id, "quantity": quantity, "unit_price": unit_price }],
        "payment_method": "cash",
        "amount_paid": paid,
    })
}

// =============================================================================
// Health and screens
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let (status, body) = app.get("/health-check").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["timestamp"], "2024-01-15T09:30:00Z");
}

#[tokio::test]
async fn test_pos_screen_lists_active_products() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;
    let old = app.add_product("FOOD-OLD-001", "Old Stock", 1_000, 1).await;
    app.db.products().deactivate(&old.id).await.unwrap();

    let (status, body) = app.get("/pos").await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], rice.id.as_str());
    assert_eq!(body["categories"][0]["name"], "Food");
    assert_eq!(body["store_settings"]["tax_rate"], "11.00");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_returns_receipt() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;

    let (status, body) = app.checkout(cash_sale(&rice, 2, "50000.00", "150000.00")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sale"]["invoice_number"], "INV-20240115-0001");
    assert_eq!(body["sale"]["subtotal"], "100000.00");
    assert_eq!(body["sale"]["tax_amount"], "11000.00");
    assert_eq!(body["sale"]["total_amount"], "111000.00");
    assert_eq!(body["sale"]["change_amount"], "39000.00");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["product_sku"], "FOOD-RICE-001");
    assert_eq!(body["cashier"]["name"], "Kasir Satu");
    assert_eq!(body["store_settings"]["store_name"], "Toko Maju");
    assert_eq!(app.stock_of(&rice).await, 98);
}

#[tokio::test]
async fn test_checkout_requires_known_cashier() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;

    let (status, body) = app
        .json(Method::POST, "/pos", cash_sale(&rice, 1, "50000.00", "60000.00"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    app.db.users().set_active(&app.cashier.id, false).await.unwrap();
    let (status, _) = app.checkout(cash_sale(&rice, 1, "50000.00", "60000.00")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.stock_of(&rice).await, 100);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_conflict() {
    let app = spawn_app().await;
    let phone = app.add_product("ELEC-PHONE-001", "Smartphone", 2_500_000, 10).await;

    let (status, body) = app
        .checkout(cash_sale(&phone, 15, "2500000.00", "40000000.00"))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["details"][0]["sku"], "ELEC-PHONE-001");
    assert_eq!(body["details"][0]["available"], 10);
    assert_eq!(body["details"][0]["requested"], 15);
    assert_eq!(app.stock_of(&phone).await, 10);

    let (_, sales) = app.get("/sales").await;
    assert_eq!(sales["total"], 0);
}

#[tokio::test]
async fn test_checkout_storage_failure_is_generic() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;

    // Takes today's first invoice number while filed under yesterday.
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, user_id, subtotal, total_amount, payment_method,
            amount_paid, sale_date, created_at
        ) VALUES ('stray', 'INV-20240115-0001', ?1, 0, 0, 'cash', 0, '2024-01-14',
                  '2024-01-14T23:59:00+00:00')
        "#,
    )
    .bind(&app.cashier.id)
    .execute(app.db.pool())
    .await
    .unwrap();

    let (status, body) = app.checkout(cash_sale(&rice, 2, "50000.00", "150000.00")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DATABASE_ERROR");
    assert_eq!(body["message"], "The sale could not be recorded");
    assert!(body.get("details").is_none());
    assert_eq!(app.stock_of(&rice).await, 100);
}

#[tokio::test]
async fn test_checkout_validation_errors() {
    let app = spawn_app().await;

    let (status, body) = app
        .checkout(json!({ "items": [], "payment_method": "cash", "amount_paid": "0" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["field"], "items");

    // Three fractional digits cannot be represented.
    let (status, body) = app
        .checkout(json!({
            "items": [{ "product_id": "x", "quantity": 1, "unit_price": "1.005" }],
            "payment_method": "cash",
            "amount_paid": "10.00",
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .checkout(json!({
            "items": [{ "product_id": uuid_like(), "quantity": 1, "unit_price": "10.00" }],
            "payment_method": "barter",
            "amount_paid": "10.00",
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_checkout_unknown_product() {
    let app = spawn_app().await;

    let (status, body) = app
        .checkout(json!({
            "items": [{ "product_id": uuid_like(), "quantity": 1, "unit_price": "10.00" }],
            "payment_method": "cash",
            "amount_paid": "20.00",
        }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

fn uuid_like() -> &'static str {
    "6f1c1e9a-2f4b-4c8e-9a51-3b7d2c1e0f42"
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_product_crud() {
    let app = spawn_app().await;
    let payload = json!({
        "name": "Instant Coffee",
        "sku": "FOOD-COFFEE-001",
        "barcode": "1234567890128",
        "category_id": app.category_id,
        "wholesale_price": "25000.00",
        "retail_price": "35000.00",
        "reseller_price": "32000.00",
        "stock_quantity": 3,
        "min_stock_level": 30,
        "unit": "pack",
    });

    let (status, created) = app.json(Method::POST, "/products", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, shown) = app.get(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["category_name"], "Food");
    assert_eq!(shown["is_low_stock"], true);

    let (status, found) = app.get("/products/lookup?barcode=1234567890128").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], id.as_str());

    let (status, body) = app.json(Method::POST, "/products", payload.clone()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["field"], "sku");

    let mut changed = payload;
    changed["retail_price"] = json!("36000.00");
    let (status, updated) = app.json(Method::PUT, &format!("/products/{id}"), changed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["retail_price"], "36000.00");

    let (status, low) = app.get("/products/low-stock").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low.as_array().unwrap().len(), 1);

    let request = Request::delete(format!("/products/{id}")).body(Body::empty()).unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = app.get("/products?is_active=false").await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["data"][0]["is_active"], false);

    let (status, _) = app.get("/products/6f1c1e9a-0000-4c8e-9a51-3b7d2c1e0f42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_search_and_paging() {
    let app = spawn_app().await;
    app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;
    app.add_product("FOOD-RICE-002", "Rice 10kg", 95_000, 100).await;
    app.add_product("FOOD-WATER-001", "Mineral Water", 5_000, 100).await;

    let (status, body) = app.get("/products?search=rice&per_page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["per_page"], 1);
    assert_eq!(body["last_page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_category_delete_refused_while_referenced() {
    let app = spawn_app().await;
    app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;

    let request = Request::delete(format!("/categories/{}", app.category_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, created) = app
        .json(Method::POST, "/categories", json!({ "name": "Home & Garden" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "home-garden");

    let request = Request::delete(format!("/categories/{}", created["id"].as_str().unwrap()))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, categories) = app.get("/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

// =============================================================================
// Sales, receipts, reports
// =============================================================================

#[tokio::test]
async fn test_sales_ledger_and_receipt() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 100).await;
    let (_, first) = app.checkout(cash_sale(&rice, 2, "50000.00", "150000.00")).await;
    app.checkout(json!({
        "items": [{ "product_id": rice.id, "quantity": 1, "unit_price": "50000.00" }],
        "payment_method": "card",
        "amount_paid": "55500.00",
    }))
    .await;

    let (status, list) = app.get("/sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 2);
    assert_eq!(list["data"][0]["invoice_number"], "INV-20240115-0002");
    assert_eq!(list["data"][0]["cashier_name"], "Kasir Satu");

    let (_, cards) = app.get("/sales?payment_method=card").await;
    assert_eq!(cards["total"], 1);

    let (_, search) = app.get("/sales?search=0001").await;
    assert_eq!(search["data"][0]["invoice_number"], "INV-20240115-0001");

    let id = first["sale"]["id"].as_str().unwrap();
    let (status, shown) = app.get(&format!("/sales/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["sale"]["invoice_number"], "INV-20240115-0001");
    assert_eq!(shown["store_settings"]["currency"], "IDR");

    let response = app
        .app
        .clone()
        .oneshot(Request::get(format!("/sales/{id}/receipt")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("INV-20240115-0001"));
    assert!(text.contains("IDR 111,000.00"));
    assert!(text.lines().all(|line| line.chars().count() <= 32));

    let (status, _) = app.get("/sales/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reports_and_dashboard() {
    let app = spawn_app().await;
    let rice = app.add_product("FOOD-RICE-001", "Rice 5kg", 50_000, 7).await;
    app.checkout(cash_sale(&rice, 2, "50000.00", "150000.00")).await;

    let (status, daily) = app.get("/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(daily["period"]["start"], "2024-01-15");
    assert_eq!(daily["summary"]["total_sales"], 1);
    assert_eq!(daily["summary"]["total_amount"], "111000.00");
    assert_eq!(daily["summary"]["payment_methods"]["cash"]["count"], 1);
    assert_eq!(daily["cashiers"][0]["name"], "Kasir Satu");

    let (_, monthly) = app.get("/reports?type=monthly&date=2024-01-02").await;
    assert_eq!(monthly["period"]["end"], "2024-01-31");
    assert_eq!(monthly["summary"]["total_sales"], 1);

    let (_, other_day) = app.get("/reports?date=2024-01-16").await;
    assert_eq!(other_day["summary"]["total_sales"], 0);

    let (status, _) = app.get("/reports?type=weekly").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, dashboard) = app.get("/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["today_sales"], "111000.00");
    assert_eq!(dashboard["stats"]["total_products"], 1);
    assert_eq!(dashboard["stats"]["low_stock_products"], 1);
    assert_eq!(dashboard["recent_sales"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["low_stock_alerts"][0]["sku"], "FOOD-RICE-001");
}

#[tokio::test]
async fn test_settings_update() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(
            Method::PUT,
            "/settings",
            json!({ "store_name": "Toko Baru", "tax_rate": "10.00", "currency": "IDR" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store_name"], "Toko Baru");
    assert_eq!(body["tax_rate"], "10.00");

    let (_, shown) = app.get("/settings").await;
    assert_eq!(shown["store_name"], "Toko Baru");

    let (status, body) = app
        .json(Method::PUT, "/settings", json!({ "store_name": "", "tax_rate": "10.00" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["field"], "store_name");
}
