//! Checkout transaction tests against a real SQLite database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kasir_core::{
    CartLine, CategoryInput, CheckoutRequest, FixedClock, Money, PaymentMethod, Product,
    ProductInput, StoreSettingInput, TaxRate, User, UserInput, UserRole, ValidationError,
};
use kasir_db::{CheckoutEngine, CheckoutError, Database, DbConfig, DbError};

struct Store {
    db: Database,
    clock: Arc<FixedClock>,
    engine: CheckoutEngine,
    cashier: User,
    category_id: String,
}

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().unwrap()
}

async fn open_store(config: DbConfig, tax_bps: u32) -> Store {
    let db = Database::new(config).await.unwrap();

    db.settings()
        .upsert(StoreSettingInput {
            store_name: "Toko Maju".to_string(),
            store_address: None,
            store_phone: None,
            store_email: None,
            tax_rate: TaxRate::from_bps(tax_bps),
            receipt_header: None,
            receipt_footer: None,
            currency: "IDR".to_string(),
            printer_name: None,
            printer_settings: None,
        })
        .await
        .unwrap();

    let category = db
        .categories()
        .create(CategoryInput {
            name: "General".to_string(),
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

    let clock = Arc::new(FixedClock::new(at("2024-01-15T09:30:00Z")));
    let engine = db.checkout_engine(clock.clone());

    Store {
        db,
        clock,
        engine,
        cashier,
        category_id: category.id,
    }
}

async fn add_product(store: &Store, sku: &str, name: &str, retail: i64, stock: i64) -> Product {
    store
        .db
        .products()
        .create(ProductInput {
            name: name.to_string(),
            description: None,
            sku: sku.to_string(),
            barcode: None,
            category_id: store.category_id.clone(),
            wholesale_price: Money::from_units(retail),
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

fn line(product: &Product, quantity: i64) -> CartLine {
    CartLine {
        product_id: product.id.clone(),
        quantity,
        unit_price: product.retail_price,
        discount_amount: Money::zero(),
    }
}

fn cart(items: Vec<CartLine>, paid: i64) -> CheckoutRequest {
    CheckoutRequest {
        items,
        payment_method: PaymentMethod::Cash,
        amount_paid: Money::from_units(paid),
        discount_amount: Money::zero(),
        notes: None,
    }
}

async fn stock_of(store: &Store, product: &Product) -> i64 {
    store
        .db
        .products()
        .get_by_id(&product.id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

async fn sale_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_checkout_records_sale_and_decrements_stock() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;

    let detail = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 2)], 150_000))
        .await
        .unwrap();

    let sale = &detail.sale;
    assert_eq!(sale.invoice_number, "INV-20240115-0001");
    assert_eq!(sale.subtotal, Money::from_units(100_000));
    assert_eq!(sale.tax_amount, Money::from_units(11_000));
    assert_eq!(sale.total_amount, Money::from_units(111_000));
    assert_eq!(sale.change_amount, Money::from_units(39_000));
    assert_eq!(sale.user_id, store.cashier.id);
    assert_eq!(sale.sale_date.to_string(), "2024-01-15");

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].product_sku, "FOOD-RICE-001");
    assert_eq!(detail.items[0].total_price, Money::from_units(100_000));
    assert_eq!(detail.cashier, store.cashier);

    assert_eq!(stock_of(&store, &rice).await, 8);

    let stored = store.db.sales().get_detail(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored, detail);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;
    let phone = add_product(&store, "ELEC-PHONE-001", "Smartphone", 2_500_000, 1).await;
    let water = add_product(&store, "FOOD-WATER-001", "Mineral Water", 5_000, 0).await;

    let err = store
        .engine
        .checkout(
            &store.cashier.id,
            cart(vec![line(&rice, 2), line(&phone, 3), line(&water, 1)], 10_000_000),
        )
        .await
        .unwrap_err();

    let shortages = match err {
        CheckoutError::StockInsufficient(shortages) => shortages,
        other => panic!("expected insufficient stock, got {other:?}"),
    };
    assert_eq!(shortages.len(), 2);
    assert_eq!(shortages[0].sku, "ELEC-PHONE-001");
    assert_eq!((shortages[0].available, shortages[0].requested), (1, 3));
    assert_eq!(shortages[1].sku, "FOOD-WATER-001");

    assert_eq!(stock_of(&store, &rice).await, 10);
    assert_eq!(stock_of(&store, &phone).await, 1);
    assert_eq!(sale_count(&store.db).await, 0);

    // The failed attempt did not consume an invoice number
    let detail = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 1)], 100_000))
        .await
        .unwrap();
    assert_eq!(detail.sale.invoice_number, "INV-20240115-0001");
}

#[tokio::test]
async fn test_repeated_product_lines_are_checked_together() {
    let store = open_store(DbConfig::in_memory(), 0).await;
    let phone = add_product(&store, "ELEC-PHONE-001", "Smartphone", 100_000, 3).await;

    let err = store
        .engine
        .checkout(
            &store.cashier.id,
            cart(vec![line(&phone, 2), line(&phone, 2)], 1_000_000),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::StockInsufficient(ref s) if s[0].requested == 4 && s[0].available == 3
    ));

    let detail = store
        .engine
        .checkout(
            &store.cashier.id,
            cart(vec![line(&phone, 2), line(&phone, 1)], 1_000_000),
        )
        .await
        .unwrap();
    assert_eq!(detail.items.len(), 2);
    assert_eq!(stock_of(&store, &phone).await, 0);
}

#[tokio::test]
async fn test_invoice_numbers_increment_per_day() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 100).await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let detail = store
            .engine
            .checkout(&store.cashier.id, cart(vec![line(&rice, 1)], 100_000))
            .await
            .unwrap();
        numbers.push(detail.sale.invoice_number);
    }
    assert_eq!(
        numbers,
        vec!["INV-20240115-0001", "INV-20240115-0002", "INV-20240115-0003"]
    );

    store.clock.set(at("2024-01-16T00:00:01Z"));
    let next_day = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 1)], 100_000))
        .await
        .unwrap();
    assert_eq!(next_day.sale.invoice_number, "INV-20240116-0001");
    assert_eq!(next_day.sale.sale_date.to_string(), "2024-01-16");
}

async fn count(db: &Database, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(db.pool()).await.unwrap()
}

#[tokio::test]
async fn test_invoice_collision_rolls_back_everything() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;

    // Filed under the previous day, so today's counter still starts at 0001.
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, user_id, subtotal, total_amount, payment_method,
            amount_paid, sale_date, created_at
        ) VALUES ('stray', 'INV-20240115-0001', ?1, 0, 0, 'cash', 0, '2024-01-14',
                  '2024-01-14T23:59:00+00:00')
        "#,
    )
    .bind(&store.cashier.id)
    .execute(store.db.pool())
    .await
    .unwrap();

    let err = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 2)], 200_000))
        .await
        .unwrap_err();
    match err {
        CheckoutError::Persistence(DbError::UniqueViolation { ref field, .. }) => {
            assert_eq!(field, "sales.invoice_number")
        }
        other => panic!("expected an invoice number conflict, got {other:?}"),
    }

    assert_eq!(stock_of(&store, &rice).await, 10);
    assert_eq!(sale_count(&store.db).await, 1);
    assert_eq!(count(&store.db, "SELECT COUNT(*) FROM sale_items").await, 0);
    assert_eq!(
        count(&store.db, "SELECT COUNT(*) FROM invoice_sequences WHERE day = '2024-01-15'").await,
        0
    );

    sqlx::query("DELETE FROM sales WHERE id = 'stray'")
        .execute(store.db.pool())
        .await
        .unwrap();

    let detail = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 2)], 200_000))
        .await
        .unwrap();
    assert_eq!(detail.sale.invoice_number, "INV-20240115-0001");
    assert_eq!(stock_of(&store, &rice).await, 8);
}

#[tokio::test]
async fn test_sale_items_keep_their_snapshot() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;

    let detail = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 1)], 100_000))
        .await
        .unwrap();

    store
        .db
        .products()
        .update(
            &rice.id,
            ProductInput {
                name: "Rice 10kg".to_string(),
                description: None,
                sku: "FOOD-RICE-010".to_string(),
                barcode: None,
                category_id: store.category_id.clone(),
                wholesale_price: Money::from_units(90_000),
                retail_price: Money::from_units(99_000),
                reseller_price: Money::from_units(95_000),
                stock_quantity: 9,
                min_stock_level: 5,
                unit: "bag".to_string(),
                is_active: true,
            },
        )
        .await
        .unwrap();

    let stored = store.db.sales().items(&detail.sale.id).await.unwrap();
    assert_eq!(stored[0].product_name, "Premium Rice 5kg");
    assert_eq!(stored[0].product_sku, "FOOD-RICE-001");
    assert_eq!(stored[0].unit_price, Money::from_units(50_000));
}

#[tokio::test]
async fn test_discounts_and_underpayment() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;

    let mut discounted = line(&rice, 2);
    discounted.discount_amount = Money::from_units(10_000);
    let mut request = cart(vec![discounted], 50_000);
    request.discount_amount = Money::from_units(10_000);
    request.payment_method = PaymentMethod::Transfer;
    request.notes = Some("  member  ".to_string());

    let sale = store
        .engine
        .checkout(&store.cashier.id, request)
        .await
        .unwrap()
        .sale;

    // 2 × 50,000 − 10,000 line discount − 10,000 header discount
    assert_eq!(sale.subtotal, Money::from_units(80_000));
    assert_eq!(sale.discount_amount, Money::from_units(20_000));
    assert_eq!(sale.tax_amount, Money::from_units(8_800));
    assert_eq!(sale.total_amount, Money::from_units(88_800));
    assert_eq!(sale.amount_paid, Money::from_units(50_000));
    assert_eq!(sale.change_amount, Money::zero());
    assert_eq!(sale.payment_method, PaymentMethod::Transfer);
    assert_eq!(sale.notes.as_deref(), Some("member"));
}

#[tokio::test]
async fn test_rejected_requests_write_nothing() {
    let store = open_store(DbConfig::in_memory(), 1100).await;
    let rice = add_product(&store, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 10).await;

    let err = store
        .engine
        .checkout(&store.cashier.id, cart(vec![], 100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(ref e) if e.field() == "items"));

    let ghost = CartLine {
        product_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
        ..line(&rice, 1)
    };
    let err = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 1), ghost], 100_000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::UnknownReference { ref field, .. })
            if field == "items.1.product_id"
    ));

    let err = store
        .engine
        .checkout("no-such-cashier", cart(vec![line(&rice, 1)], 100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(ref e) if e.field() == "cashier_id"));

    store.db.users().set_active(&store.cashier.id, false).await.unwrap();
    let err = store
        .engine
        .checkout(&store.cashier.id, cart(vec![line(&rice, 1)], 100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));

    assert_eq!(stock_of(&store, &rice).await, 10);
    assert_eq!(sale_count(&store.db).await, 0);
}

#[tokio::test]
async fn test_store_without_settings_charges_no_tax() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let category = db
        .categories()
        .create(CategoryInput {
            name: "General".to_string(),
            slug: None,
            description: None,
            is_active: true,
        })
        .await
        .unwrap();
    let cashier = db
        .users()
        .create(UserInput {
            name: "Kasir".to_string(),
            email: "kasir@toko.test".to_string(),
            role: UserRole::Cashier,
        })
        .await
        .unwrap();
    let rice = db
        .products()
        .create(ProductInput {
            name: "Rice".to_string(),
            description: None,
            sku: "RICE".to_string(),
            barcode: None,
            category_id: category.id,
            wholesale_price: Money::from_units(40_000),
            retail_price: Money::from_units(50_000),
            reseller_price: Money::from_units(45_000),
            stock_quantity: 5,
            min_stock_level: 1,
            unit: "bag".to_string(),
            is_active: true,
        })
        .await
        .unwrap();

    let engine = db.checkout_engine(Arc::new(FixedClock::new(at("2024-03-01T08:00:00Z"))));
    let sale = engine
        .checkout(&cashier.id, cart(vec![line(&rice, 1)], 50_000))
        .await
        .unwrap()
        .sale;
    assert!(sale.tax_amount.is_zero());
    assert_eq!(sale.total_amount, Money::from_units(50_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_oversell() {
    let path = std::env::temp_dir().join(format!("kasir-test-{}.db", uuid::Uuid::new_v4()));
    let store = open_store(DbConfig::new(&path).max_connections(4), 1100).await;
    let last_unit = add_product(&store, "ELEC-PHONE-001", "Smartphone", 2_500_000, 1).await;

    let engine = Arc::new(store.db.checkout_engine(store.clock.clone()));
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let cashier_id = store.cashier.id.clone();
        let request = cart(vec![line(&last_unit, 1)], 3_000_000);
        tasks.push(tokio::spawn(async move {
            engine.checkout(&cashier_id, request).await
        }));
    }

    let mut completed = Vec::new();
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(detail) => completed.push(detail),
            Err(CheckoutError::StockInsufficient(_)) => refused += 1,
            Err(other) => panic!("unexpected checkout failure: {other}"),
        }
    }

    assert_eq!(completed.len(), 1);
    assert_eq!(refused, 3);
    assert_eq!(completed[0].sale.invoice_number, "INV-20240115-0001");
    assert_eq!(stock_of(&store, &last_unit).await, 0);
    assert_eq!(sale_count(&store.db).await, 1);

    store.db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
