//! Shared fixtures for the repository unit tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use kasir_core::{
    CartLine, CategoryInput, CheckoutRequest, FixedClock, Money, PaymentMethod, Product,
    ProductInput, SaleDetail, StoreSettingInput, TaxRate, User, UserInput, UserRole,
};

use crate::{Database, DbConfig};

pub(crate) struct Fixture {
    pub db: Database,
    pub rice: Product,
    pub phone: Product,
    pub cashier: User,
    pub admin: User,
}

fn product(category_id: &str, sku: &str, name: &str, retail: i64, stock: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: None,
        sku: sku.to_string(),
        barcode: None,
        category_id: category_id.to_string(),
        wholesale_price: Money::from_units(retail * 8 / 10),
        retail_price: Money::from_units(retail),
        reseller_price: Money::from_units(retail * 9 / 10),
        stock_quantity: stock,
        min_stock_level: 5,
        unit: "pcs".to_string(),
        is_active: true,
    }
}

/// An in-memory store with 11% tax, two products and two users.
pub(crate) async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.settings()
        .upsert(StoreSettingInput {
            store_name: "Toko Maju".to_string(),
            store_address: None,
            store_phone: None,
            store_email: None,
            tax_rate: TaxRate::from_bps(1100),
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

    let products = db.products();
    let rice = products
        .create(product(&category.id, "FOOD-RICE-001", "Premium Rice 5kg", 50_000, 100))
        .await
        .unwrap();
    let phone = products
        .create(product(&category.id, "ELEC-PHONE-001", "Smartphone Android", 2_500_000, 25))
        .await
        .unwrap();

    let users = db.users();
    let cashier = users
        .create(UserInput {
            name: "Kasir Satu".to_string(),
            email: "kasir@toko.test".to_string(),
            role: UserRole::Cashier,
        })
        .await
        .unwrap();
    let admin = users
        .create(UserInput {
            name: "Admin".to_string(),
            email: "admin@toko.test".to_string(),
            role: UserRole::Admin,
        })
        .await
        .unwrap();

    Fixture {
        db,
        rice,
        phone,
        cashier,
        admin,
    }
}

/// Checks out `lines` at retail price as the fixture cashier at `at`.
pub(crate) async fn sell_at(
    fx: &Fixture,
    at: &str,
    lines: &[(&Product, i64)],
    payment_method: PaymentMethod,
) -> SaleDetail {
    let now: DateTime<Utc> = at.parse().unwrap();
    let engine = fx.db.checkout_engine(Arc::new(FixedClock::new(now)));

    let request = CheckoutRequest {
        items: lines
            .iter()
            .map(|(product, quantity)| CartLine {
                product_id: product.id.clone(),
                quantity: *quantity,
                unit_price: product.retail_price,
                discount_amount: Money::zero(),
            })
            .collect(),
        payment_method,
        amount_paid: Money::from_units(100_000_000),
        discount_amount: Money::zero(),
        notes: None,
    };

    engine.checkout(&fx.cashier.id, request).await.unwrap()
}
