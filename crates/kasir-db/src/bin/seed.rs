//! # Seed Data Generator
//!
//! Populates a database with a demo store for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kasir_dev.db
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! ## Generated Data
//! - Store settings: PPN 11%, IDR, 58mm receipt printer
//! - 5 categories, 10 products (3 of them below their stock threshold)
//! - 1 admin and 2 cashiers
//!
//! Seeding is skipped when the database already has products.

use std::env;

use kasir_core::{
    CategoryInput, Money, ProductInput, StoreSettingInput, TaxRate, UserInput, UserRole,
};
use kasir_db::{Database, DbConfig};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Electronics", "electronics", "Electronic devices and accessories"),
    ("Clothing", "clothing", "Apparel and fashion items"),
    ("Food & Beverages", "food-beverages", "Food items and drinks"),
    ("Home & Garden", "home-garden", "Home improvement and garden supplies"),
    ("Books & Stationery", "books-stationery", "Books, office supplies, and stationery"),
];

/// (category slug, name, sku, barcode, wholesale, retail, reseller, stock, min, unit)
type ProductSeed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    i64,
    i64,
    i64,
    &'static str,
);

const PRODUCTS: &[ProductSeed] = &[
    ("electronics", "Smartphone Android", "ELEC-PHONE-001", "1234567890123", 2_000_000, 2_500_000, 2_300_000, 25, 5, "pcs"),
    ("electronics", "Wireless Headphones", "ELEC-HEAD-001", "1234567890124", 300_000, 450_000, 400_000, 50, 10, "pcs"),
    ("electronics", "Laptop Charger", "ELEC-CHAR-001", "1234567890125", 150_000, 200_000, 180_000, 3, 5, "pcs"),
    ("clothing", "Cotton T-Shirt", "CLOT-TSHIRT-001", "1234567890126", 45_000, 75_000, 65_000, 100, 20, "pcs"),
    ("clothing", "Denim Jeans", "CLOT-JEANS-001", "1234567890127", 150_000, 250_000, 220_000, 2, 10, "pcs"),
    ("food-beverages", "Instant Coffee", "FOOD-COFFEE-001", "1234567890128", 25_000, 35_000, 32_000, 150, 30, "pack"),
    ("food-beverages", "Mineral Water 600ml", "FOOD-WATER-001", "1234567890129", 3_000, 5_000, 4_000, 200, 50, "bottle"),
    ("home-garden", "LED Light Bulb", "HOME-LED-001", "1234567890130", 35_000, 50_000, 45_000, 75, 15, "pcs"),
    ("books-stationery", "Notebook A5", "BOOK-NOTE-001", "1234567890131", 15_000, 25_000, 22_000, 4, 20, "pcs"),
    ("books-stationery", "Ballpoint Pen Set", "BOOK-PEN-001", "1234567890132", 12_000, 20_000, 18_000, 80, 25, "set"),
];

const USERS: &[(&str, &str, UserRole)] = &[
    ("Admin Kasir", "admin@kasir.local", UserRole::Admin),
    ("Kasir Satu", "kasir1@kasir.local", UserRole::Cashier),
    ("Kasir Dua", "kasir2@kasir.local", UserRole::Cashier),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kasir=debug")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("Database already has {existing} products; skipping seed.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    db.settings()
        .upsert(StoreSettingInput {
            store_name: "Kasir Demo Store".to_string(),
            store_address: Some("Jl. Raya No. 123, Jakarta, Indonesia".to_string()),
            store_phone: Some("+62 21 1234567".to_string()),
            store_email: Some("store@kasir.local".to_string()),
            tax_rate: TaxRate::from_bps(1100),
            receipt_header: Some("Terima kasih telah berbelanja".to_string()),
            receipt_footer: Some("Barang yang sudah dibeli tidak dapat dikembalikan".to_string()),
            currency: "IDR".to_string(),
            printer_name: None,
            printer_settings: Some(json!({"paper_width": 58, "font_size": 12, "line_spacing": 1.5})),
        })
        .await?;

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, slug, description) in CATEGORIES {
        let category = db
            .categories()
            .create(CategoryInput {
                name: name.to_string(),
                slug: Some(slug.to_string()),
                description: Some(description.to_string()),
                is_active: true,
            })
            .await?;
        category_ids.push((*slug, category.id));
    }

    for &(slug, name, sku, barcode, wholesale, retail, reseller, stock, min, unit) in PRODUCTS {
        let category_id = category_ids
            .iter()
            .find(|(s, _)| *s == slug)
            .map(|(_, id)| id.clone())
            .ok_or_else(|| format!("unknown category {slug}"))?;

        db.products()
            .create(ProductInput {
                name: name.to_string(),
                description: None,
                sku: sku.to_string(),
                barcode: Some(barcode.to_string()),
                category_id,
                wholesale_price: Money::from_units(wholesale),
                retail_price: Money::from_units(retail),
                reseller_price: Money::from_units(reseller),
                stock_quantity: stock,
                min_stock_level: min,
                unit: unit.to_string(),
                is_active: true,
            })
            .await?;
    }

    for (name, email, role) in USERS {
        let user = db
            .users()
            .create(UserInput {
                name: name.to_string(),
                email: email.to_string(),
                role: *role,
            })
            .await?;
        println!("{:<8} {:<20} {}", format!("{role:?}"), user.name, user.id);
    }

    println!();
    println!(
        "Seeded {} categories, {} products ({} low on stock).",
        CATEGORIES.len(),
        PRODUCTS.len(),
        db.products().count_low_stock().await?
    );
    println!("Send one of the user ids above as X-Cashier-Id.");

    db.close().await;
    Ok(())
}
