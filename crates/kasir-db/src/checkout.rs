//! # Checkout Engine
//!
//! Turns a validated cart into a persisted sale in one database transaction.
//!
//! ## Transaction Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CheckoutEngine::checkout()                           │
//! │                                                                         │
//! │  request.validate()                        (no database access)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   1. bump invoice_sequences[today]        ← takes the write lock       │
//! │   2. read tax rate, load active cashier                                │
//! │   3. price_cart()                          (kasir-core)                │
//! │   4. load products, check_stock()          (all shortages reported)    │
//! │   5. INSERT sales, INSERT sale_items       (name/SKU/price snapshots)  │
//! │   6. UPDATE products SET stock -= qty WHERE stock >= qty               │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleDetail { sale, items, cashier }                                   │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction, which rolls back:      │
//! │  no sale, no items, no stock change, no invoice number consumed.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The first statement writes, so SQLite grants this transaction the write
//! lock before any stock is read. Competing checkouts queue on the busy
//! timeout and then see the committed stock. The conditional decrement in
//! step 6 would still refuse to drive stock negative if they did not, and
//! reports the product as short.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use kasir_core::checkout::{aggregate_demand, check_stock, price_cart};
use kasir_core::error::describe_shortages;
use kasir_core::invoice::format_invoice_number;
use kasir_core::{
    CheckoutRequest, Clock, CoreError, Product, Sale, SaleDetail, SaleItem, StockShortage, TaxRate,
    User, ValidationError,
};

use crate::error::DbError;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::user::USER_COLUMNS;

// =============================================================================
// Errors
// =============================================================================

/// Why a checkout did not produce a sale.
///
/// In every case nothing was written.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request is malformed or references something unknown.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// At least one product cannot cover the cart.
    #[error("{}", describe_shortages(.0))]
    StockInsufficient(Vec<StockShortage>),

    /// The database refused or failed the transaction.
    #[error("Checkout failed: {0}")]
    Persistence(#[from] DbError),
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(err) => CheckoutError::Validation(err),
            CoreError::InsufficientStock { shortages } => CheckoutError::StockInsufficient(shortages),
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Persistence(DbError::from(err))
    }
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Engine
// =============================================================================

/// Runs checkouts against the shared pool.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.checkout_engine(Arc::new(SystemClock));
/// let detail = engine.checkout(&cashier_id, request).await?;
/// println!("{}", detail.sale.invoice_number); // INV-20240115-0001
/// ```
pub struct CheckoutEngine {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CheckoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutEngine").finish_non_exhaustive()
    }
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CheckoutEngine { pool, clock }
    }

    /// Records a sale for `cashier_id`.
    ///
    /// ## Errors
    /// * `CheckoutError::Validation` - bad request, unknown product or cashier
    /// * `CheckoutError::StockInsufficient` - one entry per short product
    /// * `CheckoutError::Persistence` - the transaction could not complete
    #[instrument(skip(self, request), fields(cashier_id = %cashier_id, lines = request.items.len()))]
    pub async fn checkout(
        &self,
        cashier_id: &str,
        request: CheckoutRequest,
    ) -> CheckoutResult<SaleDetail> {
        request.validate()?;
        let notes = request.normalized_notes()?;

        let now = self.clock.now();
        let day = now.date_naive();

        let result = self.run(cashier_id, &request, notes, now, day).await;
        match &result {
            Ok(detail) => info!(
                invoice_number = %detail.sale.invoice_number,
                total = %detail.sale.total_amount,
                "Sale completed"
            ),
            Err(CheckoutError::StockInsufficient(shortages)) => {
                warn!(shortages = shortages.len(), "Checkout refused: insufficient stock")
            }
            Err(CheckoutError::Validation(err)) => debug!(%err, "Checkout rejected"),
            Err(CheckoutError::Persistence(err)) => error!(%err, "Checkout transaction failed"),
        }
        result
    }

    async fn run(
        &self,
        cashier_id: &str,
        request: &CheckoutRequest,
        notes: Option<String>,
        now: DateTime<Utc>,
        day: NaiveDate,
    ) -> CheckoutResult<SaleDetail> {
        let mut tx = self.pool.begin().await?;

        let sequence = next_invoice_sequence(&mut tx, day).await?;
        let invoice_number = format_invoice_number(day, sequence);
        debug!(%invoice_number, "Invoice number reserved");

        let tax_rate = current_tax_rate(&mut tx).await?;
        let cashier = load_cashier(&mut tx, cashier_id).await?;

        let totals = price_cart(request, tax_rate)?;

        let demand = aggregate_demand(&request.items);
        let products = load_products(&mut tx, demand.iter().map(|d| d.product_id.as_str())).await?;
        check_stock(&demand, |id| products.get(id))?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            user_id: cashier.id.clone(),
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            payment_method: request.payment_method,
            amount_paid: totals.amount_paid,
            change_amount: totals.change_amount,
            notes,
            sale_date: day,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, user_id, subtotal, discount_amount, tax_amount,
                total_amount, payment_method, amount_paid, change_amount, notes,
                sale_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.invoice_number)
        .bind(&sale.user_id)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.tax_amount)
        .bind(sale.total_amount)
        .bind(sale.payment_method)
        .bind(sale.amount_paid)
        .bind(sale.change_amount)
        .bind(&sale.notes)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(totals.lines.len());
        for line in &totals.lines {
            // check_stock has already resolved every product of the cart
            let product = products.get(&line.product_id).ok_or_else(|| {
                DbError::Internal(format!("product {} vanished mid-checkout", line.product_id))
            })?;

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount_amount: line.discount_amount,
                total_price: line.total_price,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, product_sku, quantity,
                    unit_price, discount_amount, total_price, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discount_amount)
            .bind(item.total_price)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        for wanted in &demand {
            let product = products.get(&wanted.product_id).ok_or_else(|| {
                DbError::Internal(format!("product {} vanished mid-checkout", wanted.product_id))
            })?;
            decrement_stock(&mut tx, product, wanted.quantity, now).await?;
        }

        tx.commit().await?;

        Ok(SaleDetail {
            sale,
            items,
            cashier,
        })
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Bumps and returns the day's invoice counter.
///
/// A day without a counter row starts after the sales already recorded for
/// it, so a database that predates the counter keeps counting from there.
async fn next_invoice_sequence(
    tx: &mut Transaction<'static, Sqlite>,
    day: NaiveDate,
) -> Result<u32, DbError> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (day, last_seq)
        VALUES (?1, (SELECT COUNT(*) FROM sales WHERE sale_date = ?1) + 1)
        ON CONFLICT(day) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(day)
    .fetch_one(&mut **tx)
    .await?;

    u32::try_from(sequence)
        .map_err(|_| DbError::Internal(format!("invoice sequence out of range: {sequence}")))
}

/// Takes `quantity` off the product's stock, refusing to go below zero.
///
/// A refused decrement reports the stock as it stands now.
async fn decrement_stock(
    tx: &mut Transaction<'static, Sqlite>,
    product: &Product,
    quantity: i64,
    now: DateTime<Utc>,
) -> CheckoutResult<()> {
    let updated = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(&product.id)
    .bind(quantity)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(());
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(&product.id)
            .fetch_optional(&mut **tx)
            .await?;

    Err(CheckoutError::StockInsufficient(vec![StockShortage {
        product_id: product.id.clone(),
        sku: product.sku.clone(),
        name: product.name.clone(),
        available: available.unwrap_or(0),
        requested: quantity,
    }]))
}

async fn current_tax_rate(tx: &mut Transaction<'static, Sqlite>) -> Result<TaxRate, DbError> {
    let rate: Option<TaxRate> =
        sqlx::query_scalar("SELECT tax_rate FROM store_settings ORDER BY created_at LIMIT 1")
            .fetch_optional(&mut **tx)
            .await?;

    Ok(rate.unwrap_or_default())
}

async fn load_cashier(
    tx: &mut Transaction<'static, Sqlite>,
    cashier_id: &str,
) -> CheckoutResult<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_active = 1");
    let cashier = sqlx::query_as::<_, User>(&sql)
        .bind(cashier_id)
        .fetch_optional(&mut **tx)
        .await?;

    cashier.ok_or_else(|| {
        ValidationError::UnknownReference {
            field: "cashier_id".to_string(),
            id: cashier_id.to_string(),
        }
        .into()
    })
}

async fn load_products<'a>(
    tx: &mut Transaction<'static, Sqlite>,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, Product>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
    let mut products = HashMap::new();

    for id in ids {
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        if let Some(product) = product {
            products.insert(product.id.clone(), product);
        }
    }

    Ok(products)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shortage() -> StockShortage {
        StockShortage {
            product_id: "p-1".to_string(),
            sku: "ELEC-PHONE-001".to_string(),
            name: "Smartphone".to_string(),
            available: 10,
            requested: 15,
        }
    }

    #[test]
    fn test_core_errors_map_to_checkout_errors() {
        let err: CheckoutError = CoreError::InsufficientStock {
            shortages: vec![shortage()],
        }
        .into();
        assert!(matches!(err, CheckoutError::StockInsufficient(ref s) if s.len() == 1));
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Smartphone (ELEC-PHONE-001): available 10, requested 15"
        );

        let err: CheckoutError = CoreError::Validation(ValidationError::MustBePositive {
            field: "items.0.quantity".to_string(),
        })
        .into();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn test_sqlx_errors_are_persistence_failures() {
        let err: CheckoutError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, CheckoutError::Persistence(DbError::PoolExhausted)));
    }

    #[tokio::test]
    async fn test_refused_decrement_reports_a_shortage() {
        let fx = crate::testing::fixture().await;
        let mut tx = fx.db.pool().begin().await.unwrap();

        let err = decrement_stock(&mut tx, &fx.phone, 26, Utc::now())
            .await
            .unwrap_err();
        match err {
            CheckoutError::StockInsufficient(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].product_id, fx.phone.id);
                assert_eq!(shortages[0].sku, "ELEC-PHONE-001");
                assert_eq!(shortages[0].available, 25);
                assert_eq!(shortages[0].requested, 26);
            }
            other => panic!("expected a stock shortage, got {other:?}"),
        }

        decrement_stock(&mut tx, &fx.phone, 25, Utc::now()).await.unwrap();
        let left: i64 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(&fx.phone.id)
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}
