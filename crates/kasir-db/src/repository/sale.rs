//! # Sale Repository
//!
//! Read side of the sale ledger. Sales are only ever written by the
//! checkout transaction (`crate::checkout`) and are immutable afterwards.
//!
//! ## Ledger Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Ledger                                       │
//! │                                                                         │
//! │  list(filter, page)                                                    │
//! │     └── sales JOIN users → SaleListItem { sale, cashier_name }         │
//! │         WHERE invoice LIKE %search%                                    │
//! │           AND user_id = ? AND payment_method = ?                       │
//! │           AND sale_date BETWEEN from AND to                            │
//! │         ORDER BY created_at DESC                                       │
//! │                                                                         │
//! │  get_detail(id)                                                        │
//! │     └── Sale + SaleItems (insertion order) + cashier                   │
//! │                                                                         │
//! │  total_between(from, to)                                               │
//! │     └── SUM(total_amount) for the dashboard                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use kasir_core::report::{Page, PageRequest, SaleFilter};
use kasir_core::{Money, Sale, SaleDetail, SaleItem, SaleListItem, User};

use crate::error::DbResult;
use crate::repository::like_contains;
use crate::repository::user::USER_COLUMNS;

pub(crate) const SALE_COLUMNS: &str = "s.id, s.invoice_number, s.user_id, s.subtotal, \
     s.discount_amount, s.tax_amount, s.total_amount, s.payment_method, s.amount_paid, \
     s.change_amount, s.notes, s.sale_date, s.created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, product_sku, quantity, \
     unit_price, discount_amount, total_price, created_at";

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    if let Some(search) = &filter.search {
        qb.push(" AND s.invoice_number LIKE ")
            .push_bind(like_contains(search))
            .push(" ESCAPE '\\'");
    }
    if let Some(cashier_id) = &filter.cashier_id {
        qb.push(" AND s.user_id = ").push_bind(cashier_id.clone());
    }
    if let Some(method) = filter.payment_method {
        qb.push(" AND s.payment_method = ").push_bind(method);
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND s.sale_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND s.sale_date <= ").push_bind(to);
    }
}

fn list_query(filter: &SaleFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {SALE_COLUMNS}, u.name AS cashier_name \
         FROM sales s JOIN users u ON u.id = s.user_id WHERE 1 = 1"
    ));
    push_filters(&mut query, filter);
    query.push(" ORDER BY s.created_at DESC, s.invoice_number DESC");
    query
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its invoice number.
    pub async fn get_by_invoice_number(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.invoice_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Line items of a sale, in the order they were rung up.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// A sale with its items and cashier.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.items(&sale.id).await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let cashier = sqlx::query_as::<_, User>(&sql)
            .bind(&sale.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(SaleDetail {
            sale,
            items,
            cashier,
        }))
    }

    /// One page of the ledger, newest first.
    pub async fn list(&self, filter: SaleFilter, page: PageRequest) -> DbResult<Page<SaleListItem>> {
        let filter = filter.validate()?;
        debug!(?filter, page = page.page, "Listing sales");

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sales s WHERE 1 = 1");
        push_filters(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = list_query(&filter);
        query
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let sales: Vec<SaleListItem> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(sales, page, total))
    }

    /// Every sale matching the filter, newest first. Used by reports.
    pub async fn list_all(&self, filter: SaleFilter) -> DbResult<Vec<SaleListItem>> {
        let filter = filter.validate()?;
        let mut query = list_query(&filter);
        let sales = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// The most recent sales, for the dashboard.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<SaleListItem>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS}, u.name AS cashier_name \
             FROM sales s JOIN users u ON u.id = s.user_id \
             ORDER BY s.created_at DESC, s.invoice_number DESC LIMIT ?1"
        );
        let sales = sqlx::query_as::<_, SaleListItem>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sum of `total_amount` over the business days `from..=to`.
    pub async fn total_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM sales WHERE sale_date >= ?1 AND sale_date <= ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Number of sales recorded on a business day.
    pub async fn count_for_day(&self, day: NaiveDate) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_date = ?1")
            .bind(day)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
