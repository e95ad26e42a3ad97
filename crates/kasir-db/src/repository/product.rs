//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Full-text search using FTS5
//! - CRUD operations (delete is a soft delete)
//! - Low-stock queries for the dashboard
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "phone"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FTS5 searches across: sku, name, barcode                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────┐                       │
//! │  │ products_fts (virtual table)                │                       │
//! │  │                                             │                       │
//! │  │ ELEC-PHONE-001 | Smartphone Android | 899.. │ ← MATCH!              │
//! │  │ ELEC-PHONE-002 | Phone Case         |       │ ← MATCH!              │
//! │  │ FOOD-RICE-001  | Premium Rice 5kg   | 899.. │                       │
//! │  └─────────────────────────────────────────────┘                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Combined with the other filters, paginated                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use kasir_core::report::{Page, PageRequest, ProductFilter};
use kasir_core::{Product, ProductInput, ProductView, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::{ensure_unique, fts_prefix_query};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.sku, p.barcode, \
     p.category_id, p.wholesale_price, p.retail_price, p.reseller_price, \
     p.stock_quantity, p.min_stock_level, p.unit, p.is_active, p.created_at, p.updated_at";

/// A product row joined with its category's name.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
}

impl From<ProductRow> for ProductView {
    fn from(row: ProductRow) -> Self {
        ProductView::new(row.product, row.category_name)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    if let Some(search) = &filter.search {
        qb.push(" AND p.rowid IN (SELECT rowid FROM products_fts WHERE products_fts MATCH ")
            .push_bind(fts_prefix_query(search))
            .push(")");
    }
    if let Some(category_id) = &filter.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id.clone());
    }
    if filter.low_stock {
        qb.push(" AND p.stock_quantity <= p.min_stock_level");
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND p.is_active = ").push_bind(active);
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let page = repo.list(ProductFilter { search: Some("phone".into()), ..Default::default() },
///                      PageRequest::default()).await?;
/// let product = repo.get_by_sku("ELEC-PHONE-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching every filter, ordered by name.
    ///
    /// ## How Search Works
    /// The search is matched as a prefix phrase against the FTS5 index over
    /// SKU, name and barcode, then combined with the other filters.
    pub async fn list(&self, filter: ProductFilter, page: PageRequest) -> DbResult<Page<ProductView>> {
        let filter = filter.validate()?;
        debug!(?filter, page = page.page, "Listing products");

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products p WHERE 1 = 1");
        push_filters(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id WHERE 1 = 1"
        ));
        push_filters(&mut query, &filter);
        query
            .push(" ORDER BY p.name, p.sku LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total, "Listed products");
        Ok(Page::new(rows.into_iter().map(ProductView::from).collect(), page, total))
    }

    /// Every active product with its category name, for the POS screen.
    pub async fn list_for_pos(&self) -> DbResult<Vec<ProductView>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.is_active = 1 ORDER BY p.name"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductView::from).collect())
    }

    /// Active products at or below their threshold, lowest stock first.
    pub async fn low_stock(&self, limit: i64) -> DbResult<Vec<ProductView>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.is_active = 1 AND p.stock_quantity <= p.min_stock_level \
             ORDER BY p.stock_quantity, p.name LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductView::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.get_where("p.id", id).await
    }

    /// Gets a product by SKU (the business identifier).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        self.get_where("p.sku", sku).await
    }

    /// Gets a product by barcode (scanner input).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        self.get_where("p.barcode", barcode).await
    }

    /// Gets a product with its category name.
    pub async fn get_view(&self, id: &str) -> DbResult<Option<ProductView>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, c.name AS category_name \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id WHERE p.id = ?1"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ProductView::from))
    }

    async fn get_where(&self, column: &str, value: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE {column} = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Checks everything about `input` that needs the database.
    async fn check_references(&self, input: &ProductInput, exclude_id: Option<&str>) -> DbResult<()> {
        let category: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?1")
            .bind(&input.category_id)
            .fetch_one(&self.pool)
            .await?;
        if category == 0 {
            return Err(ValidationError::UnknownReference {
                field: "category_id".to_string(),
                id: input.category_id.clone(),
            }
            .into());
        }

        ensure_unique(&self.pool, "products", "sku", &input.sku, exclude_id).await?;
        if let Some(barcode) = &input.barcode {
            ensure_unique(&self.pool, "products", "barcode", barcode, exclude_id).await?;
        }

        Ok(())
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// * `DbError::Validation` - invalid input, unknown category, duplicate SKU/barcode
    pub async fn create(&self, input: ProductInput) -> DbResult<Product> {
        let input = input.validate()?;
        self.check_references(&input, None).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            sku: input.sku,
            barcode: input.barcode,
            category_id: input.category_id,
            wholesale_price: input.wholesale_price,
            retail_price: input.retail_price,
            reseller_price: input.reseller_price,
            stock_quantity: input.stock_quantity,
            min_stock_level: input.min_stock_level,
            unit: input.unit,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, sku, barcode, category_id,
                wholesale_price, retail_price, reseller_price,
                stock_quantity, min_stock_level, unit, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.category_id)
        .bind(product.wholesale_price)
        .bind(product.retail_price)
        .bind(product.reseller_price)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(product_id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Replaces a product's editable fields, stock included.
    pub async fn update(&self, id: &str, input: ProductInput) -> DbResult<Product> {
        let input = input.validate()?;
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        self.check_references(&input, Some(id)).await?;

        let product = Product {
            name: input.name,
            description: input.description,
            sku: input.sku,
            barcode: input.barcode,
            category_id: input.category_id,
            wholesale_price: input.wholesale_price,
            retail_price: input.retail_price,
            reseller_price: input.reseller_price,
            stock_quantity: input.stock_quantity,
            min_stock_level: input.min_stock_level,
            unit: input.unit,
            is_active: input.is_active,
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, sku = ?4, barcode = ?5, category_id = ?6,
                wholesale_price = ?7, retail_price = ?8, reseller_price = ?9,
                stock_quantity = ?10, min_stock_level = ?11, unit = ?12, is_active = ?13,
                updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.category_id)
        .bind(product.wholesale_price)
        .bind(product.retail_price)
        .bind(product.reseller_price)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(product_id = %id, stock = product.stock_quantity, "Product updated");
        Ok(product)
    }

    /// Soft-deletes a product. Sale items keep referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts active products at or below their threshold.
    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active = 1 AND stock_quantity <= min_stock_level",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
