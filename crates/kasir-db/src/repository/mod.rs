//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list(filter, page)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self, filter, page)                                         │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── create(&self, input)      ← validates, checks uniqueness          │
//! │  └── update(&self, id, input)                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  The checkout transaction is NOT here: it lives in `checkout.rs`       │
//! │  because it spans products, sales, sale_items and invoice_sequences.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Category CRUD
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, search, low stock
//! - [`SaleRepository`](sale::SaleRepository) - Sale ledger reads
//! - [`SettingsRepository`](settings::SettingsRepository) - The store settings row
//! - [`UserRepository`](user::UserRepository) - Cashiers and admins
//! - [`ReportRepository`](report::ReportRepository) - Sales reports and dashboard

pub mod category;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;

use kasir_core::ValidationError;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Fails with [`ValidationError::Duplicate`] when `column = value` is already
/// taken by a row other than `exclude_id`.
///
/// `table` and `column` are compile-time constants of the calling repository.
pub(crate) async fn ensure_unique(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    value: &str,
    exclude_id: Option<&str>,
) -> DbResult<()> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1 AND id != ?2");
    let taken: i64 = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(exclude_id.unwrap_or(""))
        .fetch_one(pool)
        .await?;

    if taken > 0 {
        return Err(ValidationError::Duplicate {
            field: column.to_string(),
            value: value.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Turns a user search into an FTS5 prefix query.
///
/// The input is quoted as a single phrase so FTS5 operators in it are
/// matched literally: `ELEC-PHONE` becomes `"ELEC-PHONE"*`.
pub(crate) fn fts_prefix_query(search: &str) -> String {
    format!("\"{}\"*", search.replace('"', "\"\""))
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_contains(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
