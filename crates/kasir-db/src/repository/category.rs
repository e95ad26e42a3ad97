//! # Category Repository
//!
//! Database operations for product categories.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use kasir_core::validation::slugify;
use kasir_core::{Category, CategoryInput};

use crate::error::{DbError, DbResult};
use crate::repository::ensure_unique;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, is_active, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories by name, optionally only the active ones.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE (?1 = 0 OR is_active = 1) ORDER BY name"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Distinct categories of the active products, for the POS screen filter.
    pub async fn list_with_active_products(&self) -> DbResult<Vec<Category>> {
        let sql = format!(
            r#"
            SELECT {CATEGORY_COLUMNS} FROM categories
            WHERE id IN (SELECT category_id FROM products WHERE is_active = 1)
            ORDER BY name
            "#
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// * `DbError::Validation` - invalid input or slug already taken
    pub async fn create(&self, input: CategoryInput) -> DbResult<Category> {
        let input = input.validate()?;
        let slug = input.slug.clone().unwrap_or_else(|| slugify(&input.name));
        ensure_unique(&self.pool, "categories", "slug", &slug, None).await?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            slug,
            description: input.description,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Replaces a category's editable fields.
    pub async fn update(&self, id: &str, input: CategoryInput) -> DbResult<Category> {
        let input = input.validate()?;
        let slug = input.slug.clone().unwrap_or_else(|| slugify(&input.name));

        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;
        ensure_unique(&self.pool, "categories", "slug", &slug, Some(id)).await?;

        let category = Category {
            name: input.name,
            slug,
            description: input.description,
            is_active: input.is_active,
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, slug = ?3, description = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(category_id = %id, "Category updated");
        Ok(category)
    }

    /// Deletes a category that no product references.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such category
    /// * `DbError::ForeignKeyViolation` - products still belong to it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if products > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("category {id} still has {products} product(s)"),
            });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Counts active categories.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
