//! # User Repository
//!
//! Staff accounts. Authentication is out of scope; the server only needs to
//! resolve the acting cashier and list cashiers for report filters.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use kasir_core::{User, UserInput, UserRole};

use crate::error::DbResult;
use crate::repository::ensure_unique;

pub(crate) const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user that may currently ring up sales.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_active = 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists users by name, optionally of one role and/or only active ones.
    pub async fn list(&self, role: Option<UserRole>, active_only: bool) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE (?1 IS NULL OR role = ?1) AND (?2 = 0 OR is_active = 1) ORDER BY name"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Creates an active user.
    ///
    /// ## Errors
    /// * `DbError::Validation` - invalid input or email already registered
    pub async fn create(&self, input: UserInput) -> DbResult<User> {
        let input = input.validate()?;
        ensure_unique(&self.pool, "users", "email", &input.email, None).await?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            role: input.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        info!(user_id = %user.id, role = ?user.role, "User created");
        Ok(user)
    }

    /// Enables or disables a user. Their past sales are unaffected.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
