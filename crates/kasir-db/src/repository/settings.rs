//! # Settings Repository
//!
//! The store configuration is a single row. Reads return `None` until it is
//! saved for the first time; writes upsert it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use kasir_core::{StoreSetting, StoreSettingInput, TaxRate};

use crate::error::{DbError, DbResult};

const SETTING_COLUMNS: &str = "id, store_name, store_address, store_phone, store_email, tax_rate, \
     receipt_header, receipt_footer, currency, printer_name, printer_settings, created_at, updated_at";

/// Row shape of `store_settings`; `printer_settings` is stored as JSON text.
#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    id: String,
    store_name: String,
    store_address: Option<String>,
    store_phone: Option<String>,
    store_email: Option<String>,
    tax_rate: TaxRate,
    receipt_header: Option<String>,
    receipt_footer: Option<String>,
    currency: String,
    printer_name: Option<String>,
    printer_settings: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingRow> for StoreSetting {
    type Error = DbError;

    fn try_from(row: SettingRow) -> Result<Self, Self::Error> {
        let printer_settings = row
            .printer_settings
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DbError::Internal(format!("corrupt printer_settings: {e}")))?;

        Ok(StoreSetting {
            id: row.id,
            store_name: row.store_name,
            store_address: row.store_address,
            store_phone: row.store_phone,
            store_email: row.store_email,
            tax_rate: row.tax_rate,
            receipt_header: row.receipt_header,
            receipt_footer: row.receipt_footer,
            currency: row.currency,
            printer_name: row.printer_name,
            printer_settings,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for the store settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// The store settings, if they were ever saved.
    pub async fn get(&self) -> DbResult<Option<StoreSetting>> {
        let sql = format!("SELECT {SETTING_COLUMNS} FROM store_settings ORDER BY created_at LIMIT 1");
        let row = sqlx::query_as::<_, SettingRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        row.map(StoreSetting::try_from).transpose()
    }

    /// Saves the settings, creating the row on first use.
    pub async fn upsert(&self, input: StoreSettingInput) -> DbResult<StoreSetting> {
        let input = input.validate()?;
        let existing = self.get().await?;

        let now = Utc::now();
        let (id, created_at) = match &existing {
            Some(current) => (current.id.clone(), current.created_at),
            None => (Uuid::new_v4().to_string(), now),
        };
        let printer_json = input
            .printer_settings
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO store_settings (
                id, store_name, store_address, store_phone, store_email, tax_rate,
                receipt_header, receipt_footer, currency, printer_name, printer_settings,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                store_name = excluded.store_name,
                store_address = excluded.store_address,
                store_phone = excluded.store_phone,
                store_email = excluded.store_email,
                tax_rate = excluded.tax_rate,
                receipt_header = excluded.receipt_header,
                receipt_footer = excluded.receipt_footer,
                currency = excluded.currency,
                printer_name = excluded.printer_name,
                printer_settings = excluded.printer_settings,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&input.store_name)
        .bind(&input.store_address)
        .bind(&input.store_phone)
        .bind(&input.store_email)
        .bind(input.tax_rate)
        .bind(&input.receipt_header)
        .bind(&input.receipt_footer)
        .bind(&input.currency)
        .bind(&input.printer_name)
        .bind(&printer_json)
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(tax_rate = %input.tax_rate, currency = %input.currency, "Store settings saved");

        Ok(StoreSetting {
            id,
            store_name: input.store_name,
            store_address: input.store_address,
            store_phone: input.store_phone,
            store_email: input.store_email,
            tax_rate: input.tax_rate,
            receipt_header: input.receipt_header,
            receipt_footer: input.receipt_footer,
            currency: input.currency,
            printer_name: input.printer_name,
            printer_settings: input.printer_settings,
            created_at,
            updated_at: now,
        })
    }
}
