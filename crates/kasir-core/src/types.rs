//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    Product      │   │  StoreSetting   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  category_id    │   │  tax_rate       │       │
//! │  │  slug           │   │  sku, barcode   │   │  currency       │       │
//! │  │  name           │   │  3 price tiers  │   │  receipt texts  │       │
//! │  └─────────────────┘   │  stock, min lvl │   │  printer blob   │       │
//! │                        └────────▲────────┘   └─────────────────┘       │
//! │                                 │ referenced, not owned                 │
//! │  ┌─────────────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │      User       │   │    SaleItem     │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  snapshots:     │   │  Cash           │       │
//! │  │  role           │   │  name, sku,     │   │  Card           │       │
//! │  └────────▲────────┘   │  unit_price     │   │  Transfer       │       │
//! │           │            └────────┬────────┘   │  Ewallet        │       │
//! │           │ cashier             │ owned      └─────────────────┘       │
//! │           │            ┌────────▼────────┐                              │
//! │           └────────────│      Sale       │  invoice INV-YYYYMMDD-NNNN   │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (sku, slug, invoice_number, email)
//!
//! ## Write Path
//! Every write goes through an explicit `*Input` struct whose `validate()`
//! returns the normalized input. Nothing is mass-assigned: repositories name
//! every persisted column.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::inventory;
use crate::money::{Money, TaxRate};
use crate::validation::{
    slugify, validate_barcode, validate_currency, validate_email, validate_non_negative_amount,
    validate_optional_text, validate_required_text, validate_sku, validate_slug,
    validate_stock_level, validate_tax_rate, validate_uuid, ValidationResult, MAX_TEXT_LENGTH,
    MAX_UNIT_LENGTH,
};
use crate::DEFAULT_CURRENCY;

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    /// URL-safe unique key ("food-beverage").
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CategoryInput {
    /// Validates and normalizes the input (trimmed text, derived slug).
    pub fn validate(self) -> ValidationResult<Self> {
        let name = validate_required_text("name", &self.name, MAX_TEXT_LENGTH)?;
        let slug = match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => validate_slug(slug)?,
            _ => validate_slug(&slugify(&name))?,
        };
        let description = validate_optional_text("description", self.description.as_deref(), 2000)?;

        Ok(CategoryInput {
            name,
            slug: Some(slug),
            description,
            is_active: self.is_active,
        })
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    pub category_id: String,

    pub wholesale_price: Money,
    pub retail_price: Money,
    pub reseller_price: Money,

    /// Units on hand. Only checkout and catalog edits change it.
    pub stock_quantity: i64,

    /// Low-stock threshold (inclusive).
    pub min_stock_level: i64,

    /// Unit label ("pcs", "box", "kg").
    pub unit: String,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether stock has reached the alert threshold.
    ///
    /// Delegates to [`inventory::is_low_stock`] so every display site agrees.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        inventory::is_low_stock(self.stock_quantity, self.min_stock_level)
    }

    /// Returns the price of the requested tier.
    pub fn price(&self, tier: PriceTier) -> Money {
        match tier {
            PriceTier::Wholesale => self.wholesale_price,
            PriceTier::Retail => self.retail_price,
            PriceTier::Reseller => self.reseller_price,
        }
    }
}

/// Which of the three product prices applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Wholesale,
    /// The POS screen sells at retail unless told otherwise.
    #[default]
    Retail,
    Reseller,
}

/// A product as displayed in lists: the row, its category name and the
/// computed low-stock badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub is_low_stock: bool,
}

impl ProductView {
    pub fn new(product: Product, category_name: Option<String>) -> Self {
        let is_low_stock = product.is_low_stock();
        ProductView {
            product,
            category_name,
            is_low_stock,
        }
    }
}

/// Create/update payload for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub category_id: String,
    pub wholesale_price: Money,
    pub retail_price: Money,
    pub reseller_price: Money,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_min_stock_level")]
    pub min_stock_level: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Alert threshold used when a product is created without one.
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 5;

fn default_min_stock_level() -> i64 {
    DEFAULT_MIN_STOCK_LEVEL
}

fn default_unit() -> String {
    "pcs".to_string()
}

impl ProductInput {
    /// Validates and normalizes the input.
    ///
    /// Uniqueness of SKU/barcode and existence of the category are checked
    /// by the store, which reports them as [`ValidationError::Duplicate`] and
    /// [`ValidationError::UnknownReference`].
    pub fn validate(self) -> ValidationResult<Self> {
        let name = validate_required_text("name", &self.name, MAX_TEXT_LENGTH)?;
        let description = validate_optional_text("description", self.description.as_deref(), 5000)?;
        let sku = validate_sku(&self.sku)?;
        let barcode = validate_barcode(self.barcode.as_deref())?;
        validate_uuid("category_id", &self.category_id)?;
        validate_non_negative_amount("wholesale_price", self.wholesale_price)?;
        validate_non_negative_amount("retail_price", self.retail_price)?;
        validate_non_negative_amount("reseller_price", self.reseller_price)?;
        validate_stock_level("stock_quantity", self.stock_quantity)?;
        validate_stock_level("min_stock_level", self.min_stock_level)?;
        let unit = validate_required_text("unit", &self.unit, MAX_UNIT_LENGTH)?;

        Ok(ProductInput {
            name,
            description,
            sku,
            barcode,
            unit,
            ..self
        })
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Cashier,
}

/// A staff member who can ring up sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserInput {
    pub fn validate(self) -> ValidationResult<Self> {
        let name = validate_required_text("name", &self.name, MAX_TEXT_LENGTH)?;
        let email = validate_email("email", Some(&self.email))?.ok_or(ValidationError::Required {
            field: "email".to_string(),
        })?;

        Ok(UserInput {
            name,
            email: email.to_lowercase(),
            role: self.role,
        })
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// The single store configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSetting {
    pub id: String,
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub store_email: Option<String>,
    /// Percentage applied to the subtotal at checkout.
    pub tax_rate: TaxRate,
    pub receipt_header: Option<String>,
    pub receipt_footer: Option<String>,
    pub currency: String,
    pub printer_name: Option<String>,
    /// Opaque printer configuration (paper_width, font_size, line_spacing),
    /// stored and returned unmodified.
    pub printer_settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreSetting {
    /// Tax rate in force: the configured one, or zero without a settings row.
    pub fn effective_tax_rate(setting: Option<&StoreSetting>) -> TaxRate {
        setting.map(|s| s.tax_rate).unwrap_or_default()
    }

    /// Currency in force: the configured one, or IDR without a settings row.
    pub fn effective_currency(setting: Option<&StoreSetting>) -> &str {
        setting
            .map(|s| s.currency.as_str())
            .unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Update payload for the store settings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettingInput {
    pub store_name: String,
    #[serde(default)]
    pub store_address: Option<String>,
    #[serde(default)]
    pub store_phone: Option<String>,
    #[serde(default)]
    pub store_email: Option<String>,
    #[serde(default)]
    pub tax_rate: TaxRate,
    #[serde(default)]
    pub receipt_header: Option<String>,
    #[serde(default)]
    pub receipt_footer: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub printer_name: Option<String>,
    #[serde(default)]
    pub printer_settings: Option<serde_json::Value>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl StoreSettingInput {
    pub fn validate(self) -> ValidationResult<Self> {
        let store_name = validate_required_text("store_name", &self.store_name, MAX_TEXT_LENGTH)?;
        let store_address = validate_optional_text("store_address", self.store_address.as_deref(), 1000)?;
        let store_phone = validate_optional_text("store_phone", self.store_phone.as_deref(), 50)?;
        let store_email = validate_email("store_email", self.store_email.as_deref())?;
        validate_tax_rate(self.tax_rate)?;
        let receipt_header =
            validate_optional_text("receipt_header", self.receipt_header.as_deref(), MAX_TEXT_LENGTH)?;
        let receipt_footer =
            validate_optional_text("receipt_footer", self.receipt_footer.as_deref(), MAX_TEXT_LENGTH)?;
        let currency = validate_currency(&self.currency)?;
        let printer_name =
            validate_optional_text("printer_name", self.printer_name.as_deref(), MAX_TEXT_LENGTH)?;

        let printer_settings = match self.printer_settings {
            None | Some(serde_json::Value::Null) => None,
            Some(value @ serde_json::Value::Object(_)) => Some(value),
            Some(_) => {
                return Err(ValidationError::InvalidFormat {
                    field: "printer_settings".to_string(),
                    reason: "must be a JSON object".to_string(),
                })
            }
        };

        Ok(StoreSettingInput {
            store_name,
            store_address,
            store_phone,
            store_email,
            tax_rate: self.tax_rate,
            receipt_header,
            receipt_footer,
            currency,
            printer_name,
            printer_settings,
        })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Ewallet,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Ewallet,
    ];

    /// Wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Ewallet => "ewallet",
        }
    }

    /// Human label printed on receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Transfer => "Bank Transfer",
            PaymentMethod::Ewallet => "E-Wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Immutable once created.
///
/// ## Invariants
/// - `total_amount == subtotal + tax_amount`
/// - `change_amount == max(0, amount_paid - total_amount)`
/// - `discount_amount` is the header discount plus every line discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// `INV-YYYYMMDD-NNNN`, unique.
    pub invoice_number: String,
    /// Cashier who rang the sale.
    pub user_id: String,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub amount_paid: Money,
    pub change_amount: Money,
    pub notes: Option<String>,
    /// Business day the invoice number was issued for.
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// SKU at time of sale (frozen).
    pub product_sku: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    pub discount_amount: Money,
    /// `quantity × unit_price − discount_amount`.
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

/// A sale with its line items and cashier, as returned by checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub cashier: User,
}

/// A sale as listed in the ledger, with the cashier's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleListItem {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub cashier_name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
