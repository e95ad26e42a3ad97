//! # Validation Module
//!
//! Field-level validation rules for Kasir.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                       │
//! │  ├── Shape checks (types, enum values, 2-decimal money)                │
//! │  └── Rejected as VALIDATION_ERROR before a handler runs                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Input `validate()` methods (Rust)                            │
//! │  ├── Ranges, lengths, cross-field rules                                │
//! │  └── THIS MODULE: the individual rules                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (sku, barcode, slug, invoice_number)           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("ELEC-PHONE-001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::{MAX_LINE_QUANTITY, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of names, SKUs, barcodes and other short text columns.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maximum length of a product unit label ("pcs", "box", "kg").
pub const MAX_UNIT_LENGTH: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_required_text;
///
/// assert_eq!(validate_required_text("name", "  Kopi  ", 255).unwrap(), "Kopi");
/// assert!(validate_required_text("name", "   ", 255).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_length(field, value, max)?;
    Ok(value.to_string())
}

/// Validates an optional text field: trims it and maps blank to `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            validate_max_length(field, value, max)?;
            Ok(Some(value.to_string()))
        }
    }
}

fn validate_max_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 255 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_sku;
///
/// assert!(validate_sku("FOOD-RICE-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    let sku = validate_required_text("sku", sku, MAX_TEXT_LENGTH)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(sku)
}

/// Validates an optional barcode (EAN-13, UPC-A, internal codes).
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let barcode = validate_optional_text("barcode", barcode, MAX_TEXT_LENGTH)?;

    if let Some(code) = &barcode {
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidFormat {
                field: "barcode".to_string(),
                reason: "must contain only letters and digits".to_string(),
            });
        }
    }

    Ok(barcode)
}

/// Validates a category slug: lowercase ASCII letters, digits and single hyphens.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_slug;
///
/// assert!(validate_slug("food-beverage").is_ok());
/// assert!(validate_slug("Food & Beverage").is_err());
/// assert!(validate_slug("-leading").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<String> {
    let slug = validate_required_text("slug", slug, MAX_TEXT_LENGTH)?;

    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must be lowercase letters, digits and single hyphens".to_string(),
        });
    }

    Ok(slug)
}

/// Derives a slug from a display name ("Food & Beverage" → "food-beverage").
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Validates an ISO-4217 style currency code (three uppercase letters).
pub fn validate_currency(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter uppercase currency code".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Validates an optional email address. Only the basic `local@domain` shape is checked.
pub fn validate_email(field: &str, email: Option<&str>) -> ValidationResult<Option<String>> {
    let email = validate_optional_text(field, email, MAX_TEXT_LENGTH)?;

    if let Some(address) = &email {
        let valid = match address.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
        if !valid {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a valid email address".to_string(),
            });
        }
    }

    Ok(email)
}

/// Validates free-text sale notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    validate_optional_text("notes", notes, MAX_NOTES_LENGTH)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (99 999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount that may be zero but never negative.
///
/// ## Example
/// ```rust
/// use kasir_core::money::Money;
/// use kasir_core::validation::validate_non_negative_amount;
///
/// assert!(validate_non_negative_amount("retail_price", Money::from_cents(1099)).is_ok());
/// assert!(validate_non_negative_amount("retail_price", Money::zero()).is_ok());
/// assert!(validate_non_negative_amount("retail_price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock figure (stock_quantity, min_stock_level).
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate.
///
/// ## Rules
/// - Must be between 0 and 10000 bps (0% to 100%)
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > TaxRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID reference held in `field`.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert_eq!(validate_sku(" ELEC-PHONE-001 ").unwrap(), "ELEC-PHONE-001");
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_required_text_counts_characters() {
        // 255 multi-byte characters still fit
        let name = "é".repeat(255);
        assert!(validate_required_text("name", &name, MAX_TEXT_LENGTH).is_ok());
        assert_eq!(
            validate_required_text("unit", &"x".repeat(51), MAX_UNIT_LENGTH),
            Err(ValidationError::TooLong {
                field: "unit".to_string(),
                max: 50
            })
        );
    }

    #[test]
    fn test_validate_optional_text_blank_is_none() {
        assert_eq!(validate_optional_text("description", Some("  "), 10).unwrap(), None);
        assert_eq!(validate_optional_text("description", None, 10).unwrap(), None);
        assert!(validate_optional_text("description", Some("too long text"), 10).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(
            validate_barcode(Some("8991234567890")).unwrap(),
            Some("8991234567890".to_string())
        );
        assert_eq!(validate_barcode(Some("")).unwrap(), None);
        assert!(validate_barcode(Some("899-123")).is_err());
    }

    #[test]
    fn test_slugs() {
        assert_eq!(slugify("Food & Beverage"), "food-beverage");
        assert_eq!(slugify("  Health & Beauty!! "), "health-beauty");
        assert!(validate_slug("electronics").is_ok());
        assert!(validate_slug("home-garden-2").is_ok());
        assert!(validate_slug("Electronics").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("trailing-").is_err());
    }

    #[test]
    fn test_validate_currency() {
        assert_eq!(validate_currency("IDR").unwrap(), "IDR");
        assert!(validate_currency("idr").is_err());
        assert!(validate_currency("RUPIAH").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", Some("toko@example.com")).is_ok());
        assert_eq!(validate_email("email", None).unwrap(), None);
        assert!(validate_email("email", Some("not-an-email")).is_err());
        assert!(validate_email("email", Some("a@localhost")).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(99_999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(100_000).is_err());
    }

    #[test]
    fn test_validate_amounts_and_stock() {
        assert!(validate_non_negative_amount("amount_paid", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("amount_paid", Money::from_cents(-100)).is_err());
        assert!(validate_stock_level("stock_quantity", 0).is_ok());
        assert_eq!(
            validate_stock_level("min_stock_level", -1),
            Err(ValidationError::MustNotBeNegative {
                field: "min_stock_level".to_string()
            })
        );
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::zero()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(1100)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_000)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
