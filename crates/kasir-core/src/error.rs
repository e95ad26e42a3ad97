//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - Validation | StockInsufficient | Persistence   │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What the HTTP client sees (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, SKU, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::checkout::StockShortage;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are expected,
/// user-facing failures and carry enough context to explain themselves.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// One or more products cannot cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: 15 × Smartphone
    ///      │
    ///      ▼
    /// Check stock: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { shortages: [ELEC-PHONE-001: 10 < 15] }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Smartphone (ELEC-PHONE-001): available 10, requested 15"
    /// ```
    #[error("{}", describe_shortages(.shortages))]
    InsufficientStock { shortages: Vec<StockShortage> },
}

/// Joins every shortage into one message.
pub fn describe_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value exceeds another value it is bounded by.
    #[error("{field} must not exceed {limit}")]
    ExceedsLimit { field: String, limit: String },

    /// Invalid format (e.g., invalid UUID, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A referenced entity does not exist.
    #[error("{field} refers to unknown record '{id}'")]
    UnknownReference { field: String, id: String },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::ExceedsLimit { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::UnknownReference { field, .. } => field,
        }
    }

    /// Qualifies the field with a path prefix (`items.2` + `quantity`).
    pub fn nested(mut self, prefix: &str) -> Self {
        let field = self.field_mut();
        *field = format!("{prefix}.{field}");
        self
    }

    fn field_mut(&mut self) -> &mut String {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::ExceedsLimit { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::UnknownReference { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shortage(sku: &str, available: i64, requested: i64) -> StockShortage {
        StockShortage {
            product_id: format!("id-{sku}"),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            available,
            requested,
        }
    }

    #[test]
    fn test_insufficient_stock_lists_every_shortage() {
        let err = CoreError::InsufficientStock {
            shortages: vec![shortage("A-1", 10, 15), shortage("B-2", 0, 1)],
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Product A-1 (A-1): available 10, requested 15; \
             Insufficient stock for Product B-2 (B-2): available 0, requested 1"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");
        assert_eq!(err.field(), "sku");

        let err = ValidationError::ExceedsLimit {
            field: "discount_amount".to_string(),
            limit: "100.00".to_string(),
        };
        assert_eq!(err.to_string(), "discount_amount must not exceed 100.00");
    }

    #[test]
    fn test_nested_field_path() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .nested("items.2");
        assert_eq!(err.field(), "items.2.quantity");
        assert_eq!(err.to_string(), "items.2.quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
