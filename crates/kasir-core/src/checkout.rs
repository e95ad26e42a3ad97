//! # Checkout Module
//!
//! Cart validation, pricing and stock policy for a checkout.
//!
//! Everything here is pure: the storage layer loads products and settings,
//! calls into this module, and persists what it returns inside one
//! transaction.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         price_cart()                                    │
//! │                                                                         │
//! │  CartLine { qty, unit_price, discount }                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  line total = qty × unit_price − line discount      (per line)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal   = Σ line totals − header discount                           │
//! │  discount   = header discount + Σ line discounts    (stored on Sale)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax        = subtotal × rate   (half-up to the minor unit)             │
//! │  total      = subtotal + tax                                            │
//! │  change     = max(0, amount_paid − total)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Policy
//! Demand is summed per product across all lines (the same product may
//! appear twice in a cart) and compared with the persisted stock. Every
//! short product is reported, not just the first one.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::{PaymentMethod, Product};
use crate::validation::{
    validate_non_negative_amount, validate_notes, validate_quantity, validate_uuid,
    ValidationResult,
};
use crate::MAX_CART_LINES;

// =============================================================================
// Request Types
// =============================================================================

/// One line of the cart as submitted by the POS screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Price agreed at the counter; stored as the sale item's snapshot.
    pub unit_price: Money,
    #[serde(default)]
    pub discount_amount: Money,
}

/// The checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub amount_paid: Money,
    /// Header-level discount applied to the whole sale.
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Checks the request shape before anything touches storage.
    ///
    /// ## Rules
    /// - 1 to MAX_CART_LINES lines
    /// - each product_id is a UUID, quantity 1..=MAX_LINE_QUANTITY
    /// - every amount is non-negative
    /// - notes at most MAX_NOTES_LENGTH characters
    ///
    /// Cross-line limits (discounts bounded by line totals) are checked by
    /// [`price_cart`], which has the totals at hand.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        if self.items.len() > MAX_CART_LINES {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            });
        }

        for (index, line) in self.items.iter().enumerate() {
            line.validate()
                .map_err(|err| err.nested(&format!("items.{index}")))?;
        }

        validate_non_negative_amount("amount_paid", self.amount_paid)?;
        validate_non_negative_amount("discount_amount", self.discount_amount)?;
        validate_notes(self.notes.as_deref())?;

        Ok(())
    }

    /// Notes trimmed, with blank mapped to `None`.
    pub fn normalized_notes(&self) -> ValidationResult<Option<String>> {
        validate_notes(self.notes.as_deref())
    }
}

impl CartLine {
    fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_non_negative_amount("unit_price", self.unit_price)?;
        validate_non_negative_amount("discount_amount", self.discount_amount)?;
        Ok(())
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// A cart line with its computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount_amount: Money,
    /// `quantity × unit_price − discount_amount`.
    pub total_price: Money,
}

/// Every monetary figure of a sale, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutTotals {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    /// Header discount plus all line discounts.
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub change_amount: Money,
}

impl CheckoutTotals {
    /// Whether the customer handed over less than the total.
    ///
    /// Underpayment is recorded as-is; change simply floors at zero.
    pub fn is_underpaid(&self) -> bool {
        self.amount_paid < self.total_amount
    }
}

fn amount_overflow(field: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "amount is too large".to_string(),
    }
}

/// Validates the request and computes all totals at the given tax rate.
///
/// ## Example
/// ```rust
/// use kasir_core::checkout::{price_cart, CartLine, CheckoutRequest};
/// use kasir_core::money::{Money, TaxRate};
/// use kasir_core::types::PaymentMethod;
///
/// let request = CheckoutRequest {
///     items: vec![CartLine {
///         product_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
///         quantity: 2,
///         unit_price: Money::from_units(50_000),
///         discount_amount: Money::zero(),
///     }],
///     payment_method: PaymentMethod::Cash,
///     amount_paid: Money::from_units(150_000),
///     discount_amount: Money::zero(),
///     notes: None,
/// };
///
/// let totals = price_cart(&request, TaxRate::from_bps(1100)).unwrap();
/// assert_eq!(totals.total_amount, Money::from_units(111_000));
/// assert_eq!(totals.change_amount, Money::from_units(39_000));
/// ```
pub fn price_cart(request: &CheckoutRequest, tax_rate: TaxRate) -> CoreResult<CheckoutTotals> {
    request.validate()?;

    let mut lines = Vec::with_capacity(request.items.len());
    let mut lines_total = Money::zero();
    let mut line_discounts = Money::zero();

    for (index, line) in request.items.iter().enumerate() {
        let prefix = format!("items.{index}");
        let gross = line
            .unit_price
            .checked_mul_quantity(line.quantity)
            .ok_or_else(|| amount_overflow(&format!("{prefix}.unit_price")))?;

        if line.discount_amount > gross {
            return Err(ValidationError::ExceedsLimit {
                field: format!("{prefix}.discount_amount"),
                limit: gross.to_string(),
            }
            .into());
        }

        let total_price = gross - line.discount_amount;
        lines_total = lines_total
            .checked_add(total_price)
            .ok_or_else(|| amount_overflow("items"))?;
        line_discounts = line_discounts
            .checked_add(line.discount_amount)
            .ok_or_else(|| amount_overflow("discount_amount"))?;

        lines.push(PricedLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount_amount: line.discount_amount,
            total_price,
        });
    }

    if request.discount_amount > lines_total {
        return Err(ValidationError::ExceedsLimit {
            field: "discount_amount".to_string(),
            limit: lines_total.to_string(),
        }
        .into());
    }

    let subtotal = lines_total - request.discount_amount;
    let tax_amount = subtotal.calculate_tax(tax_rate);
    let total_amount = subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| amount_overflow("items"))?;
    let discount_amount = request
        .discount_amount
        .checked_add(line_discounts)
        .ok_or_else(|| amount_overflow("discount_amount"))?;

    Ok(CheckoutTotals {
        lines,
        subtotal,
        discount_amount,
        tax_amount,
        total_amount,
        amount_paid: request.amount_paid,
        change_amount: request.amount_paid.saturating_sub_floor_zero(total_amount),
    })
}

// =============================================================================
// Stock Policy
// =============================================================================

/// Total quantity requested of one product across the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDemand {
    pub product_id: String,
    pub quantity: i64,
    /// Index of the first cart line naming this product.
    pub first_line: usize,
}

/// Sums quantities per product, keeping first-appearance order.
pub fn aggregate_demand(lines: &[CartLine]) -> Vec<ProductDemand> {
    let mut demand: Vec<ProductDemand> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, line) in lines.iter().enumerate() {
        match positions.get(line.product_id.as_str()) {
            Some(&position) => demand[position].quantity += line.quantity,
            None => {
                positions.insert(line.product_id.as_str(), demand.len());
                demand.push(ProductDemand {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    first_line: index,
                });
            }
        }
    }

    demand
}

/// A product that cannot cover the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub available: i64,
    pub requested: i64,
}

impl fmt::Display for StockShortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Insufficient stock for {} ({}): available {}, requested {}",
            self.name, self.sku, self.available, self.requested
        )
    }
}

/// Checks demand against the persisted stock.
///
/// ## Returns
/// * `Ok(())` - every product covers its demand
/// * `Err(CoreError::Validation(UnknownReference))` - a product does not exist
/// * `Err(CoreError::InsufficientStock)` - one entry per short product
pub fn check_stock<'a, F>(demand: &[ProductDemand], lookup: F) -> CoreResult<()>
where
    F: Fn(&str) -> Option<&'a Product>,
{
    let mut shortages = Vec::new();

    for wanted in demand {
        let product = lookup(&wanted.product_id).ok_or_else(|| ValidationError::UnknownReference {
            field: format!("items.{}.product_id", wanted.first_line),
            id: wanted.product_id.clone(),
        })?;

        if product.stock_quantity < wanted.quantity {
            shortages.push(StockShortage {
                product_id: product.id.clone(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                available: product.stock_quantity,
                requested: wanted.quantity,
            });
        }
    }

    if shortages.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InsufficientStock { shortages })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
