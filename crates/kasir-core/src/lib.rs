//! # kasir-core: Pure Business Logic for Kasir
//!
//! This crate is the **heart** of Kasir. It contains the business rules of
//! the point of sale as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  │    POST /pos, /products, /sales, /reports, /dashboard           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (SQLite)                            │   │
//! │  │        repositories + CheckoutEngine (one transaction)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ checkout │ │ invoice │ │ report │  │   │
//! │  │   │ Product │ │  Money  │ │ CartLine │ │  Clock  │ │Receipt │  │   │
//! │  │   │  Sale   │ │ TaxRate │ │  Totals  │ │ INV-... │ │Summary │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, SaleItem, StoreSetting, User)
//! - [`money`] - Money and TaxRate with integer arithmetic (no floating point!)
//! - [`checkout`] - Cart validation, pricing and stock policy
//! - [`invoice`] - Invoice numbers and the injectable clock
//! - [`inventory`] - The low-stock predicate
//! - [`receipt`] - Receipt view model and thermal text rendering
//! - [`report`] - Report periods, filters, pagination and summaries
//! - [`validation`] - Field-level validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::{Money, TaxRate};
//!
//! // 2 × 50 000 at 11% tax
//! let subtotal = Money::from_cents(50_000_00).multiply_quantity(2);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1100));
//!
//! assert_eq!(tax, Money::from_cents(11_000_00));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod inventory;
pub mod invoice;
pub mod money;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CartLine, CheckoutRequest, CheckoutTotals, PricedLine, StockShortage};
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{Clock, FixedClock, SystemClock};
pub use money::{Money, TaxRate};
pub use receipt::Receipt;
pub use report::{Page, PageRequest, ReportPeriod, ReportType, SaleFilter, SalesSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single checkout.
///
/// Prevents runaway carts and keeps one checkout a reasonably sized
/// transaction.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i64 = 99_999;

/// Maximum length of the free-text sale notes.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Currency used when no store settings row exists.
pub const DEFAULT_CURRENCY: &str = "IDR";
