//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is stored as i64 hundredths (cents / sen)               │
//! │    Every percentage is stored as u32 basis points (11% = 1100)          │
//! │                                                                         │
//! │  JSON BOUNDARY: fixed-point decimals with 2 fractional digits           │
//! │    "unit_price": 50000      → Money(5_000_000)                          │
//! │    "tax_rate":   "11.00"    → TaxRate(1100)                             │
//! │    "amount":     12.345     → rejected (more than 2 decimals)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! let total = price + Money::from_cents(500);
//!
//! assert_eq!(doubled.cents(), 2198);
//! assert_eq!(total.to_string(), "15.99");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use thiserror::Error;

/// Number of fractional digits carried by every amount and percentage.
pub const SCALE: u32 = 2;

/// Failure converting a decimal into a fixed-point value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    /// More fractional digits than the fixed-point scale allows.
    #[error("{0} has more than 2 fractional digits")]
    TooPrecise(Decimal),

    /// Value does not fit the integer representation.
    #[error("{0} is out of range")]
    OutOfRange(Decimal),
}

/// Converts a decimal to hundredths, refusing anything that would lose precision.
fn to_hundredths(value: Decimal) -> Result<i64, DecimalError> {
    if value.round_dp(SCALE) != value {
        return Err(DecimalError::TooPrecise(value));
    }

    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.to_i64())
        .ok_or(DecimalError::OutOfRange(value))
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in hundredths of the currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Negative values surface as validation errors instead
///   of silently wrapping
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde via Decimal**: `"111000.00"` on the wire, integer in memory
/// - **sqlx transparent**: stored as an INTEGER column
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.retail_price ──► CartLine.unit_price ──► PricedLine.total     │
/// │                                                                         │
/// │  Σ line totals − header discount = subtotal ──► tax ──► total_amount    │
/// │                                                                         │
/// │  amount_paid − total_amount ──► change_amount (never below zero)        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "Decimal", try_from = "Decimal")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from hundredths (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the fractional portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the value as a fixed-point decimal with 2 fractional digits.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, SCALE)
    }

    /// Parses a decimal amount, rejecting more than 2 fractional digits.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::from_decimal(Decimal::new(5000050, 2)).unwrap(); // 50000.50
    /// assert_eq!(price.cents(), 5_000_050);
    ///
    /// assert!(Money::from_decimal(Decimal::new(12345, 3)).is_err()); // 12.345
    /// ```
    pub fn from_decimal(value: Decimal) -> Result<Self, DecimalError> {
        to_hundredths(value).map(Money)
    }

    /// Calculates tax on this amount, rounding half up to the hundredth.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_cents(1000); // 10.00
    /// let rate = TaxRate::from_bps(825);      // 8.25%
    ///
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Overflow-checked multiplication by a quantity.
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Overflow-checked addition.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Overflow-checked subtraction.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Subtracts, flooring the result at zero.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let paid = Money::from_units(100);
    /// assert_eq!(paid.saturating_sub_floor_zero(Money::from_units(111)), Money::zero());
    /// assert_eq!(paid.saturating_sub_floor_zero(Money::from_units(60)), Money::from_units(40));
    /// ```
    pub fn saturating_sub_floor_zero(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the plain fixed-point value (`1234.50`).
///
/// Currency symbols are a presentation concern of the receipt renderer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DecimalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, which is exactly the 2-fractional-digit
/// percentage the store settings carry. 1100 bps = 11.00% (PPN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Decimal", try_from = "Decimal")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct TaxRate(u32);

impl TaxRate {
    /// 100.00% expressed in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the rate as a percentage decimal (`11.00`).
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0 as i64, SCALE)
    }

    /// Parses a percentage decimal, rejecting negatives and more than 2 decimals.
    pub fn from_percentage(value: Decimal) -> Result<Self, DecimalError> {
        let bps = to_hundredths(value)?;
        u32::try_from(bps)
            .map(TaxRate)
            .map_err(|_| DecimalError::OutOfRange(value))
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.to_decimal()
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = DecimalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        TaxRate::from_percentage(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
