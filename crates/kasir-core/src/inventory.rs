//! # Inventory
//!
//! The low-stock rule. Product lists, the dashboard badge and the alert list
//! all go through [`is_low_stock`]; the SQL filters in kasir-db express the
//! same comparison (`stock_quantity <= min_stock_level`).

/// A product is low on stock once it is at or below its threshold.
///
/// ## Example
/// ```rust
/// use kasir_core::inventory::is_low_stock;
///
/// assert!(is_low_stock(5, 5));
/// assert!(!is_low_stock(6, 5));
/// ```
#[inline]
pub const fn is_low_stock(stock_quantity: i64, min_stock_level: i64) -> bool {
    stock_quantity <= min_stock_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_low_stock() {
        assert!(is_low_stock(0, 0));
        assert!(is_low_stock(3, 5));
        assert!(is_low_stock(5, 5));
        assert!(!is_low_stock(6, 5));
        assert!(!is_low_stock(1, 0));
    }
}
