//! # Reports & Listings
//!
//! Filters, pagination and aggregates shared by the sales ledger, the
//! reports screen and the dashboard.
//!
//! ## Filter Composition
//! ```text
//! SaleFilter { search, cashier_id, payment_method, date_from, date_to }
//!      │
//!      ▼
//! every present field adds one `AND` condition (conjunctive)
//!      │
//!      ▼
//! ORDER BY created_at DESC ── LIMIT per_page OFFSET (page-1)·per_page
//! ```
//!
//! Periods are inclusive ranges of business days (`sale_date`), so a daily
//! report and a one-day `date_from`/`date_to` listing agree.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, ProductView, Sale, SaleListItem, User};
use crate::validation::{validate_optional_text, ValidationResult};

/// Maximum length of a free-text search.
pub const MAX_SEARCH_LENGTH: usize = 100;

// =============================================================================
// Pagination
// =============================================================================

/// Default page size of listings.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest page a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn first_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page, per_page }
    }

    /// Rows per page, clamped to 1..=MAX_PER_PAGE.
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE) as i64
    }

    /// Rows to skip; page 0 is treated as page 1.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }
}

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let per_page = request.limit();
        let last_page = ((total.max(0) + per_page - 1) / per_page).max(1);
        Page {
            data,
            page: request.page.max(1),
            per_page: per_page as u32,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Filters of the sales ledger. All present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilter {
    /// Substring of the invoice number.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// First business day included.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Last business day included.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl SaleFilter {
    /// Trims the search, drops blanks and checks the date range order.
    pub fn validate(self) -> ValidationResult<Self> {
        let search = validate_optional_text("search", self.search.as_deref(), MAX_SEARCH_LENGTH)?;
        let cashier_id = self
            .cashier_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ValidationError::ExceedsLimit {
                    field: "date_from".to_string(),
                    limit: to.to_string(),
                });
            }
        }

        Ok(SaleFilter {
            search,
            cashier_id,
            ..self
        })
    }

    /// Restricts the filter to a report period.
    pub fn within(self, period: ReportPeriod) -> Self {
        SaleFilter {
            date_from: Some(period.start),
            date_to: Some(period.end),
            ..self
        }
    }
}

/// Filters of the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Matches SKU, name or barcode by prefix.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Only products at or below their threshold.
    #[serde(default)]
    pub low_stock: bool,
    /// `None` lists both active and inactive products.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductFilter {
    pub fn validate(self) -> ValidationResult<Self> {
        let search = validate_optional_text("search", self.search.as_deref(), MAX_SEARCH_LENGTH)?;
        let category_id = self
            .category_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Ok(ProductFilter {
            search,
            category_id,
            ..self
        })
    }
}

// =============================================================================
// Report Periods
// =============================================================================

/// Granularity of a sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Daily,
    Monthly,
}

/// An inclusive range of business days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub report_type: ReportType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// The period of `report_type` containing `date`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use kasir_core::report::{ReportPeriod, ReportType};
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
    /// let month = ReportPeriod::new(ReportType::Monthly, day);
    /// assert_eq!(month.start.to_string(), "2024-02-01");
    /// assert_eq!(month.end.to_string(), "2024-02-29");
    /// ```
    pub fn new(report_type: ReportType, date: NaiveDate) -> Self {
        match report_type {
            ReportType::Daily => ReportPeriod {
                report_type,
                start: date,
                end: date,
            },
            ReportType::Monthly => {
                let start = date.with_day(1).unwrap_or(date);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(date);
                ReportPeriod {
                    report_type,
                    start,
                    end,
                }
            }
        }
    }

    pub fn daily(date: NaiveDate) -> Self {
        ReportPeriod::new(ReportType::Daily, date)
    }

    pub fn monthly(date: NaiveDate) -> Self {
        ReportPeriod::new(ReportType::Monthly, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Count and amount of one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PaymentMethodTotal {
    pub count: i64,
    pub amount: Money,
}

/// Summary block of a sales report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_amount: Money,
    pub total_discount: Money,
    pub total_tax: Money,
    /// Only methods that occur in the period.
    pub payment_methods: BTreeMap<PaymentMethod, PaymentMethodTotal>,
}

impl SalesSummary {
    /// Folds a period's sales into the summary.
    pub fn from_sales<'a, I>(sales: I) -> Self
    where
        I: IntoIterator<Item = &'a Sale>,
    {
        let mut summary = SalesSummary::default();
        for sale in sales {
            summary.total_sales += 1;
            summary.total_amount += sale.total_amount;
            summary.total_discount += sale.discount_amount;
            summary.total_tax += sale.tax_amount;

            let method = summary
                .payment_methods
                .entry(sale.payment_method)
                .or_default();
            method.count += 1;
            method.amount += sale.total_amount;
        }
        summary
    }
}

/// The reports screen: the period, its sales, the summary and the cashiers
/// that can be filtered on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub period: ReportPeriod,
    pub sales: Vec<SaleListItem>,
    pub summary: SalesSummary,
    pub cashiers: Vec<User>,
}

/// Headline numbers of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub today_sales: Money,
    pub month_sales: Money,
    pub total_products: i64,
    pub low_stock_products: i64,
    pub total_categories: i64,
}

/// The dashboard screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_sales: Vec<SaleListItem>,
    pub low_stock_alerts: Vec<ProductView>,
}

/// Rows shown in each dashboard list.
pub const DASHBOARD_LIST_SIZE: i64 = 5;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(method: PaymentMethod, total: i64, discount: i64, tax: i64) -> Sale {
        Sale {
            id: "s".to_string(),
            invoice_number: "INV-20240115-0001".to_string(),
            user_id: "u".to_string(),
            subtotal: Money::from_units(total - tax),
            discount_amount: Money::from_units(discount),
            tax_amount: Money::from_units(tax),
            total_amount: Money::from_units(total),
            payment_method: method,
            amount_paid: Money::from_units(total),
            change_amount: Money::zero(),
            notes: None,
            sale_date: day(2024, 1, 15),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_request_offsets() {
        assert_eq!(PageRequest::default().offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(1, 1000).limit(), 100);
        assert_eq!(PageRequest::new(1, 0).limit(), 1);
    }

    #[test]
    fn test_page_last_page() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(1, 10), 21);
        assert_eq!(page.last_page, 3);
        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.last_page, 1);
        assert_eq!(page.map(|n| n * 2).data, vec![2, 4, 6]);
    }

    #[test]
    fn test_periods() {
        let daily = ReportPeriod::daily(day(2024, 1, 15));
        assert_eq!((daily.start, daily.end), (day(2024, 1, 15), day(2024, 1, 15)));

        let december = ReportPeriod::monthly(day(2023, 12, 31));
        assert_eq!(december.start, day(2023, 12, 1));
        assert_eq!(december.end, day(2023, 12, 31));
        assert!(december.contains(day(2023, 12, 15)));
        assert!(!december.contains(day(2024, 1, 1)));
    }

    #[test]
    fn test_sale_filter_validation() {
        let filter = SaleFilter {
            search: Some("  ".to_string()),
            cashier_id: Some(" u-1 ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.cashier_id.as_deref(), Some("u-1"));

        let reversed = SaleFilter {
            date_from: Some(day(2024, 2, 1)),
            date_to: Some(day(2024, 1, 1)),
            ..Default::default()
        };
        assert_eq!(reversed.validate().unwrap_err().field(), "date_from");
    }

    #[test]
    fn test_filter_within_period() {
        let filter = SaleFilter {
            payment_method: Some(PaymentMethod::Card),
            ..Default::default()
        }
        .within(ReportPeriod::monthly(day(2024, 1, 15)));
        assert_eq!(filter.date_from, Some(day(2024, 1, 1)));
        assert_eq!(filter.date_to, Some(day(2024, 1, 31)));
        assert_eq!(filter.payment_method, Some(PaymentMethod::Card));
    }

    #[test]
    fn test_summary_groups_by_payment_method() {
        let sales = [
            sale(PaymentMethod::Cash, 111_000, 0, 11_000),
            sale(PaymentMethod::Card, 55_500, 1_000, 5_500),
            sale(PaymentMethod::Cash, 22_200, 500, 2_200),
        ];
        let summary = SalesSummary::from_sales(&sales);

        assert_eq!(summary.total_sales, 3);
        assert_eq!(summary.total_amount, Money::from_units(188_700));
        assert_eq!(summary.total_discount, Money::from_units(1_500));
        assert_eq!(summary.total_tax, Money::from_units(18_700));

        let cash = summary.payment_methods[&PaymentMethod::Cash];
        assert_eq!(cash.count, 2);
        assert_eq!(cash.amount, Money::from_units(133_200));
        assert!(!summary.payment_methods.contains_key(&PaymentMethod::Ewallet));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["payment_methods"]["card"]["count"], 1);
    }
}
