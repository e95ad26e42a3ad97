//! # Report Repository
//!
//! Read-only aggregates for the reports screen and the dashboard. Both are
//! computed from the sale ledger and the catalog; nothing here writes.
//!
//! ```text
//! sales_report(type, date, filter)
//!   └── ReportPeriod (day or calendar month containing `date`)
//!        └── ledger rows in period ∧ filter ──► SalesSummary::from_sales
//!
//! dashboard(today)
//!   ├── today_sales / month_sales   SUM(total_amount) by business day
//!   ├── product, low-stock and category counts
//!   └── 5 most recent sales, 5 lowest-stock products
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use kasir_core::report::{
    Dashboard, DashboardStats, ReportPeriod, ReportType, SaleFilter, SalesReport, SalesSummary,
    DASHBOARD_LIST_SIZE,
};
use kasir_core::UserRole;

use crate::error::DbResult;
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;

/// Repository for reports and the dashboard.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Sales of the day or month containing `date`, narrowed by `filter`.
    ///
    /// The filter's own date range is replaced by the period.
    pub async fn sales_report(
        &self,
        report_type: ReportType,
        date: NaiveDate,
        filter: SaleFilter,
    ) -> DbResult<SalesReport> {
        let period = ReportPeriod::new(report_type, date);
        debug!(?period, "Building sales report");

        let sales = self.sales().list_all(filter.within(period)).await?;
        let summary = SalesSummary::from_sales(sales.iter().map(|item| &item.sale));
        let cashiers = UserRepository::new(self.pool.clone())
            .list(Some(UserRole::Cashier), true)
            .await?;

        Ok(SalesReport {
            period,
            sales,
            summary,
            cashiers,
        })
    }

    /// The dashboard as of business day `today`.
    pub async fn dashboard(&self, today: NaiveDate) -> DbResult<Dashboard> {
        let month = ReportPeriod::monthly(today);
        let sales = self.sales();
        let products = ProductRepository::new(self.pool.clone());

        let stats = DashboardStats {
            today_sales: sales.total_between(today, today).await?,
            month_sales: sales.total_between(month.start, month.end).await?,
            total_products: products.count_active().await?,
            low_stock_products: products.count_low_stock().await?,
            total_categories: CategoryRepository::new(self.pool.clone())
                .count_active()
                .await?,
        };

        Ok(Dashboard {
            stats,
            recent_sales: sales.recent(DASHBOARD_LIST_SIZE).await?,
            low_stock_alerts: products.low_stock(DASHBOARD_LIST_SIZE).await?,
        })
    }
}
