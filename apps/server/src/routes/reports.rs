//! Sales reports.
//!
//! ```text
//! GET /reports?type=monthly&date=2024-01-15&payment_method=cash
//!   → period 2024-01-01..2024-01-31, its cash sales, summary, cashiers
//! ```

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use kasir_core::report::SalesReport;
use kasir_core::{Clock, PaymentMethod, ReportType, SaleFilter};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default, rename = "type")]
    pub report_type: ReportType,
    /// Any day inside the period; today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", get(sales_report))
}

async fn sales_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> ApiResult<Json<SalesReport>> {
    let Query(query) = query?;
    let date = query.date.unwrap_or_else(|| state.clock.today());
    let filter = SaleFilter {
        cashier_id: query.cashier_id,
        payment_method: query.payment_method,
        ..SaleFilter::default()
    };

    let report = state
        .db
        .reports()
        .sales_report(query.report_type, date, filter)
        .await?;
    Ok(Json(report))
}
