//! Sales ledger and receipts.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use kasir_core::{Page, Receipt, SaleFilter, SaleListItem};

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list))
        .route("/sales/{id}", get(show))
        .route("/sales/{id}/receipt", get(receipt_text))
}

/// Newest first; `search` matches part of the invoice number.
async fn list(
    State(state): State<AppState>,
    filter: Result<Query<SaleFilter>, QueryRejection>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<SaleListItem>>> {
    let Query(filter) = filter?;
    let Query(page) = page?;
    Ok(Json(state.db.sales().list(filter, page.resolve(&state)).await?))
}

async fn load_receipt(state: &AppState, id: &str) -> ApiResult<Receipt> {
    let detail = state
        .db
        .sales()
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;
    let store_settings = state.db.settings().get().await?;
    Ok(Receipt::new(detail, store_settings))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Receipt>> {
    Ok(Json(load_receipt(&state, &id).await?))
}

/// The thermal-printer rendering, sized from `printer_settings.paper_width`.
async fn receipt_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let receipt = load_receipt(&state, &id).await?;
    let text = receipt.render_text(receipt.columns());
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
