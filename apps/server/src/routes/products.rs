//! Product catalog endpoints.
//!
//! Deleting a product deactivates it: sale items keep pointing at it and the
//! POS screen stops offering it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use kasir_core::report::{ProductFilter, MAX_PER_PAGE};
use kasir_core::{Page, Product, ProductInput, ProductView};

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/low-stock", get(low_stock))
        .route("/products/lookup", get(lookup))
        .route("/products/{id}", get(show).put(update).delete(destroy))
}

async fn list(
    State(state): State<AppState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<ProductView>>> {
    let Query(filter) = filter?;
    let Query(page) = page?;

    let products = state.db.products().list(filter, page.resolve(&state)).await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct LowStockQuery {
    #[serde(default)]
    limit: Option<u32>,
}

async fn low_stock(
    State(state): State<AppState>,
    query: Result<Query<LowStockQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(state.config.page_size).clamp(1, MAX_PER_PAGE);
    Ok(Json(state.db.products().low_stock(i64::from(limit)).await?))
}

/// `?sku=` or `?barcode=`, as typed or scanned at the till.
#[derive(Debug, Deserialize)]
struct LookupQuery {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
}

async fn lookup(
    State(state): State<AppState>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> ApiResult<Json<Product>> {
    let Query(query) = query?;
    let repo = state.db.products();

    let (found, code) = match (query.sku, query.barcode) {
        (Some(sku), None) => (repo.get_by_sku(sku.trim()).await?, sku),
        (None, Some(barcode)) => (repo.get_by_barcode(barcode.trim()).await?, barcode),
        _ => return Err(ApiError::validation("Pass exactly one of sku or barcode")),
    };

    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &code))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductView>> {
    state
        .db
        .products()
        .get_view(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    let product = state.db.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(input) = payload?;
    Ok(Json(state.db.products().update(&id, input).await?))
}

async fn destroy(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
