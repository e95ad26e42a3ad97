//! # Point of Sale
//!
//! `GET /pos` loads everything the till screen needs; `POST /pos` rings up
//! a sale and answers with its receipt.
//!
//! ```text
//! POST /pos  (X-Cashier-Id: <user id>)
//! {
//!   "items": [{ "product_id": "…", "quantity": 2, "unit_price": "50000.00" }],
//!   "payment_method": "cash",
//!   "amount_paid": "150000.00"
//! }
//!
//! 201 Created   → Receipt (sale, items, cashier, store_settings)
//! 409 Conflict  → INSUFFICIENT_STOCK with one detail per short product
//! 422           → VALIDATION_ERROR
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use kasir_core::{Category, CheckoutRequest, ProductView, Receipt, StoreSetting};

use crate::error::ApiResult;
use crate::extract::CurrentCashier;
use crate::AppState;

/// Data of the till screen.
#[derive(Debug, Serialize)]
pub struct PosScreen {
    pub products: Vec<ProductView>,
    /// Categories that have at least one active product.
    pub categories: Vec<Category>,
    pub store_settings: Option<StoreSetting>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/pos", get(screen).post(checkout))
}

async fn screen(State(state): State<AppState>) -> ApiResult<Json<PosScreen>> {
    let products = state.db.products().list_for_pos().await?;
    let categories = state.db.categories().list_with_active_products().await?;
    let store_settings = state.db.settings().get().await?;

    Ok(Json(PosScreen {
        products,
        categories,
        store_settings,
    }))
}

async fn checkout(
    State(state): State<AppState>,
    CurrentCashier(cashier): CurrentCashier,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let Json(request) = payload?;

    let detail = state.checkout.checkout(&cashier.id, request).await?;
    // The sale is committed at this point; a settings read failure must not
    // turn it into an error response.
    let store_settings = match state.db.settings().get().await {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(%err, invoice_number = %detail.sale.invoice_number, "Receipt without store settings");
            None
        }
    };

    Ok((StatusCode::CREATED, Json(Receipt::new(detail, store_settings))))
}
