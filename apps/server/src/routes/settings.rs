//! Store settings.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use kasir_core::{StoreSetting, StoreSettingInput};

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).put(update))
}

/// `null` until the store has been configured.
async fn show(State(state): State<AppState>) -> ApiResult<Json<Option<StoreSetting>>> {
    Ok(Json(state.db.settings().get().await?))
}

async fn update(
    State(state): State<AppState>,
    payload: Result<Json<StoreSettingInput>, JsonRejection>,
) -> ApiResult<Json<StoreSetting>> {
    let Json(input) = payload?;
    let settings = state.db.settings().upsert(input).await?;
    tracing::info!(store_name = %settings.store_name, tax_rate = %settings.tax_rate, "Store settings updated");
    Ok(Json(settings))
}
