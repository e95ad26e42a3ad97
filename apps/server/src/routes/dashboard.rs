use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use kasir_core::report::Dashboard;
use kasir_core::Clock;

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(show))
}

async fn show(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    let today = state.clock.today();
    Ok(Json(state.db.reports().dashboard(today).await?))
}
