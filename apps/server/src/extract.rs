//! Request extractors shared by the handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use kasir_core::User;

use crate::error::ApiError;
use crate::AppState;

/// Header naming the cashier who operates the till.
pub const CASHIER_HEADER: &str = "x-cashier-id";

/// The active user named by the `X-Cashier-Id` header.
///
/// Rejects with 401 when the header is missing or names an unknown or
/// deactivated user. Password and session handling live in front of this
/// service.
#[derive(Debug, Clone)]
pub struct CurrentCashier(pub User);

impl FromRequestParts<AppState> for CurrentCashier {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CASHIER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing X-Cashier-Id header"))?;

        match state.db.users().get_active(id).await? {
            Some(user) => Ok(CurrentCashier(user)),
            None => {
                tracing::debug!(cashier_id = %id, "Rejected unknown or inactive cashier");
                Err(ApiError::unauthorized("Unknown or inactive cashier"))
            }
        }
    }
}
