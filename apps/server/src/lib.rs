//! # kasir-server: HTTP/JSON surface of the Kasir point of sale
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Flow                                     │
//! │                                                                         │
//! │  Client ──► TraceLayer ──► CorsLayer ──► Router                        │
//! │                                            │                            │
//! │              ┌─────────────────────────────┼──────────────────────┐     │
//! │              ▼                             ▼                      ▼     │
//! │   routes::pos (checkout)        routes::products ...     routes::health │
//! │              │                             │                            │
//! │              ▼                             ▼                            │
//! │   kasir_db::CheckoutEngine        kasir_db::Database (repositories)    │
//! │                                                                         │
//! │  Every handler returns Result<_, ApiError>; see [`error`].             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Routes
//! | Method | Path                    | Purpose                              |
//! |--------|-------------------------|--------------------------------------|
//! | GET    | /health-check           | Liveness and database reachability   |
//! | GET    | /dashboard              | Headline numbers and alerts          |
//! | GET    | /pos                    | Products, categories, store settings |
//! | POST   | /pos                    | Checkout (needs `X-Cashier-Id`)      |
//! | *      | /products, /categories  | Catalog management                   |
//! | GET    | /sales, /sales/{id}     | Sales ledger and receipts            |
//! | GET    | /reports                | Daily / monthly sales report         |
//! | GET/PUT| /settings               | Store settings                       |

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use kasir_core::Clock;
use kasir_db::{CheckoutEngine, Database};

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub checkout: Arc<CheckoutEngine>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds the state; checkouts and "today" both read `clock`.
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: ServerConfig) -> Self {
        let checkout = Arc::new(db.checkout_engine(clock.clone()));
        AppState {
            db,
            checkout,
            clock,
            config: Arc::new(config),
        }
    }
}

/// The full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::dashboard::router())
        .merge(routes::pos::router())
        .merge(routes::products::router())
        .merge(routes::categories::router())
        .merge(routes::sales::router())
        .merge(routes::reports::router())
        .merge(routes::settings::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
