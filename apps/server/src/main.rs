//! # Kasir Server
//!
//! HTTP/JSON server of the Kasir point of sale.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir Server                                     │
//! │                                                                         │
//! │  Till / browser ───► HTTP (8080) ───► Router ───► SQLite (WAL)         │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                   CheckoutEngine                        │
//! │                                (one transaction per sale)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Environment
//! `KASIR_HOST`, `KASIR_PORT`, `KASIR_DATABASE_PATH`, `KASIR_DB_MAX_CONNECTIONS`,
//! `KASIR_RUN_MIGRATIONS`, `KASIR_PAGE_SIZE`; log filter in `RUST_LOG`.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kasir_core::SystemClock;
use kasir_db::Database;
use kasir_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kasir=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Kasir server...");

    // Load configuration
    let config = ServerConfig::load().context("invalid server configuration")?;
    info!(
        addr = %config.socket_addr(),
        database = %config.database_path.display(),
        page_size = config.page_size,
        "Configuration loaded"
    );

    // Open the database (runs migrations unless disabled)
    let db = Database::new(config.db_config())
        .await
        .context("failed to open the database")?;

    let addr = config.socket_addr();
    let state = AppState::new(db.clone(), Arc::new(SystemClock), config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
