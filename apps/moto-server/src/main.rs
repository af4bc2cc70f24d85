//! # Moto Dealer Server
//!
//! Binary entry point: configuration, database, HTTP.
//!
//! ```text
//! ServerConfig::load ──► Database::new (migrations) ──► AppState
//!                                                          │
//!                                                          ▼
//!                                               axum::serve(router)
//!                                                          │
//!                                    Ctrl+C / SIGTERM ──► graceful shutdown
//! ```

use anyhow::Context;
use moto_db::{Database, DbConfig};
use moto_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,moto_server=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Moto Dealer server...");

    let config = ServerConfig::load().context("failed to load configuration")?;
    info!(
        address = %config.bind_address(),
        database = %config.database_path,
        in_memory = config.in_memory_database,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set MOTO_JWT_SECRET in production");
    }

    let db_config = if config.in_memory_database {
        DbConfig::in_memory()
    } else {
        DbConfig::new(&config.database_path).max_connections(config.max_connections)
    };
    let db = Database::new(db_config)
        .await
        .context("failed to open database")?;
    info!("Database ready");

    let address = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "Listening");

    axum::serve(listener, app)
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
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
