//! # Taquilla API
//!
//! HTTP server for the waiting room and ticket orders.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load ApiConfig ──► open SQLite pool (+ migrations)                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  QueueService / OrderService ──► router ──► axum::serve (HTTP_PORT)    │
//! │        │                                                                │
//! │        ├──► StaleTurnSweeper task          (when RUN_SWEEPER)           │
//! │        └──► completed-order listener task                               │
//! │                                                                         │
//! │  Ctrl+C / SIGTERM ──► drain HTTP ──► stop sweeper ──► close pool        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use taquilla_api::{router, ApiConfig, AppState};
use taquilla_db::Database;
use taquilla_engine::StaleTurnSweeper;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Taquilla API server...");

    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_path.display(),
        require_admission = config.require_admission,
        run_sweeper = config.run_sweeper,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("failed to open database")?;

    let state = AppState::from_config(db.clone(), &config);
    let engine = config.engine_config();

    let sweeper = if engine.run_sweeper {
        let (sweeper, handle) = StaleTurnSweeper::new(state.queues.clone(), engine.sweep_interval());
        Some((handle, tokio::spawn(sweeper.run())))
    } else {
        info!("Stale turn sweeper disabled on this instance");
        None
    };

    // Ticket delivery consumes completed orders downstream; here they are
    // only logged.
    let mut completed = state.orders.subscribe();
    let listener_task = tokio::spawn(async move {
        loop {
            match completed.recv().await {
                Ok(done) => info!(
                    order_id = %done.order.id,
                    client_id = %done.order.client_id,
                    tickets = done.order.ticket_count,
                    "Order ready for ticket delivery"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Completed-order listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some((handle, task)) = sweeper {
        handle.shutdown().await;
        if let Err(e) = task.await {
            error!(?e, "Sweeper task panicked");
        }
    }
    listener_task.abort();

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
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
                error!(?e, "Failed to install SIGTERM handler");
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
