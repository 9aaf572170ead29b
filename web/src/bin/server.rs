//! Brewspace HTTP server.
//!
//! Connects to `PostgreSQL`, applies migrations, and serves the settlement
//! API until SIGINT/SIGTERM.

use anyhow::Context;
use brewspace_core::{SettlementEngine, SystemClock};
use brewspace_web::{AppState, Config, build_router, telemetry};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    telemetry::init_tracing(&config.server.log_level)?;

    info!("Starting Brewspace server");
    info!(
        server_addr = %config.server_addr(),
        max_connections = config.database.max_connections,
        cancellation_notice_hours = config.settlement.cancellation_notice_hours,
        "Configuration loaded"
    );

    telemetry::install_metrics_exporter(&config.server.metrics_host, config.server.metrics_port)?;

    info!("Connecting to database...");
    let pool = brewspace_postgres::connect(&config.database.url, &config.pool_settings())
        .await
        .context("Database connection failed")?;
    brewspace_postgres::migrate(&pool)
        .await
        .context("Database migration failed")?;
    info!("Database ready");

    let environment = brewspace_postgres::environment(&pool, Arc::new(SystemClock));
    let engine = SettlementEngine::new(environment).with_policy(config.policy());
    let app = build_router(AppState::new(engine).with_database(pool.clone()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("Server task failed")??;
            warn!("Server exited without a shutdown signal");
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(());
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    match tokio::time::timeout(timeout, server).await {
        Ok(Ok(Ok(()))) => info!("Server stopped"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task failed during shutdown"),
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout,
            "Graceful shutdown timed out, dropping in-flight requests"
        ),
    }

    pool.close().await;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully..."),
        () = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
