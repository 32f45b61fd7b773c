//! HTTP server bootstrap and graceful shutdown.

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use crate::TRACING_TARGET_SERVER;

/// Binds the listener and serves until interrupted.
pub async fn serve(router: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!(
        target: TRACING_TARGET_SERVER,
        address = %bind_address,
        "Server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SERVER,
            error = %error,
            "Failed to install shutdown signal handler"
        );
        return;
    }

    tracing::info!(target: TRACING_TARGET_SERVER, "Shutdown signal received");
}
