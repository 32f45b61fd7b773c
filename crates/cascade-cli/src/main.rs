#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use aide::openapi::OpenApi;
use anyhow::Context;
use axum::Extension;
use axum::Router;
use cascade_server::handler;
use cascade_server::service::ServiceState;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_SERVER: &str = "cascade_cli::server";
pub const TRACING_TARGET_CONFIG: &str = "cascade_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    tracing::info!(
        target: TRACING_TARGET_CONFIG,
        bind = %cli.bind_address(),
        callback_timeout_secs = cli.service.callback_timeout_secs,
        max_content_length = cli.service.max_content_length,
        "Starting cascade"
    );

    let state = ServiceState::from_config(&cli.service)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))
        .context("failed to create service state")?;

    let router = create_router(state, &cli);

    server::serve(router, &cli.bind_address()).await?;

    Ok(())
}

/// Assembles the API router and its OpenAPI document.
fn create_router(state: ServiceState, cli: &Cli) -> Router {
    let mut api = OpenApi::default();

    handler::routes(&cli.service)
        .finish_api_with(&mut api, |api| {
            api.title("cascade")
                .summary("Workflow orchestration over containerised pipelines")
        })
        .layer(Extension(api))
        .with_state(state)
}

/// Initializes the tracing subscriber with env-filter support.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
