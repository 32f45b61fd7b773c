//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod pipeline_runs;
mod pipelines;
pub mod request;
pub mod response;
mod workflow_pipelines;
mod workflow_runs;
mod workflows;

use aide::axum::ApiRouter;
use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use tower_http::trace::TraceLayer;

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::{ServiceConfig, ServiceState};

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns the `/v1` API router with every resource mounted.
///
/// The body limit backs the artifact upload cap; JSON bodies are far below
/// it in practice.
pub fn routes(config: &ServiceConfig) -> ApiRouter<ServiceState> {
    let v1 = ApiRouter::new()
        .merge(pipelines::routes())
        .merge(pipeline_runs::routes())
        .merge(workflows::routes())
        .merge(workflow_pipelines::routes())
        .merge(workflow_runs::routes());

    ApiRouter::new()
        .nest("/v1", v1)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_content_length))
}
