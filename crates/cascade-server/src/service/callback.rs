//! Outgoing state-change callbacks.

use cascade_postgres::types::RunState;
use serde::Serialize;
use uuid::Uuid;

const TRACING_TARGET: &str = "cascade_server::service::callback";

/// Payload POSTed to a run's `callback_url` on every state change.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCallback {
    /// Run whose state changed.
    pub pipeline_run_uuid: Uuid,
    /// New state name.
    pub state: RunState,
    /// Stable numeric code of the state.
    pub code: i32,
}

/// HTTP client for run callbacks.
///
/// Deliveries are best effort: failures are logged and never retried, and
/// nothing upstream waits on them.
#[derive(Debug, Clone)]
pub struct CallbackClient {
    http: reqwest::Client,
}

impl CallbackClient {
    /// Creates the client with the configured per-request timeout.
    pub fn new(timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { http }
    }

    /// Fires a callback without blocking the caller.
    pub fn notify_detached(&self, url: String, payload: StateCallback) {
        let http = self.http.clone();

        tokio::spawn(async move {
            let result = http.post(&url).json(&payload).send().await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        pipeline_run_id = %payload.pipeline_run_uuid,
                        state = %payload.state,
                        "Delivered state callback"
                    );
                }
                Ok(response) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        pipeline_run_id = %payload.pipeline_run_uuid,
                        status = %response.status(),
                        "State callback rejected"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        pipeline_run_id = %payload.pipeline_run_uuid,
                        error = %error,
                        "State callback failed"
                    );
                }
            }
        });
    }
}
