//! Post-commit effects.
//!
//! Executor dispatch and state callbacks must never fire for a transaction
//! that later rolls back. Services record the intent here while the
//! transaction is open and run the buffer only after a successful commit;
//! dropping the buffer on rollback cancels everything.

use cascade_nats::ExecuteRequest;

use super::callback::StateCallback;
use super::state::ServiceState;

const TRACING_TARGET: &str = "cascade_server::service::dispatch";

/// Buffered effects to run after the surrounding transaction commits.
#[derive(Debug, Default)]
#[must_use = "buffered effects do nothing until run after commit"]
pub struct PostCommit {
    dispatches: Vec<ExecuteRequest>,
    callbacks: Vec<(String, StateCallback)>,
}

impl PostCommit {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an executor dispatch.
    pub fn dispatch(&mut self, request: ExecuteRequest) {
        self.dispatches.push(request);
    }

    /// Records an outgoing state callback.
    pub fn notify(&mut self, url: String, payload: StateCallback) {
        self.callbacks.push((url, payload));
    }

    /// Runs the buffered effects.
    ///
    /// Dispatch failures are logged, not surfaced: the run already sits in
    /// `NOT_STARTED` and an external watchdog may fail it, while surfacing
    /// the error here would wrongly fail a request whose state change has
    /// already committed.
    pub async fn run(self, state: &ServiceState) {
        for request in self.dispatches {
            let pipeline_run_id = request.pipeline_run_id;
            if let Err(error) = state.executor_queue().submit(&request).await {
                tracing::error!(
                    target: TRACING_TARGET,
                    pipeline_run_id = %pipeline_run_id,
                    error = %error,
                    "Executor dispatch failed after commit"
                );
            }
        }

        for (url, payload) in self.callbacks {
            state.callbacks().notify_detached(url, payload);
        }
    }
}
